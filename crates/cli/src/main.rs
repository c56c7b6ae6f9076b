use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anatomist::{AnatomistError, Artifact, Processor, ProcessorConfig, ProgramRecord};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use forge::CloneGroup;
use memmap2::Mmap;

#[derive(Parser)]
#[command(name = "pyscrub")]
#[command(about = "Anonymize and normalize Python source for clone mining", long_about = None)]
struct Cli {
    /// Log level for tracing output (overridden by `RUST_LOG`).
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the identifier inventory and comment corpus as JSON lines.
    Inventory {
        /// Python file or directory to process.
        path: PathBuf,
    },
    /// Rename variables and parameters to `variable_<i>`, keeping layout.
    Standardize {
        /// Python file or directory to process.
        path: PathBuf,
    },
    /// Strip comments and literals, drop identifiers, compact whitespace.
    Anonymize {
        /// Python file or directory to process.
        path: PathBuf,
        /// Delete identifiers instead of replacing them with `v_<i>`.
        #[arg(long)]
        no_mask: bool,
    },
    /// Run a processing mode selected by name.
    Process {
        /// Python file or directory to process.
        path: PathBuf,
        /// One of: inventory, standardize, syntmine, fingerprint.
        #[arg(long)]
        mode: String,
        /// Delete identifiers in syntmine mode instead of masking them.
        #[arg(long)]
        no_mask: bool,
    },
    /// Group files whose anonymized form fingerprints identically.
    Clones {
        /// Directory (or single file) to scan.
        path: PathBuf,
    },
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_level);
    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!("could not load .env: {e}");
        }
    }

    match &cli.command {
        Commands::Inventory { path } => cmd_inventory(path)?,
        Commands::Standardize { path } => {
            let processor = Processor::new();
            run_text(path, |text| processor.standardize(text))?
        }
        Commands::Anonymize { path, no_mask } => {
            let processor = Processor::new();
            run_text(path, |text| processor.anonymize(text, !*no_mask))?
        }
        Commands::Process {
            path,
            mode,
            no_mask,
        } => cmd_process(path, mode, !*no_mask)?,
        Commands::Clones { path } => cmd_clones(path)?,
    }

    Ok(())
}

fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// subcommands
// ---------------------------------------------------------------------------

fn cmd_inventory(path: &Path) -> anyhow::Result<()> {
    let processor = Processor::new();
    let py_files = collect_py_files(path)?;
    for_each_source(path, &py_files, |file, text| {
        let record = processor.record(text)?;
        println!("{}", record_json(file, &record));
        Ok(())
    })?;
    Ok(())
}

fn cmd_process(path: &Path, mode: &str, mask: bool) -> anyhow::Result<()> {
    // Reject an unknown mode once, up front, instead of once per file.
    let mode: common::Mode = mode.parse()?;
    let processor = Processor::with_config(ProcessorConfig {
        mask_identifiers: mask,
    });
    let py_files = collect_py_files(path)?;
    let multi = py_files.len() > 1;
    for_each_source(path, &py_files, |file, text| {
        let artifact = processor.process(text, mode)?;
        print_output(file, multi, &render_artifact(file, &artifact));
        Ok(())
    })?;
    Ok(())
}

fn cmd_clones(path: &Path) -> anyhow::Result<()> {
    let groups = clone_groups(path, &Processor::new())?;
    if groups.is_empty() {
        println!("No clones detected.");
        return Ok(());
    }
    for group in &groups {
        println!(
            "Clone group {:016x} ({} files):",
            group.fingerprint,
            group.len()
        );
        for member in &group.members {
            println!("  {member}");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

/// Runs a text-producing rewrite over every file, printing a `==> path <==`
/// header when more than one file is involved.
fn run_text<F>(path: &Path, rewrite: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Result<String, AnatomistError>,
{
    let py_files = collect_py_files(path)?;
    let multi = py_files.len() > 1;
    for_each_source(path, &py_files, |file, text| {
        let output = rewrite(text)?;
        print_output(file, multi, &output);
        Ok(())
    })?;
    Ok(())
}

fn print_output(file: &Path, multi: bool, output: &str) {
    if multi {
        println!("==> {} <==", display_path(file));
    }
    println!("{output}");
}

fn render_artifact(file: &Path, artifact: &Artifact) -> String {
    match artifact {
        Artifact::Record(record) => record_json(file, record).to_string(),
        Artifact::Text(text) => text.clone(),
        Artifact::Fingerprint(hash) => format!("{hash:016x}"),
    }
}

/// One JSON line per file: the record plus its comment bodies without `#`.
fn record_json(file: &Path, record: &ProgramRecord) -> serde_json::Value {
    serde_json::json!({
        "path": display_path(file),
        "record": record,
        "comment_bodies": record.comment.bodies(),
    })
}

/// Fingerprints every file under `path` and keeps groups of two or more.
fn clone_groups(path: &Path, processor: &Processor) -> anyhow::Result<Vec<CloneGroup>> {
    let py_files = collect_py_files(path)?;
    let mut entries: Vec<(String, u64)> = Vec::new();
    for_each_source(path, &py_files, |file, text| {
        entries.push((display_path(file), processor.fingerprint(text)?));
        Ok(())
    })?;
    Ok(forge::group_clones(entries))
}

/// Calls `f` with the contents of each of `py_files`, as collected from `path`.
///
/// A failing file (unreadable, not UTF-8, or rejected by `f`) is reported as
/// a warning and skipped. Returns the number of files that succeeded.
fn for_each_source<F>(path: &Path, py_files: &[PathBuf], mut f: F) -> anyhow::Result<usize>
where
    F: FnMut(&Path, &str) -> anyhow::Result<()>,
{
    if py_files.is_empty() {
        println!("No Python files found at: {}", path.display());
        return Ok(0);
    }

    let mut succeeded = 0;
    for file_path in py_files {
        match read_source(file_path).and_then(|text| f(file_path, &text)) {
            Ok(()) => succeeded += 1,
            Err(e) => tracing::warn!("skipping {}: {:#}", file_path.display(), e),
        }
    }
    tracing::info!(total = py_files.len(), succeeded, "files processed");
    Ok(succeeded)
}

fn collect_py_files(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    use walkdir::WalkDir;
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.exists() {
        anyhow::bail!("path does not exist: {}", path.display());
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file() && e.path().extension().and_then(|x| x.to_str()) == Some("py")
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    Ok(files)
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    if file.metadata()?.len() == 0 {
        return Ok(String::new());
    }
    // SAFETY: mmap is read-only; the file handle outlives the mmap.
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("cannot map {}", path.display()))?;
    let text = std::str::from_utf8(&mmap)
        .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
    Ok(text.to_owned())
}

fn display_path(path: &Path) -> String {
    dunce::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
