//! Mode dispatch: source text in, one artifact out.
//!
//! Every mode runs the same front half:
//! 1. **Parse** with tree-sitter and walk the tree into an [`Inventory`].
//! 2. **Tokenize** and collect the [`CommentCorpus`].
//!
//! A parse failure is reported before a tokenize failure. Only then does the
//! mode-specific Forge rewrite run, so no mode ever yields a partial artifact.

use common::{CommentCorpus, Inventory, Mode};
use serde::{Deserialize, Serialize};

use crate::comments;
use crate::parser::parse;
use crate::walker::{IdentifierVisitor, TreeVisitor};
use crate::AnatomistError;

/// Settings fixed for the lifetime of a [`Processor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// In syntmine mode, replace identifiers with `v_<i>` (`true`) or delete
    /// them outright (`false`).
    pub mask_identifiers: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            mask_identifiers: true,
        }
    }
}

/// Inventory-mode artifact: the raw facts, nothing rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramRecord {
    pub code: Inventory,
    pub comment: CommentCorpus,
}

/// Output of [`Processor::process`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Artifact {
    Record(ProgramRecord),
    Text(String),
    Fingerprint(u64),
}

/// Orchestrates extraction and rewriting for one source text per call.
///
/// Holds no per-input state; a single instance can serve many threads.
pub struct Processor {
    visitor: Box<dyn TreeVisitor>,
    config: ProcessorConfig,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Processor {
    /// Default visitor, identifiers masked.
    pub fn new() -> Self {
        Self::with_config(ProcessorConfig::default())
    }

    pub fn with_config(config: ProcessorConfig) -> Self {
        Self {
            visitor: Box::new(IdentifierVisitor),
            config,
        }
    }

    /// Swaps in a custom tree visitor strategy.
    pub fn with_visitor(visitor: Box<dyn TreeVisitor>, config: ProcessorConfig) -> Self {
        Self { visitor, config }
    }

    pub fn config(&self) -> ProcessorConfig {
        self.config
    }

    /// Parses `text` and walks the tree.
    ///
    /// # Errors
    /// `Parse` when the text is not valid Python.
    pub fn extract_inventory(&self, text: &str) -> Result<Inventory, AnatomistError> {
        let tree = parse(text)?;
        Ok(self.visitor.visit(&tree, text.as_bytes()))
    }

    /// Lexes `text` and collects its comments. Does not parse.
    ///
    /// # Errors
    /// `Tokenize` when the text is not lexically valid Python.
    pub fn extract_comments(&self, text: &str) -> Result<CommentCorpus, AnatomistError> {
        Ok(comments::extract_comments(text)?)
    }

    /// Inventory mode.
    pub fn record(&self, text: &str) -> Result<ProgramRecord, AnatomistError> {
        let (code, comment) = self.dissect(text)?;
        Ok(ProgramRecord { code, comment })
    }

    /// Standardize mode: variables and parameters become `variable_<i>`.
    pub fn standardize(&self, text: &str) -> Result<String, AnatomistError> {
        let (inventory, _) = self.dissect(text)?;
        Ok(forge::standardize(&inventory, text))
    }

    /// Syntmine mode with an explicit masking choice, overriding the config.
    pub fn anonymize(&self, text: &str, mask_identifiers: bool) -> Result<String, AnatomistError> {
        let (inventory, corpus) = self.dissect(text)?;
        Ok(forge::syntmine(&inventory, &corpus, text, mask_identifiers))
    }

    /// Fingerprint mode: digest of the masked syntmine form, whatever the
    /// configured masking.
    pub fn fingerprint(&self, text: &str) -> Result<u64, AnatomistError> {
        let dense = self.anonymize(text, true)?;
        Ok(forge::fingerprint(&dense))
    }

    /// Runs one mode and wraps its output.
    pub fn process(&self, text: &str, mode: Mode) -> Result<Artifact, AnatomistError> {
        tracing::debug!(%mode, bytes = text.len(), "processing");
        match mode {
            Mode::Inventory => self.record(text).map(Artifact::Record),
            Mode::Standardize => self.standardize(text).map(Artifact::Text),
            Mode::Syntmine => self
                .anonymize(text, self.config.mask_identifiers)
                .map(Artifact::Text),
            Mode::Fingerprint => self.fingerprint(text).map(Artifact::Fingerprint),
        }
    }

    /// [`process`](Self::process) with the mode given by name.
    ///
    /// # Errors
    /// `UnsupportedMode` for an unknown name, before the text is looked at.
    pub fn process_named(&self, text: &str, mode: &str) -> Result<Artifact, AnatomistError> {
        let mode: Mode = mode.parse()?;
        self.process(text, mode)
    }

    fn dissect(&self, text: &str) -> Result<(Inventory, CommentCorpus), AnatomistError> {
        let inventory = self.extract_inventory(text)?;
        let corpus = self.extract_comments(text)?;
        Ok((inventory, corpus))
    }
}

/// [`Processor::extract_inventory`] with the default processor.
pub fn extract_inventory(text: &str) -> Result<Inventory, AnatomistError> {
    Processor::new().extract_inventory(text)
}

/// [`Processor::record`] with the default processor.
pub fn record(text: &str) -> Result<ProgramRecord, AnatomistError> {
    Processor::new().record(text)
}

/// [`Processor::standardize`] with the default processor.
pub fn standardize(text: &str) -> Result<String, AnatomistError> {
    Processor::new().standardize(text)
}

/// [`Processor::anonymize`] with the default processor.
///
/// ```
/// let dense = anatomist::anonymize("def f(x): return x", false).unwrap();
/// assert_eq!(dense, "deff():return");
/// ```
pub fn anonymize(text: &str, mask_identifiers: bool) -> Result<String, AnatomistError> {
    Processor::new().anonymize(text, mask_identifiers)
}

/// [`Processor::fingerprint`] with the default processor.
pub fn fingerprint(text: &str) -> Result<u64, AnatomistError> {
    Processor::new().fingerprint(text)
}

/// [`Processor::process`] with the default processor.
pub fn process(text: &str, mode: Mode) -> Result<Artifact, AnatomistError> {
    Processor::new().process(text, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenizeError;
    use common::Position;

    const REVERSE: &str = "text = \"trial\"
num_var = 57
def reverse_string(string):
        # Reverse the given hardcoded_value \"string\"
        return string[::-1]
reversed = reverse_string(text)
print(reversed)";

    #[test]
    fn test_record_collects_inventory_and_comments() {
        let record = record(REVERSE).unwrap();
        assert_eq!(record.code.variables, ["text", "num_var", "reversed"]);
        assert_eq!(record.code.arg_variables, ["string"]);
        assert_eq!(record.code.function_names, ["reverse_string"]);
        assert_eq!(
            record.code.terminals,
            ["text", "num_var", "string", "reversed", "reverse_string", "text", "print", "reversed"]
        );
        assert_eq!(record.comment.len(), 1);
        assert_eq!(record.comment.comments[0].start, Position::new(4, 8));
    }

    #[test]
    fn test_standardize_renames_with_naive_substrings() {
        // `string` is also a substring of `reverse_string` and of the comment.
        let out = standardize(REVERSE).unwrap();
        assert_eq!(
            out,
            "variable_3 = \"trial\"
variable_1 = 57
def reverse_variable_2(variable_2):
        # Reverse the given hardcoded_value \"variable_2\"
        return variable_2[::-1]
variable_0 = reverse_variable_2(variable_3)
print(variable_0)"
        );
    }

    #[test]
    fn test_anonymize_masked() {
        let out = anonymize(REVERSE, true).unwrap();
        assert_eq!(
            out,
            "v_3=LITv_1=NUMdefreverse_v_2(v_2):returnv_2[::-NUM]v_0=reverse_v_2(v_3)print(v_0)"
        );
    }

    #[test]
    fn test_mode_flag() {
        let src = "def f(x): return x";
        assert_eq!(anonymize(src, true).unwrap(), "deff(v_0):returnv_0");
        assert_eq!(anonymize(src, false).unwrap(), "deff():return");
    }

    #[test]
    fn test_syntmine_mode_follows_config() {
        let src = "def f(x): return x";
        let unmasked = Processor::with_config(ProcessorConfig {
            mask_identifiers: false,
        });
        assert_eq!(
            unmasked.process(src, Mode::Syntmine).unwrap(),
            Artifact::Text("deff():return".into())
        );
        assert_eq!(
            Processor::new().process(src, Mode::Syntmine).unwrap(),
            Artifact::Text("deff(v_0):returnv_0".into())
        );
    }

    #[test]
    fn test_tuple_assignment_standardized() {
        assert_eq!(
            standardize("x, y = 1, 2\n").unwrap(),
            "variable_0, variable_1 = 1, 2\n"
        );
    }

    #[test]
    fn test_literal_sentinels() {
        assert_eq!(anonymize("n = 42\n", false).unwrap(), "=NUM");
        assert_eq!(anonymize("s = \"hi\"\n", true).unwrap(), "v_0=LIT");
    }

    #[test]
    fn test_collision_safe_ordering() {
        let out = standardize("text = 1\ntext_t = text\n").unwrap();
        assert_eq!(out, "variable_1 = 1\nvariable_0 = variable_1\n");
        assert!(!out.contains("_t"), "partial rewrite left behind: {out}");
    }

    #[test]
    fn test_empty_candidates_identity() {
        let src = "print('hello')  # hi\n";
        assert_eq!(standardize(src).unwrap(), src);
    }

    #[test]
    fn test_anonymize_idempotent_on_candidate_free_output() {
        let once = anonymize("print(\"hi\")  # greet\n", true).unwrap();
        assert_eq!(once, "print(LIT)");
        assert_eq!(anonymize(&once, true).unwrap(), once);
    }

    #[test]
    fn test_deterministic() {
        let p = Processor::new();
        assert_eq!(p.standardize(REVERSE).unwrap(), p.standardize(REVERSE).unwrap());
        assert_eq!(p.anonymize(REVERSE, true).unwrap(), p.anonymize(REVERSE, true).unwrap());
        assert_eq!(record(REVERSE).unwrap(), record(REVERSE).unwrap());
    }

    #[test]
    fn test_process_dispatches_every_mode() {
        let p = Processor::new();
        let src = "a = 1\n";
        assert!(matches!(p.process(src, Mode::Inventory).unwrap(), Artifact::Record(_)));
        assert_eq!(
            p.process(src, Mode::Standardize).unwrap(),
            Artifact::Text("variable_0 = 1\n".into())
        );
        assert_eq!(
            p.process(src, Mode::Syntmine).unwrap(),
            Artifact::Text("v_0=NUM".into())
        );
        assert_eq!(
            p.process(src, Mode::Fingerprint).unwrap(),
            Artifact::Fingerprint(forge::fingerprint("v_0=NUM"))
        );
    }

    #[test]
    fn test_unsupported_mode() {
        let err = Processor::new().process_named("x = 1\n", "Syntmine").unwrap_err();
        assert!(matches!(err, AnatomistError::UnsupportedMode(_)), "got {err:?}");
    }

    #[test]
    fn test_process_named_known_mode() {
        let artifact = Processor::new().process_named("x = 1\n", "standardize").unwrap();
        assert_eq!(artifact, Artifact::Text("variable_0 = 1\n".into()));
    }

    #[test]
    fn test_parse_error_in_every_mode() {
        let p = Processor::new();
        for mode in Mode::ALL {
            let err = p.process("def f(:\n    pass\n", mode).unwrap_err();
            assert!(matches!(err, AnatomistError::Parse { .. }), "{mode}: got {err:?}");
        }
    }

    #[test]
    fn test_parse_error_reported_before_tokenize_error() {
        let err = anonymize("s = 'open\n", true).unwrap_err();
        assert!(matches!(err, AnatomistError::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn test_extract_comments_tokenize_error() {
        let err = Processor::new().extract_comments("s = 'open\n").unwrap_err();
        match err {
            AnatomistError::Tokenize(e) => {
                assert_eq!(e, TokenizeError::UnterminatedString(Position::new(1, 4)));
            }
            other => panic!("expected Tokenize error, got {other:?}"),
        }
    }

    #[test]
    fn test_fingerprint_equal_under_renaming() {
        let a = fingerprint("def f(p, q):\n    k = p + q\n    return k\n").unwrap();
        let b = fingerprint("def f(m, w):\n    z = m + w\n    return z\n").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_ignores_comments_and_literal_values() {
        let a = fingerprint("limit = 10  # cap\nname = 'x'\n").unwrap();
        let b = fingerprint("limit = 99\nname = 'yy'\n").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_differs_on_structure() {
        let a = fingerprint("def f(p, q):\n    k = p + q\n    return k\n").unwrap();
        let b = fingerprint("def f(p, q):\n    k = p - q\n    return k\n").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_custom_visitor() {
        struct Silent;
        impl TreeVisitor for Silent {
            fn visit(&self, _tree: &tree_sitter::Tree, _source: &[u8]) -> Inventory {
                Inventory::default()
            }
        }

        let p = Processor::with_visitor(Box::new(Silent), ProcessorConfig::default());
        assert_eq!(p.standardize("x = 1\n").unwrap(), "x = 1\n");
    }

    #[test]
    fn test_processor_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Processor>();
    }

    #[test]
    fn test_shared_across_threads() {
        let p = &Processor::new();
        let inputs = ["a = 1\n", "b, c = 2, 3\n", "def g(z): return z\n"];
        let outputs: Vec<String> = std::thread::scope(|s| {
            let handles: Vec<_> = inputs
                .iter()
                .map(|src| s.spawn(move || p.standardize(src).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(
            outputs,
            [
                "variable_0 = 1\n",
                "variable_0, variable_1 = 2, 3\n",
                "def g(variable_0): return variable_0\n"
            ]
        );
    }

    #[test]
    fn test_record_serializes() {
        let json = serde_json::to_value(record("x = 1  # one\n").unwrap()).unwrap();
        assert_eq!(json["code"]["variables"][0], "x");
        assert_eq!(json["comment"]["comments"][0]["text"], "# one");
    }
}
