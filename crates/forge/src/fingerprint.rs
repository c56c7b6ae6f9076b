//! Clone fingerprints over the masked syntax-mining form.

use std::collections::HashMap;

/// Hashes an already canonicalized text (normally the masked syntmine form).
///
/// Truncates the 256-bit BLAKE3 digest to a `u64` (first 8 bytes, LE).
pub fn fingerprint(canonical: &str) -> u64 {
    let digest = blake3::hash(canonical.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(head)
}

/// Inputs sharing one fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneGroup {
    /// The shared fingerprint.
    pub fingerprint: u64,
    /// Caller-supplied labels (typically file paths), in input order.
    pub members: Vec<String>,
}

impl CloneGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Groups `(label, fingerprint)` pairs, keeping only groups with two or more
/// members. Groups are ordered by the position of their first member.
pub fn group_clones<I>(entries: I) -> Vec<CloneGroup>
where
    I: IntoIterator<Item = (String, u64)>,
{
    let mut groups: Vec<CloneGroup> = Vec::new();
    let mut index_of: HashMap<u64, usize> = HashMap::new();

    for (label, hash) in entries {
        match index_of.get(&hash) {
            Some(&i) => groups[i].members.push(label),
            None => {
                index_of.insert(hash, groups.len());
                groups.push(CloneGroup {
                    fingerprint: hash,
                    members: vec![label],
                });
            }
        }
    }

    groups.retain(|g| g.len() >= 2);
    groups
}
