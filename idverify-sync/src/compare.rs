//! Prefix comparison of a baseline against a live listing.
//!
//! The baseline must be an unbroken prefix of the live listing. Every index
//! below `baseline.len()` is checked; a live listing that ends early stops the
//! scan at the first missing index.

use serde::Serialize;

use idverify_core::IdentifierSequence;

/// One index where the live listing disagrees with the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    /// 0-based line index.
    pub index: usize,
    /// Baseline line at `index`.
    pub expected: String,
    /// Live line at `index`; `None` when the live listing ended before it.
    pub observed: Option<String>,
}

impl Mismatch {
    /// The live listing is shorter than the baseline at this index.
    pub fn is_truncation(&self) -> bool {
        self.observed.is_none()
    }
}

/// Result of [`compare`]. Empty `mismatches` means the baseline is a prefix of
/// (or equal to) the live listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub mismatches: Vec<Mismatch>,
}

impl Comparison {
    /// First divergent index. This alone decides the outcome; later
    /// mismatches are diagnostics.
    pub fn diverged_at(&self) -> Option<usize> {
        self.mismatches.first().map(|m| m.index)
    }

    pub fn is_prefix(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Compare `baseline` against `live`, collecting every mismatching index up to
/// `baseline.len()`, or up to the first index past the end of `live`.
pub fn compare(baseline: &IdentifierSequence, live: &IdentifierSequence) -> Comparison {
    let mut mismatches = Vec::new();
    for (index, expected) in baseline.lines().iter().enumerate() {
        match live.get(index) {
            None => {
                mismatches.push(Mismatch {
                    index,
                    expected: expected.clone(),
                    observed: None,
                });
                break;
            }
            Some(observed) if observed != expected.as_str() => mismatches.push(Mismatch {
                index,
                expected: expected.clone(),
                observed: Some(observed.to_string()),
            }),
            Some(_) => {}
        }
    }
    Comparison { mismatches }
}
