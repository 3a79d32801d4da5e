//! Greedy code coverage.
//!
//! Given the codes a caller wants and the documents that carry any of them,
//! pick documents one at a time, each round taking the document that covers
//! the most still-uncovered codes, until everything is covered or no
//! document helps any more.
//!
//! Ties on gain go to the most recently dated document (undated counts as
//! oldest), then to the lowest document id, so the same request against the
//! same catalog always yields the same answer regardless of the order the
//! index returned candidates in.

use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashSet},
};

use serde::Serialize;
use tracing::debug;

use crate::{
    code::{self, CodeToken},
    document::Document,
    error::Result,
    index::CodeIndex,
};

/// One chosen document and the requested codes attributed to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub document: Document,
    /// Codes this document newly covered when it was chosen.
    #[serde(rename = "codesCovered")]
    pub covered: BTreeSet<CodeToken>,
}

/// Outcome of a coverage request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Chosen documents, in the order they were picked.
    pub selections: Vec<Selection>,
    /// Requested codes no candidate covers.
    pub uncovered: BTreeSet<CodeToken>,
}

impl Resolution {
    /// All codes attributed to some selection.
    pub fn covered(&self) -> BTreeSet<CodeToken> {
        self.selections
            .iter()
            .flat_map(|s| s.covered.iter().cloned())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.uncovered.is_empty()
    }
}

/// Which of two equal-gain candidates wins. `Greater` means `a` does.
fn tie_break(a: &Document, b: &Document) -> Ordering {
    a.date.cmp(&b.date).then_with(|| b.id.cmp(&a.id))
}

/// Run greedy set cover of `requested` over `pool`.
///
/// Never fails: an empty request gives an empty resolution, and an empty
/// pool leaves every requested code uncovered.
pub fn resolve(
    requested: &BTreeSet<CodeToken>,
    pool: Vec<Document>,
) -> Resolution {
    let mut remaining = requested.clone();

    let mut seen = HashSet::with_capacity(pool.len());
    let mut candidates: Vec<Document> =
        pool.into_iter().filter(|doc| seen.insert(doc.id)).collect();

    let mut selections = Vec::new();

    while !remaining.is_empty() && !candidates.is_empty() {
        let Some((best, gain)) = candidates
            .iter()
            .enumerate()
            .map(|(i, doc)| (i, doc.overlap(&remaining)))
            .max_by(|(i, gain_a), (j, gain_b)| {
                gain_a
                    .cmp(gain_b)
                    .then_with(|| tie_break(&candidates[*i], &candidates[*j]))
            })
        else {
            break;
        };

        if gain == 0 {
            debug!(
                remaining = remaining.len(),
                candidates = candidates.len(),
                "no candidate covers any remaining code"
            );
            break;
        }

        let document = candidates.swap_remove(best);
        let covered = document.shared_codes(&remaining);
        for code in &covered {
            remaining.remove(code);
        }

        debug!(
            round = selections.len() + 1,
            document = %document.id,
            gain,
            remaining = remaining.len(),
            "selected document"
        );
        selections.push(Selection { document, covered });
    }

    Resolution {
        selections,
        uncovered: remaining,
    }
}

/// Normalize `request_text`, fetch the candidate pool from `index` and
/// resolve coverage.
///
/// An empty request returns an empty resolution without consulting the
/// index. Index failures are returned as-is.
pub fn resolve_coverage(
    index: &impl CodeIndex,
    request_text: &str,
) -> Result<Resolution> {
    let requested = code::normalize(request_text);
    if requested.is_empty() {
        return Ok(Resolution::default());
    }

    let pool = index.fetch_candidates(&requested)?;
    debug!(
        requested = requested.len(),
        pool = pool.len(),
        "fetched candidate pool"
    );

    Ok(resolve(&requested, pool))
}
