use std::{cmp::Ordering, collections::BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{code::CodeToken, doc_id::DocumentId};

/// A cataloged document and the codes it is tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    /// Document date; `None` sorts as older than any dated document.
    pub date: Option<NaiveDate>,
    /// Opaque storage location, never dereferenced here.
    pub path: String,
    pub codes: BTreeSet<CodeToken>,
}

impl Document {
    /// Number of `wanted` codes this document carries.
    pub fn overlap(&self, wanted: &BTreeSet<CodeToken>) -> usize {
        // Walk the smaller set.
        if self.codes.len() <= wanted.len() {
            self.codes.iter().filter(|c| wanted.contains(*c)).count()
        } else {
            wanted.iter().filter(|c| self.codes.contains(*c)).count()
        }
    }

    /// The `wanted` codes this document carries.
    pub fn shared_codes(
        &self,
        wanted: &BTreeSet<CodeToken>,
    ) -> BTreeSet<CodeToken> {
        self.codes.intersection(wanted).cloned().collect()
    }
}

/// Listing order: latest date first (undated last), then latest id first.
pub fn newest_first(a: &Document, b: &Document) -> Ordering {
    b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id))
}

/// Metadata for a document that has not been cataloged yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub name: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub path: String,
    /// Raw code entries; each entry may itself hold several delimited codes.
    #[serde(default)]
    pub codes: Vec<String>,
}

/// A partial update. `None` fields keep their stored value; `codes`
/// replaces the whole code set when present and `date: Some(None)` clears
/// the stored date.
#[derive(Debug, Clone, Default)]
pub struct DocumentPatch {
    pub name: Option<String>,
    pub date: Option<Option<NaiveDate>>,
    pub path: Option<String>,
    pub codes: Option<String>,
}

impl DocumentPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.date.is_none()
            && self.path.is_none()
            && self.codes.is_none()
    }
}
