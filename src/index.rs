//! The code → document lookup boundary.
//!
//! The resolver and the search modes only ever talk to a [`CodeIndex`]; where
//! the documents actually live (the on-disk catalog, a test fixture) is the
//! implementation's business. Every method reads one consistent snapshot and
//! returns owned documents with their full code sets.

use std::{
    collections::{BTreeMap, BTreeSet},
    ops::Bound,
};

use crate::{
    code::CodeToken,
    doc_id::DocumentId,
    document::Document,
    error::Result,
};

pub trait CodeIndex {
    /// Every document sharing at least one code with `codes`, in no
    /// particular order.
    fn fetch_candidates(
        &self,
        codes: &BTreeSet<CodeToken>,
    ) -> Result<Vec<Document>>;

    /// Distinct stored codes starting with `prefix`, in lexicographic
    /// order, at most `limit` of them.
    fn codes_with_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<CodeToken>>;

    /// Every document carrying `code`.
    fn documents_with_code(&self, code: &CodeToken) -> Result<Vec<Document>> {
        self.fetch_candidates(&BTreeSet::from([code.clone()]))
    }

    /// All documents.
    fn documents(&self) -> Result<Vec<Document>>;

    /// Documents whose name or any code contains `needle`, ignoring case.
    fn documents_containing(&self, needle: &str) -> Result<Vec<Document>> {
        let needle = needle.to_uppercase();
        Ok(self
            .documents()?
            .into_iter()
            .filter(|doc| {
                doc.name.to_uppercase().contains(&needle)
                    || doc.codes.iter().any(|c| c.as_str().contains(&needle))
            })
            .collect())
    }
}

/// A [`CodeIndex`] held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    documents: BTreeMap<DocumentId, Document>,
    postings: BTreeMap<CodeToken, BTreeSet<DocumentId>>,
}

impl MemoryIndex {
    pub fn new(documents: impl IntoIterator<Item = Document>) -> Self {
        let mut index = Self::default();
        for doc in documents {
            index.insert(doc);
        }
        index
    }

    /// Add or replace a document.
    pub fn insert(&mut self, doc: Document) {
        self.remove(doc.id);
        for code in &doc.codes {
            self.postings.entry(code.clone()).or_default().insert(doc.id);
        }
        self.documents.insert(doc.id, doc);
    }

    pub fn remove(&mut self, id: DocumentId) -> Option<Document> {
        let doc = self.documents.remove(&id)?;
        for code in &doc.codes {
            if let Some(ids) = self.postings.get_mut(code) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.postings.remove(code);
                }
            }
        }
        Some(doc)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl CodeIndex for MemoryIndex {
    fn fetch_candidates(
        &self,
        codes: &BTreeSet<CodeToken>,
    ) -> Result<Vec<Document>> {
        let ids: BTreeSet<DocumentId> = codes
            .iter()
            .filter_map(|code| self.postings.get(code))
            .flatten()
            .copied()
            .collect();
        Ok(ids
            .iter()
            .filter_map(|id| self.documents.get(id))
            .cloned()
            .collect())
    }

    fn codes_with_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<CodeToken>> {
        Ok(self
            .postings
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(code, _)| code)
            .take_while(|code| code.as_str().starts_with(prefix))
            .take(limit)
            .cloned()
            .collect())
    }

    fn documents(&self) -> Result<Vec<Document>> {
        Ok(self.documents.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::normalize;

    fn doc(id: u64, name: &str, codes: &str) -> Document {
        Document {
            id: DocumentId(id),
            name: name.to_string(),
            date: None,
            path: String::new(),
            codes: normalize(codes),
        }
    }

    fn sample() -> MemoryIndex {
        MemoryIndex::new([
            doc(1, "Pump manual", "AB100 AB200 CX1"),
            doc(2, "Valve sheet", "AB200 VL9"),
            doc(3, "Wiring", "WR-7"),
        ])
    }

    fn ids(docs: &[Document]) -> Vec<u64> {
        let mut ids: Vec<u64> = docs.iter().map(|d| d.id.get()).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn candidates_share_at_least_one_code() {
        let idx = sample();
        let found = idx.fetch_candidates(&normalize("ab200 zz")).unwrap();
        assert_eq!(ids(&found), [1, 2]);
        assert_eq!(found[0].codes.len(), 3, "full code set is attached");
    }

    #[test]
    fn candidates_for_unknown_codes_are_empty() {
        let idx = sample();
        assert!(idx.fetch_candidates(&normalize("nope")).unwrap().is_empty());
        assert!(idx.fetch_candidates(&BTreeSet::new()).unwrap().is_empty());
    }

    #[test]
    fn prefix_is_sorted_distinct_and_capped() {
        let idx = sample();
        let codes = idx.codes_with_prefix("AB", 50).unwrap();
        let texts: Vec<_> = codes.iter().map(CodeToken::as_str).collect();
        assert_eq!(texts, ["AB100", "AB200"]);

        assert_eq!(idx.codes_with_prefix("AB", 1).unwrap().len(), 1);
        assert!(idx.codes_with_prefix("Q", 50).unwrap().is_empty());
    }

    #[test]
    fn contains_matches_codes_and_names() {
        let idx = sample();
        assert_eq!(ids(&idx.documents_containing("vl").unwrap()), [2]);
        assert_eq!(ids(&idx.documents_containing("wir").unwrap()), [3]);
        assert_eq!(ids(&idx.documents_containing("200").unwrap()), [1, 2]);
    }

    #[test]
    fn insert_replaces_and_remove_cleans_postings() {
        let mut idx = sample();
        idx.insert(doc(2, "Valve sheet", "VL9"));
        let ab200 = CodeToken::parse("AB200").unwrap();
        assert_eq!(ids(&idx.documents_with_code(&ab200).unwrap()), [1]);

        idx.remove(DocumentId(2));
        assert!(idx.codes_with_prefix("VL", 10).unwrap().is_empty());
        assert_eq!(idx.len(), 2);
    }
}
