use std::{collections::BTreeSet, path::Path};

use redb::{
    Database,
    MultimapTableDefinition,
    ReadableDatabase,
    ReadableMultimapTable,
    ReadableTable,
    ReadableTableMetadata,
    TableDefinition,
    WriteTransaction,
};
use tracing::info;

use crate::{
    code::{self, CodeToken},
    doc_id::DocumentId,
    document::{Document, DocumentPatch, NewDocument},
    error::{Error, Result},
    index::CodeIndex,
    search::PREFIX_LIMIT,
};

/// Document records, JSON-encoded, keyed by document id.
const DOCUMENTS: TableDefinition<u64, &[u8]> =
    TableDefinition::new("documents");
/// Inverted index: code → ids of the documents carrying it.
const CODE_INDEX: MultimapTableDefinition<&str, u64> =
    MultimapTableDefinition::new("code_index");
const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");
const SETTINGS: TableDefinition<&str, &str> = TableDefinition::new("settings");

const LAST_DOCUMENT_ID: &str = "last_document_id";

pub const PREFIX_LIMIT_KEY: &str = "prefix_limit";

/// The on-disk document catalog.
///
/// Holds every document with its code set and keeps the code index in step
/// with it inside the same write transaction, so readers never observe a
/// document whose codes are only half indexed.
pub struct CatalogDb {
    db: Database,
}

impl CatalogDb {
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)?;

        // Ensure all tables exist by opening them in a write transaction.
        let txn = db.begin_write()?;
        txn.open_table(DOCUMENTS)?;
        txn.open_multimap_table(CODE_INDEX)?;
        txn.open_table(COUNTERS)?;
        txn.open_table(SETTINGS)?;
        txn.commit()?;

        Ok(Self { db })
    }

    // -- Documents --

    /// Catalog a new document, assigning it the next id.
    pub fn insert_document(&self, new: &NewDocument) -> Result<Document> {
        let txn = self.db.begin_write()?;
        let doc = insert_in(&txn, new)?;
        txn.commit()?;

        info!(id = %doc.id, codes = doc.codes.len(), "cataloged document");
        Ok(doc)
    }

    /// Catalog several documents in a single transaction. Nothing is stored
    /// if any entry is invalid.
    pub fn insert_documents(
        &self,
        entries: &[NewDocument],
    ) -> Result<Vec<Document>> {
        if entries.is_empty() {
            return Ok(vec![]);
        }
        let txn = self.db.begin_write()?;
        let docs = entries
            .iter()
            .map(|new| insert_in(&txn, new))
            .collect::<Result<Vec<_>>>()?;
        txn.commit()?;

        info!(count = docs.len(), "cataloged documents");
        Ok(docs)
    }

    /// Apply `patch` to a stored document and return the updated record.
    pub fn update_document(
        &self,
        id: DocumentId,
        patch: &DocumentPatch,
    ) -> Result<Document> {
        let txn = self.db.begin_write()?;
        let mut doc = read_in(&txn, id)?.ok_or_else(|| Error::NotFound {
            kind: "document",
            name: id.to_string(),
        })?;

        if let Some(ref name) = patch.name {
            doc.name = validated_name(name)?;
        }
        if let Some(date) = patch.date {
            doc.date = date;
        }
        if let Some(ref path) = patch.path {
            doc.path = path.trim().to_string();
        }
        if let Some(ref codes) = patch.codes {
            unindex_in(&txn, &doc)?;
            doc.codes = code::normalize(codes);
        }
        write_in(&txn, &doc)?;
        txn.commit()?;

        info!(id = %doc.id, "updated document");
        Ok(doc)
    }

    /// Remove a document and its index entries. Returns whether it existed.
    pub fn remove_document(&self, id: DocumentId) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let Some(doc) = read_in(&txn, id)? else {
            return Ok(false);
        };
        unindex_in(&txn, &doc)?;
        {
            let mut table = txn.open_table(DOCUMENTS)?;
            table.remove(id.get())?;
        }
        txn.commit()?;

        info!(id = %id, "removed document");
        Ok(true)
    }

    pub fn get_document(&self, id: DocumentId) -> Result<Option<Document>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(DOCUMENTS)?;
        let Some(guard) = table.get(id.get())? else {
            return Ok(None);
        };
        let doc = serde_json::from_slice(guard.value())?;
        Ok(Some(doc))
    }

    /// All documents, most recently cataloged first.
    pub fn list_documents(&self) -> Result<Vec<Document>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(DOCUMENTS)?;
        let mut result = Vec::new();
        for entry in table.iter()?.rev() {
            let (_k, v) = entry?;
            result.push(serde_json::from_slice(v.value())?);
        }
        Ok(result)
    }

    pub fn document_count(&self) -> Result<u64> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(DOCUMENTS)?;
        Ok(table.len()?)
    }

    /// Number of distinct codes in the index.
    pub fn code_count(&self) -> Result<usize> {
        let txn = self.db.begin_read()?;
        let table = txn.open_multimap_table(CODE_INDEX)?;
        let mut count = 0;
        for entry in table.iter()? {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    // -- Settings --

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SETTINGS)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SETTINGS)?;
        Ok(table.get(key)?.map(|v| v.value().to_string()))
    }

    /// Get a setting, returning the default if not set.
    pub fn get_setting_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self
            .get_setting(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Cap on prefix suggestions, from the `prefix_limit` setting.
    pub fn prefix_limit(&self) -> Result<usize> {
        let raw =
            self.get_setting_or(PREFIX_LIMIT_KEY, &PREFIX_LIMIT.to_string())?;
        parse_prefix_limit(&raw)
    }

    pub fn remove_setting(&self, key: &str) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(SETTINGS)?;
            table.remove(key)?.is_some()
        };
        txn.commit()?;
        Ok(removed)
    }
}

impl CodeIndex for CatalogDb {
    fn fetch_candidates(
        &self,
        codes: &BTreeSet<CodeToken>,
    ) -> Result<Vec<Document>> {
        let txn = self.db.begin_read()?;
        let index = txn.open_multimap_table(CODE_INDEX)?;
        let documents = txn.open_table(DOCUMENTS)?;

        let mut ids = BTreeSet::new();
        for code in codes {
            for id in index.get(code.as_str())? {
                ids.insert(id?.value());
            }
        }

        let mut result = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(guard) = documents.get(id)? {
                result.push(serde_json::from_slice(guard.value())?);
            }
        }
        Ok(result)
    }

    fn codes_with_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<CodeToken>> {
        let mut result = Vec::new();
        if limit == 0 {
            return Ok(result);
        }

        let txn = self.db.begin_read()?;
        let index = txn.open_multimap_table(CODE_INDEX)?;
        for entry in index.range(prefix..)? {
            let (key, _ids) = entry?;
            let code = key.value();
            if !code.starts_with(prefix) {
                break;
            }
            if let Some(token) = CodeToken::parse(code) {
                result.push(token);
            }
            if result.len() >= limit {
                break;
            }
        }
        Ok(result)
    }

    fn documents(&self) -> Result<Vec<Document>> {
        self.list_documents()
    }
}

impl std::fmt::Debug for CatalogDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogDb").finish_non_exhaustive()
    }
}

/// Parse a stored or user-supplied `prefix_limit` value.
pub fn parse_prefix_limit(raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(Error::Config(format!(
            "{PREFIX_LIMIT_KEY} must be a positive integer, got '{raw}'"
        ))),
    }
}

fn validated_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("document name is empty".into()));
    }
    Ok(name.to_string())
}

fn next_id(txn: &WriteTransaction) -> Result<DocumentId> {
    let mut table = txn.open_table(COUNTERS)?;
    let last = table.get(LAST_DOCUMENT_ID)?.map(|v| v.value()).unwrap_or(0);
    let next = last + 1;
    table.insert(LAST_DOCUMENT_ID, next)?;
    Ok(DocumentId(next))
}

fn insert_in(txn: &WriteTransaction, new: &NewDocument) -> Result<Document> {
    let name = validated_name(&new.name)?;
    let doc = Document {
        id: next_id(txn)?,
        name,
        date: new.date,
        path: new.path.trim().to_string(),
        codes: code::normalize(&new.codes.join(",")),
    };
    write_in(txn, &doc)?;
    Ok(doc)
}

fn read_in(txn: &WriteTransaction, id: DocumentId) -> Result<Option<Document>> {
    let table = txn.open_table(DOCUMENTS)?;
    let Some(guard) = table.get(id.get())? else {
        return Ok(None);
    };
    let doc = serde_json::from_slice(guard.value())?;
    Ok(Some(doc))
}

fn write_in(txn: &WriteTransaction, doc: &Document) -> Result<()> {
    let bytes = serde_json::to_vec(doc)?;
    {
        let mut table = txn.open_table(DOCUMENTS)?;
        table.insert(doc.id.get(), bytes.as_slice())?;
    }
    let mut index = txn.open_multimap_table(CODE_INDEX)?;
    for code in &doc.codes {
        index.insert(code.as_str(), doc.id.get())?;
    }
    Ok(())
}

fn unindex_in(txn: &WriteTransaction, doc: &Document) -> Result<()> {
    let mut index = txn.open_multimap_table(CODE_INDEX)?;
    for code in &doc.codes {
        index.remove(code.as_str(), doc.id.get())?;
    }
    Ok(())
}
