use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    code::{self, CodeToken},
    document::{Document, newest_first},
    error::Result,
    index::CodeIndex,
};

/// Default cap on prefix suggestions.
pub const PREFIX_LIMIT: usize = 50;

/// How [`search_by_code`] compares the query against stored codes.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// A code equals the query.
    Exact,
    /// A code or the document name contains the query.
    #[default]
    #[value(alias = "like")]
    #[serde(alias = "like")]
    Contains,
}

/// A document from a union search together with the query codes it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeMatch {
    pub document: Document,
    pub matching: BTreeSet<CodeToken>,
}

fn query_text(text: &str) -> String {
    text.trim().to_uppercase()
}

/// Autocomplete: stored codes starting with `prefix_text`.
pub fn search_prefix(
    index: &impl CodeIndex,
    prefix_text: &str,
    limit: usize,
) -> Result<Vec<CodeToken>> {
    let prefix = query_text(prefix_text);
    if prefix.is_empty() || limit == 0 {
        return Ok(vec![]);
    }
    index.codes_with_prefix(&prefix, limit)
}

/// The one code in `text`, ignoring stray separators around it.
fn single_code(text: &str) -> Option<CodeToken> {
    let mut codes = code::normalize(text).into_iter();
    match (codes.next(), codes.next()) {
        (Some(code), None) => Some(code),
        _ => None,
    }
}

/// Documents matching a single code, newest first.
pub fn search_by_code(
    index: &impl CodeIndex,
    code_text: &str,
    mode: SearchMode,
) -> Result<Vec<Document>> {
    let needle = query_text(code_text);
    if needle.is_empty() {
        return Ok(vec![]);
    }

    let mut docs = match mode {
        SearchMode::Exact => match single_code(&needle) {
            Some(code) => index.documents_with_code(&code)?,
            // Text spanning several tokens can never equal one stored code.
            None => vec![],
        },
        SearchMode::Contains => index.documents_containing(&needle)?,
    };
    docs.sort_by(newest_first);
    Ok(docs)
}

/// Every document sharing at least one code with `codes_text`, newest
/// first, annotated with the codes it matched.
pub fn search_by_any_code(
    index: &impl CodeIndex,
    codes_text: &str,
) -> Result<Vec<CodeMatch>> {
    let wanted = code::normalize(codes_text);
    if wanted.is_empty() {
        return Ok(vec![]);
    }

    let mut docs = index.fetch_candidates(&wanted)?;
    docs.sort_by(newest_first);
    Ok(docs
        .into_iter()
        .map(|document| {
            let matching = document.shared_codes(&wanted);
            CodeMatch { document, matching }
        })
        .collect())
}
