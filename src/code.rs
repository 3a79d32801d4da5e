//! Code token normalization.
//!
//! Every code that enters the catalog or a query passes through here, so two
//! codes compare equal exactly when their normalized text does. Fragments are
//! separated by any run of commas, semicolons or whitespace (newlines
//! included), trimmed and uppercased.

use std::{borrow::Borrow, collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

/// A normalized part code: trimmed, uppercased, non-empty and free of
/// separator characters.
///
/// # Examples
///
/// ```
/// use codecover::code::CodeToken;
///
/// let code = CodeToken::parse("  ab-12 ").unwrap();
/// assert_eq!(code.as_str(), "AB-12");
/// assert!(CodeToken::parse("a1 b2").is_none());
/// assert!(CodeToken::parse("   ").is_none());
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct CodeToken(String);

impl CodeToken {
    /// Normalize a single token. Returns `None` for empty input or input
    /// that would split into more than one token.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.chars().any(is_separator) {
            return None;
        }
        Some(Self(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CodeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CodeToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Ordering and hashing are those of the inner string, so lookups by `&str`
// in sorted maps stay consistent.
impl Borrow<str> for CodeToken {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CodeToken {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
            .ok_or_else(|| format!("invalid code token: {value:?}"))
    }
}

impl From<CodeToken> for String {
    fn from(value: CodeToken) -> Self {
        value.0
    }
}

fn is_separator(c: char) -> bool {
    c == ',' || c == ';' || c.is_whitespace()
}

fn fragments(raw: &str) -> impl Iterator<Item = CodeToken> + '_ {
    raw.split(is_separator)
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| CodeToken(fragment.to_uppercase()))
}

/// Split free-form text into a deduplicated set of code tokens.
///
/// # Examples
///
/// ```
/// use codecover::code::normalize;
///
/// let codes = normalize(" a1, a1 ;A1\n b2");
/// let texts: Vec<_> = codes.iter().map(|c| c.as_str()).collect();
/// assert_eq!(texts, ["A1", "B2"]);
/// ```
pub fn normalize(raw: &str) -> BTreeSet<CodeToken> {
    fragments(raw).collect()
}

/// Render codes back to text that [`normalize`] reads as the same set.
pub fn to_text<'a>(codes: impl IntoIterator<Item = &'a CodeToken>) -> String {
    codes
        .into_iter()
        .map(CodeToken::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
