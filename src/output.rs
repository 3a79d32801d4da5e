//! Terminal rendering for query and catalog results.

use serde::Serialize;

use crate::{
    code::{self, CodeToken},
    document::Document,
    error::Result,
    resolver::Resolution,
    search::CodeMatch,
};

/// Print any serializable value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn date_label(doc: &Document) -> String {
    doc.date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "----------".to_string())
}

fn document_line(doc: &Document) -> String {
    let mut line = format!("{:>5}  {}  {}", doc.id, date_label(doc), doc.name);
    if !doc.path.is_empty() {
        line.push_str(&format!("  ({})", doc.path));
    }
    line
}

pub fn format_document(doc: &Document) -> String {
    let mut lines = vec![
        format!("id: {}", doc.id),
        format!("name: {}", doc.name),
        format!(
            "date: {}",
            doc.date.map(|d| d.to_string()).unwrap_or_default()
        ),
        format!("path: {}", doc.path),
        format!("codes: {}", code::to_text(&doc.codes)),
    ];
    lines.retain(|l| !l.ends_with(": "));
    lines.join("\n")
}

pub fn format_documents(docs: &[Document]) -> String {
    if docs.is_empty() {
        return "No documents found.".to_string();
    }
    let mut lines: Vec<String> = docs.iter().map(document_line).collect();
    lines.push(String::new());
    lines.push(format!("{} document(s)", docs.len()));
    lines.join("\n")
}

pub fn format_matches(matches: &[CodeMatch]) -> String {
    if matches.is_empty() {
        return "No documents found.".to_string();
    }
    let mut lines = Vec::with_capacity(matches.len() * 2 + 2);
    for m in matches {
        lines.push(document_line(&m.document));
        lines.push(format!("       matches: {}", code::to_text(&m.matching)));
    }
    lines.push(String::new());
    lines.push(format!("{} document(s)", matches.len()));
    lines.join("\n")
}

pub fn format_codes(codes: &[CodeToken]) -> String {
    codes
        .iter()
        .map(CodeToken::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Human-readable coverage report: one block per selected document, then
/// the codes nothing covered.
pub fn format_resolution(res: &Resolution) -> String {
    if res.selections.is_empty() {
        return format!(
            "No documents cover any of: {}",
            code::to_text(&res.uncovered)
        );
    }

    let mut lines = Vec::new();
    for (i, sel) in res.selections.iter().enumerate() {
        lines.push(format!("{:>3}. {}", i + 1, document_line(&sel.document)));
        lines.push(format!("     covers: {}", code::to_text(&sel.covered)));
    }

    let covered = res.covered().len();
    let total = covered + res.uncovered.len();
    lines.push(String::new());
    lines.push(format!(
        "{} document(s) cover {covered} of {total} code(s)",
        res.selections.len()
    ));
    if !res.uncovered.is_empty() {
        lines.push(format!("Not found: {}", code::to_text(&res.uncovered)));
    }
    lines.join("\n")
}
