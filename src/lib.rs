//! codecover - find the fewest documents that cover a list of part codes.
//!
//! Documents are cataloged with a name, an optional date, a storage path and
//! a set of part codes. Given a request like `"ab-100, AB-200; c7"`, the
//! resolver greedily picks the document covering the most still-missing
//! codes, repeating until everything is covered or nothing more can be, and
//! reports the codes no document carries.
//!
//! The catalog lives in a [redb](https://github.com/cberner/redb) database
//! with an inverted code index; any other store can take part by
//! implementing [`CodeIndex`].
//!
//! # Quick start
//!
//! ```no_run
//! use codecover::{CatalogDb, DataDir};
//! use codecover::document::NewDocument;
//! use codecover::resolver;
//!
//! let data_dir = DataDir::resolve(None).unwrap();
//! let catalog = CatalogDb::open(&data_dir.catalog_db()).unwrap();
//!
//! catalog
//!     .insert_document(&NewDocument {
//!         name: "Pump manual".to_string(),
//!         date: None,
//!         path: "manuals/pump.pdf".to_string(),
//!         codes: vec!["AB-100, AB-200".to_string()],
//!     })
//!     .unwrap();
//!
//! let resolution = resolver::resolve_coverage(&catalog, "ab-100 c7").unwrap();
//! for sel in &resolution.selections {
//!     println!("{} covers {:?}", sel.document.name, sel.covered);
//! }
//! println!("not found: {:?}", resolution.uncovered);
//! ```

pub mod catalog;
pub mod cli;
pub mod code;
pub mod data_dir;
pub mod doc_id;
pub mod document;
pub mod error;
pub mod index;
pub mod mcp;
pub mod output;
pub mod resolver;
pub mod search;

pub use catalog::CatalogDb;
pub use code::CodeToken;
pub use data_dir::DataDir;
pub use doc_id::DocumentId;
pub use document::Document;
pub use error::{Error, Result};
pub use index::{CodeIndex, MemoryIndex};
pub use resolver::{Resolution, Selection};
pub use search::SearchMode;
