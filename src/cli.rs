use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use crate::{doc_id::DocumentId, search::SearchMode};

#[derive(Debug, Parser)]
#[command(
    name = "codecover",
    about = "Catalog documents by part code and find the fewest documents covering a code list"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Catalog a document with its codes
    Add(AddArgs),
    /// Update a cataloged document
    Edit(EditArgs),
    /// Remove a document from the catalog
    Remove {
        /// Document id (e.g. #12 or 12)
        id: DocumentId,
    },
    /// Show one document
    Get {
        /// Document id (e.g. #12 or 12)
        id: DocumentId,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all documents, most recently cataloged first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Catalog documents from a JSON file
    Import(ImportArgs),
    /// Find the fewest documents covering a list of codes
    Cover(CoverArgs),
    /// Suggest stored codes starting with a prefix
    Prefix(PrefixArgs),
    /// Find documents by a single code
    Search(SearchArgs),
    /// Find every document carrying any of the given codes
    Any(AnyArgs),
    /// Show catalog statistics
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Start MCP server for AI agent integration
    Mcp,
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Catalog maintenance --

#[derive(Debug, Parser)]
pub struct AddArgs {
    /// Document name
    pub name: String,

    /// Document date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Storage path of the document file
    #[arg(long, default_value = "")]
    pub path: String,

    /// Codes separated by commas, semicolons or whitespace
    #[arg(long, default_value = "")]
    pub codes: String,
}

#[derive(Debug, Parser)]
pub struct EditArgs {
    /// Document id (e.g. #12 or 12)
    pub id: DocumentId,

    /// New document name
    #[arg(long)]
    pub name: Option<String>,

    /// New document date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "clear_date")]
    pub date: Option<NaiveDate>,

    /// Remove the stored date
    #[arg(long)]
    pub clear_date: bool,

    /// New storage path
    #[arg(long)]
    pub path: Option<String>,

    /// Replace the code set
    #[arg(long)]
    pub codes: Option<String>,
}

#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// JSON file holding an array of {name, date?, path?, codes: [...]}
    pub file: PathBuf,
}

// -- Queries --

#[derive(Debug, Parser)]
pub struct CoverArgs {
    /// Requested codes separated by commas, semicolons or whitespace
    pub codes: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct PrefixArgs {
    /// Code prefix
    pub prefix: String,

    /// Maximum number of codes (defaults to the prefix_limit setting)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// Code (or, in contains mode, a fragment of a code or name)
    pub code: String,

    /// Matching mode
    #[arg(short, long, value_enum, default_value_t = SearchMode::Contains)]
    pub mode: SearchMode,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct AnyArgs {
    /// Codes separated by commas, semicolons or whitespace
    pub codes: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Config --

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SettingKey {
    /// Maximum number of prefix suggestions
    PrefixLimit,
}

impl SettingKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PrefixLimit => "prefix_limit",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show effective settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Persist a setting
    Set {
        #[arg(value_enum)]
        key: SettingKey,
        value: String,
    },
    /// Clear a stored setting (revert to default)
    Clear {
        #[arg(value_enum)]
        key: SettingKey,
    },
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "codecover",
            &mut std::io::stdout(),
        );
    }
}
