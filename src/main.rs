use clap::Parser;
use codecover::{
    CatalogDb,
    DataDir,
    DocumentId,
    cli::{
        self,
        AddArgs,
        Cli,
        Command,
        ConfigAction,
        CoverArgs,
        EditArgs,
        SettingKey,
    },
    code,
    document::{DocumentPatch, NewDocument},
    error::{self, Error},
    mcp,
    output::{self, print_json},
    resolver,
    search,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("CODECOVER_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();

    if let Command::Completions(ref args) = cli.command {
        args.generate();
        return Ok(());
    }

    init_tracing(cli.verbose, cli.quiet);

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    let catalog = CatalogDb::open(&data_dir.catalog_db())?;

    match cli.command {
        Command::Add(args) => cmd_add(&catalog, args)?,
        Command::Edit(args) => cmd_edit(&catalog, args)?,
        Command::Remove { id } => {
            if !catalog.remove_document(id)? {
                return Err(not_found(id));
            }
            println!("Removed document {id}");
        }
        Command::Get { id, json } => {
            let doc = catalog.get_document(id)?.ok_or_else(|| not_found(id))?;
            if json {
                print_json(&doc)?;
            } else {
                println!("{}", output::format_document(&doc));
            }
        }
        Command::List { json } => {
            let docs = catalog.list_documents()?;
            if json {
                print_json(&docs)?;
            } else {
                println!("{}", output::format_documents(&docs));
            }
        }
        Command::Import(args) => cmd_import(&catalog, &args)?,
        Command::Cover(args) => cmd_cover(&catalog, &args)?,
        Command::Prefix(args) => {
            let limit = match args.limit {
                Some(limit) => limit,
                None => catalog.prefix_limit()?,
            };
            let codes = search::search_prefix(&catalog, &args.prefix, limit)?;
            if args.json {
                print_json(&codes)?;
            } else if !codes.is_empty() {
                println!("{}", output::format_codes(&codes));
            }
        }
        Command::Search(args) => {
            let docs = search::search_by_code(&catalog, &args.code, args.mode)?;
            if args.json {
                print_json(&docs)?;
            } else {
                println!("{}", output::format_documents(&docs));
            }
        }
        Command::Any(args) => {
            let matches = search::search_by_any_code(&catalog, &args.codes)?;
            if args.json {
                print_json(&matches)?;
            } else {
                println!("{}", output::format_matches(&matches));
            }
        }
        Command::Status { json } => cmd_status(&catalog, &data_dir, json)?,
        Command::Config { action } => cmd_config(&catalog, action)?,
        Command::Mcp => mcp::run_mcp(catalog)?,
        Command::Completions(_) => {}
    }

    Ok(())
}

fn not_found(id: DocumentId) -> Error {
    Error::NotFound {
        kind: "document",
        name: id.to_string(),
    }
}

fn cmd_add(catalog: &CatalogDb, args: AddArgs) -> error::Result<()> {
    let doc = catalog.insert_document(&NewDocument {
        name: args.name,
        date: args.date,
        path: args.path,
        codes: vec![args.codes],
    })?;
    println!(
        "Added document {} '{}' with {} code(s)",
        doc.id,
        doc.name,
        doc.codes.len()
    );
    Ok(())
}

fn cmd_edit(catalog: &CatalogDb, args: EditArgs) -> error::Result<()> {
    let date = if args.clear_date {
        Some(None)
    } else {
        args.date.map(Some)
    };
    let patch = DocumentPatch {
        name: args.name,
        date,
        path: args.path,
        codes: args.codes,
    };
    if patch.is_empty() {
        return Err(Error::Validation(
            "nothing to change; pass --name, --date, --clear-date, --path or \
             --codes"
                .to_string(),
        ));
    }
    let doc = catalog.update_document(args.id, &patch)?;
    println!("{}", output::format_document(&doc));
    Ok(())
}

fn cmd_import(
    catalog: &CatalogDb,
    args: &cli::ImportArgs,
) -> error::Result<()> {
    let raw = std::fs::read_to_string(&args.file)?;
    let entries: Vec<NewDocument> = serde_json::from_str(&raw)?;
    let docs = catalog.insert_documents(&entries)?;
    println!(
        "Imported {} document(s) from {}",
        docs.len(),
        args.file.display()
    );
    Ok(())
}

fn cmd_cover(catalog: &CatalogDb, args: &CoverArgs) -> error::Result<()> {
    if code::normalize(&args.codes).is_empty() {
        return Err(Error::Validation("no codes given".to_string()));
    }

    let resolution = resolver::resolve_coverage(catalog, &args.codes)?;
    if args.json {
        print_json(&resolution)?;
    } else {
        println!("{}", output::format_resolution(&resolution));
    }
    Ok(())
}

fn cmd_status(
    catalog: &CatalogDb,
    data_dir: &DataDir,
    json: bool,
) -> error::Result<()> {
    let documents = catalog.document_count()?;
    let codes = catalog.code_count()?;

    if json {
        print_json(&json!({
            "data_dir": data_dir.root(),
            "documents": documents,
            "codes": codes,
        }))?;
    } else {
        println!("Data directory: {}", data_dir.root().display());
        println!("Documents: {documents}");
        println!("Distinct codes: {codes}");
    }
    Ok(())
}

fn cmd_config(catalog: &CatalogDb, action: ConfigAction) -> error::Result<()> {
    match action {
        ConfigAction::Show { json } => {
            let key = SettingKey::PrefixLimit.as_str();
            let prefix_limit = catalog.prefix_limit()?;
            if json {
                print_json(&json!({ key: prefix_limit }))?;
            } else {
                println!("{key}: {prefix_limit}");
            }
        }
        ConfigAction::Set { key, value } => {
            let value = match key {
                SettingKey::PrefixLimit => {
                    codecover::catalog::parse_prefix_limit(&value)?.to_string()
                }
            };
            catalog.set_setting(key.as_str(), &value)?;
            println!("{} = {value}", key.as_str());
        }
        ConfigAction::Clear { key } => {
            if catalog.remove_setting(key.as_str())? {
                println!("Cleared {}", key.as_str());
            } else {
                println!("{} was not set", key.as_str());
            }
        }
    }
    Ok(())
}
