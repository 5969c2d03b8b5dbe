//! Sheetmap CLI - map spreadsheet columns onto nested JSON objects
//!
//! # Main Commands
//!
//! ```bash
//! sheetmap serve                      # Start HTTP server (port 3000)
//! sheetmap transform clients.xlsx     # Transform rows with the stored mappings
//! sheetmap mapping list               # Manage column mappings
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! sheetmap read clients.xlsx          # Just read rows to JSON
//! ```

use clap::{Parser, Subcommand};
use sheetmap::{
    ingest_file, read_file, BatchPolicy, ColumnMapping, Config, IngestOptions, MappingRequest,
    MappingStore, MappingTable, PageRequest, SearchField,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sheetmap")]
#[command(about = "Map spreadsheet columns onto nested JSON objects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a spreadsheet and output its rows as JSON
    Read {
        /// Input file (.xlsx, .xls or .csv)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Full pipeline: spreadsheet -> mappings -> nested JSON
    Transform {
        /// Input file (.xlsx, .xls or .csv)
        input: PathBuf,

        /// Mapping store directory (default: SHEETMAP_STORE_DIR)
        #[arg(long, conflicts_with = "mappings")]
        store: Option<PathBuf>,

        /// Use a JSON array of mappings instead of the store
        #[arg(short, long)]
        mappings: Option<PathBuf>,

        /// Skip rows that fail instead of aborting
        #[arg(long)]
        skip_invalid: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: SHEETMAP_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind (default: SHEETMAP_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Mapping store directory
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Manage column mappings
    Mapping {
        /// Mapping store directory
        #[arg(long, global = true)]
        store: Option<PathBuf>,

        #[command(subcommand)]
        action: MappingAction,
    },
}

#[derive(Subcommand)]
enum MappingAction {
    /// List all mappings
    List,

    /// Show one mapping
    Show {
        id: u64,
    },

    /// Add a mapping
    Add {
        /// Main column name
        #[arg(short, long)]
        column: String,
        /// Target path, e.g. `$.user.id`
        #[arg(short, long)]
        path: String,
        /// Alternate column names
        #[arg(short, long = "alt")]
        alternates: Vec<String>,
    },

    /// Replace an existing mapping
    Update {
        id: u64,
        #[arg(short, long)]
        column: String,
        #[arg(short, long)]
        path: String,
        #[arg(short, long = "alt")]
        alternates: Vec<String>,
    },

    /// Delete a mapping
    Delete {
        id: u64,
    },

    /// Delete every mapping
    Clear,

    /// Substring search on one field (json-path, main-column, alternate-columns)
    Search {
        field: SearchField,
        query: String,
        #[arg(long, default_value = "0")]
        page: usize,
        #[arg(long, default_value = "10")]
        size: usize,
    },

    /// Import a JSON array of mappings
    Import {
        file: PathBuf,
    },

    /// Export all mappings as a JSON array
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match Config::from_env() {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("✗ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, mut config: Config) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Read { input, output } => cmd_read(&input, output.as_deref()),

        Commands::Transform {
            input,
            store,
            mappings,
            skip_invalid,
            output,
        } => {
            if let Some(dir) = store {
                config.store_dir = dir;
            }
            if skip_invalid {
                config.batch_policy = BatchPolicy::SkipInvalid;
            }
            cmd_transform(&input, &config, mappings.as_deref(), output.as_deref())
        }

        Commands::Serve { port, host, store } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(dir) = store {
                config.store_dir = dir;
            }
            sheetmap::server::start_server(config).await
        }

        Commands::Mapping { store, action } => {
            if let Some(dir) = store {
                config.store_dir = dir;
            }
            cmd_mapping(action, &config)
        }
    }
}

fn cmd_read(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Reading: {}", input.display());

    let table = read_file(input)?;

    eprintln!("   Format: {}", table.format);
    if let Some(ref encoding) = table.encoding {
        eprintln!("   Encoding: {}", encoding);
    }
    eprintln!("   Columns: {}", table.headers.join(", "));
    eprintln!("✓ Read {} rows", table.row_count());

    let json = serde_json::to_string_pretty(&table.rows)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_transform(
    input: &Path,
    config: &Config,
    mappings_file: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Processing: {}", input.display());

    let mappings = match mappings_file {
        Some(path) => load_mapping_file(path)?,
        None => MappingStore::open(&config.store_dir)?.mapping_table(),
    };
    if mappings.is_empty() {
        eprintln!("! No column mappings found; every record will be empty.");
    }

    let result = ingest_file(input, &mappings, IngestOptions::with_policy(config.batch_policy))?;

    let json = serde_json::to_string_pretty(&result.records)?;
    write_output(&json, output)?;

    Ok(())
}

/// Mapping table from a JSON array of mapping requests.
fn load_mapping_file(path: &Path) -> Result<MappingTable, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let requests: Vec<MappingRequest> = serde_json::from_str(&content)?;
    let mappings: Vec<ColumnMapping> = requests
        .into_iter()
        .zip(1..)
        .map(|(request, id)| ColumnMapping {
            id,
            json_path: request.json_path,
            main_column_name: request.main_column_name,
            alternate_column_names: request.alternate_column_names,
        })
        .collect();
    Ok(MappingTable::from_mappings(&mappings))
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

fn print_mapping(m: &ColumnMapping) {
    println!("  [{}] {} -> {}", m.id, m.main_column_name, m.json_path);
    if !m.alternate_column_names.is_empty() {
        println!("       also: {}", m.alternate_column_names.join(", "));
    }
}

fn cmd_mapping(action: MappingAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = MappingStore::open(&config.store_dir)?;

    match action {
        MappingAction::List => {
            let mappings = store.list();
            if mappings.is_empty() {
                eprintln!("No mappings stored yet.");
                eprintln!("   Use 'sheetmap mapping add --column <name> --path <path>' to add one.");
                return Ok(());
            }

            eprintln!("Stored mappings ({}):\n", mappings.len());
            for m in mappings {
                print_mapping(m);
            }
        }

        MappingAction::Show { id } => {
            let mapping = store
                .get(id)
                .ok_or_else(|| format!("Column mapping not found with id: {}", id))?;
            println!("{}", serde_json::to_string_pretty(mapping)?);
        }

        MappingAction::Add {
            column,
            path,
            alternates,
        } => {
            let created = store.create(MappingRequest::new(column, path).with_alternates(alternates))?;
            eprintln!("✓ Mapping saved with id: {}", created.id);
        }

        MappingAction::Update {
            id,
            column,
            path,
            alternates,
        } => {
            store.update(id, MappingRequest::new(column, path).with_alternates(alternates))?;
            eprintln!("✓ Mapping {} updated", id);
        }

        MappingAction::Delete { id } => {
            store.delete(id)?;
            eprintln!("✓ Mapping deleted: {}", id);
        }

        MappingAction::Clear => {
            let removed = store.delete_all()?;
            eprintln!("✓ Deleted {} mapping(s)", removed);
        }

        MappingAction::Search {
            field,
            query,
            page,
            size,
        } => {
            let request = PageRequest {
                page,
                size,
                ..PageRequest::default()
            };
            let result = store.search(field, &query, &request);
            eprintln!(
                "{} match(es), page {}/{}\n",
                result.total_elements,
                result.number + 1,
                result.total_pages.max(1)
            );
            for m in &result.content {
                print_mapping(m);
            }
        }

        MappingAction::Import { file } => {
            eprintln!("Importing mappings from: {}", file.display());
            let imported = store.import(&file)?;
            eprintln!("✓ Imported {} mapping(s)", imported.len());
        }

        MappingAction::Export { output } => {
            let json = store.export()?;
            write_output(&json, output.as_deref())?;
        }
    }

    Ok(())
}
