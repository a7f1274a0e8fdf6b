//! Educa Import CLI - bring registry files into the school dataset
//!
//! # Main Commands
//!
//! ```bash
//! educa-import serve                     # Start HTTP server (port 3000)
//! educa-import preview turma.csv         # Show what a file would import
//! educa-import import turma.csv --yes    # Import and commit
//! educa-import backup -o backup.json     # Export the dataset
//! educa-import stats                     # Students per school
//! educa-import allocate <school-id>      # Allocate unallocated students
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! educa-import parse alunos.csv          # Just parse CSV to JSON
//! educa-import normalize-key "Situação"  # Show the canonical key
//! ```

use clap::{Parser, Subcommand};
use educa_import::{
    allocate_unallocated, allocation_stats, backup, decode_content, normalize_key, parse_csv,
    server, Config, DatasetStore, FileStore, ImportOutcome, ImportTransaction, MemoryStore,
    TextEncoding,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "educa-import")]
#[command(about = "Import CSV, JSON and Educacenso files into the school registry", long_about = None)]
struct Cli {
    /// Dataset file (overrides EDUCA_STORE_PATH)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Text encoding: latin1, utf8 or auto (overrides EDUCA_ENCODING)
    #[arg(long, global = true)]
    encoding: Option<TextEncoding>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output its rows as JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Map a file and print the preview without importing it
    Preview {
        /// Input file (.csv, .json or Educacenso export)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Map a file and commit it to the dataset
    Import {
        /// Input file (.csv, .json or Educacenso export)
        input: PathBuf,

        /// Commit without asking; otherwise only the preview is shown
        #[arg(short, long)]
        yes: bool,
    },

    /// Export the dataset as a backup file
    Backup {
        /// Output file (default: backup_educa_<date>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show students per school
    Stats,

    /// Allocate every unallocated student to a school
    Allocate {
        /// School id
        school_id: String,
    },

    /// Show the canonical key for a header
    NormalizeKey {
        /// Header text
        text: String,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (overrides EDUCA_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match Config::from_env() {
        Ok(mut config) => {
            if let Some(store) = cli.store {
                config.store_path = store;
            }
            if let Some(encoding) = cli.encoding {
                config.encoding = encoding;
            }
            run(cli.command, config).await
        }
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref(), &config),
        Commands::Preview { input, output } => cmd_preview(&input, output.as_deref(), &config).await,
        Commands::Import { input, yes } => cmd_import(&input, yes, &config).await,
        Commands::Backup { output } => cmd_backup(output.as_deref(), &config),
        Commands::Stats => cmd_stats(&config),
        Commands::Allocate { school_id } => cmd_allocate(&school_id, &config),
        Commands::NormalizeKey { text } => {
            println!("{}", normalize_key(&text));
            Ok(())
        }
        Commands::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.port = port;
            }
            server::start_server(config).await
        }
    }
}

fn cmd_parse(input: &Path, output: Option<&Path>, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let bytes = fs::read(input)?;
    let (text, encoding) = decode_content(&bytes, config.encoding);
    let result = parse_csv(&text);

    eprintln!("   Encoding: {}", encoding);
    eprintln!("   Delimiter: '{}'", result.delimiter);
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} records", result.records.len());

    let json = serde_json::to_string_pretty(&result.records)?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_preview(input: &Path, output: Option<&Path>, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    // a scratch copy: a backup file would otherwise be restored
    let file_store = FileStore::open(&config.store_path)?;
    let mut scratch = MemoryStore::with_dataset(file_store.dataset().clone());
    let mut tx = ImportTransaction::new();

    match tx.process_file(input, &mut scratch, config.import_options()).await? {
        ImportOutcome::Preview(preview) => {
            let json = serde_json::to_string_pretty(&preview)?;
            write_output(&json, output)?;
            tx.cancel()?;
        }
        ImportOutcome::Committed(summary) => {
            eprintln!("📦 Backup file: {} schools, {} students", summary.schools, summary.students);
            eprintln!("   Use 'educa-import import {}' to restore it.", input.display());
        }
    }

    Ok(())
}

async fn cmd_import(input: &Path, yes: bool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = FileStore::open(&config.store_path)?;
    let mut tx = ImportTransaction::new();

    match tx.process_file(input, &mut store, config.import_options()).await? {
        ImportOutcome::Committed(summary) => {
            eprintln!("✅ {}", summary.message);
        }
        ImportOutcome::Preview(preview) if !yes => {
            println!("{}", serde_json::to_string_pretty(&preview)?);
            tx.cancel()?;
            eprintln!("\n⏸️  {} records not imported.", preview.batch.len());
            eprintln!("   Re-run with --yes to commit.");
        }
        ImportOutcome::Preview(_) => {
            let summary = tx.confirm(&mut store)?;
            eprintln!("✅ {}", summary.message);
            eprintln!("   💾 Saved to: {}", store.path().display());
        }
    }

    Ok(())
}

fn cmd_backup(output: Option<&Path>, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::open(&config.store_path)?;
    let dataset = backup(&store);
    let json = serde_json::to_string_pretty(&dataset)?;

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(educa_import::store::today_backup_file_name()));
    fs::write(&path, json)?;

    eprintln!(
        "💾 Backup written to: {} ({} schools, {} students)",
        path.display(),
        dataset.schools.len(),
        dataset.students.len()
    );
    Ok(())
}

fn cmd_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::open(&config.store_path)?;
    let stats = allocation_stats(store.students());

    eprintln!("📊 {} students, {} unallocated", stats.total, stats.unallocated);
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn cmd_allocate(school_id: &str, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = FileStore::open(&config.store_path)?;

    let school = store
        .schools()
        .iter()
        .find(|s| s.id == school_id)
        .cloned()
        .ok_or_else(|| format!("School not found: {}", school_id))?;

    let allocated = allocate_unallocated(store.students(), &school);
    if allocated.is_empty() {
        eprintln!("📋 No unallocated students.");
        return Ok(());
    }

    let count = allocated.len();
    store.update_students(allocated)?;
    eprintln!("✅ {} students allocated to {}", count, school.name);
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
