use clap::{Parser, Subcommand};
use medledger_core::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "medledger")]
#[command(about = "Patient and medication record store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override ledger file location
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    /// Load configuration from this file instead of the default path
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Invoke an operation by name (init, read, write, addPatient,
    /// addMedication, removeMedication, readRange)
    Invoke {
        /// Operation name
        function: String,

        /// Positional string arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Print the raw record stored at a key
    Read {
        key: String,
    },

    /// Print every record between two keys (inclusive) as a list
    List {
        start: String,
        end: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(payload) => match print_payload(&payload) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Vec<u8>> {
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Initialize logging
    medledger_core::logging::init_with_level(&config.logging.level);

    let ledger_path = cli.ledger.unwrap_or_else(|| config.ledger.path.clone());
    tracing::debug!("Using ledger at {:?}", ledger_path);

    let mut store =
        RecordStore::new(FileLedger::open(ledger_path)).with_ui_version(config.store.ui_version);

    match cli.command {
        Commands::Invoke { function, args } => store.invoke(&function, &args),
        Commands::Read { key } => store.invoke(Operation::Read.name(), &[key]),
        Commands::List { start, end } => store.invoke(Operation::ReadRange.name(), &[start, end]),
    }
}

fn print_payload(payload: &[u8]) -> io::Result<()> {
    if payload.is_empty() {
        return Ok(());
    }

    let mut stdout = io::stdout().lock();
    stdout.write_all(payload)?;
    stdout.write_all(b"\n")?;
    stdout.flush()
}
