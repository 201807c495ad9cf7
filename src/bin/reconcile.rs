use clap::{Parser, Subcommand};
use ledger_reconcile::utils::format_dollars;
use ledger_reconcile::{
    delta, parse_amount, update_status, EditRequest, EditResult, Error, FormatError, ReaderConfig,
    Snapshot, Status,
};
use log::debug;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

#[derive(Debug, Parser)]
#[command(
    name = "reconcile",
    about = "Reconcile a text-based ledger file against a statement.",
    version = VERSION,
    author = AUTHOR,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the transactions in the output of `ledger emacs`
    Show {
        /// Only transactions touching this account, with its reconciled total
        #[arg(short, long)]
        account: Option<String>,
        /// Nesting limit of the reader
        #[arg(long, default_value_t = ledger_reconcile::parse::DEFAULT_MAX_DEPTH)]
        max_depth: usize,
        /// File with the structured output, `-` for stdin
        #[arg(default_value = "-")]
        input: String,
    },
    /// Change the status marker of postings in a ledger file
    Mark {
        #[arg(short, long)]
        file: PathBuf,
        /// 1-based line numbers of the postings
        #[arg(short, long, value_delimiter = ',', required = true)]
        lines: Vec<usize>,
        /// Status the postings must have now
        #[arg(long)]
        from: Status,
        #[arg(long)]
        to: Status,
    },
    /// Normalize a statement balance, optionally against the current balance
    Target {
        text: String,
        #[arg(short, long)]
        balance: Option<String>,
    },
}

fn read_input(input: &str, config: &ReaderConfig) -> Result<Snapshot, Error> {
    if input == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Snapshot::read(&text, config)
    } else {
        Snapshot::read_file(input, config)
    }
}

fn show(input: &str, account: Option<&str>, config: &ReaderConfig) -> Result<(), Error> {
    let snapshot = read_input(input, config)?;
    debug!("read {} transactions from {}", snapshot.transactions().len(), input);
    match account {
        None => {
            for txn in snapshot.transactions() {
                println!("{}\n", txn);
            }
        }
        Some(account) => {
            for txn in snapshot.transactions() {
                if txn.postings_for(account).next().is_some() {
                    println!("{}\n", txn);
                }
            }
            let total = snapshot
                .cleared_and_pending_total(account)
                .ok_or_else(|| FormatError::OutOfRange(format!("total of {}", account)))?;
            println!("{} cleared and pending: {}", account, format_dollars(total));
            println!("{} uncleared", snapshot.uncleared(account).count());
        }
    }
    Ok(())
}

fn mark(file: PathBuf, lines: Vec<usize>, from: Status, to: Status) -> Result<ExitCode, Error> {
    let request = EditRequest::new(lines, from, to);
    match update_status(&file, &request)? {
        EditResult::Applied { updated, .. } => {
            println!("{} postings marked {}", updated, to);
            Ok(ExitCode::SUCCESS)
        }
        EditResult::PreconditionFailed { line, actual } => {
            println!("line {} is {}, not {}; nothing changed", line, actual, from);
            Ok(ExitCode::from(2))
        }
    }
}

fn target(text: &str, balance: Option<&str>) -> Result<(), Error> {
    let amount = parse_amount(text)?;
    println!("{}", amount);
    if let Some(balance) = balance {
        println!("{} remaining", delta(text, balance)?);
    }
    Ok(())
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let args = Cli::parse();
    let result = match args.command {
        Commands::Show {
            account,
            max_depth,
            input,
        } => show(&input, account.as_deref(), &ReaderConfig { max_depth }).map(|_| ExitCode::SUCCESS),
        Commands::Mark {
            file,
            lines,
            from,
            to,
        } => mark(file, lines, from, to),
        Commands::Target { text, balance } => {
            target(&text, balance.as_deref()).map(|_| ExitCode::SUCCESS)
        }
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
