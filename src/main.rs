//! beanbills command line entry point

use anyhow::{bail, Context};
use beanbills_config::Config;
use beanbills_core::{
    CompletionExtractor, CoreError, CoreResult, DefaultErrorLogger, ErrorLogger, IncludesBuilder,
    IncludesWatcher, RawBill, RawTransaction, Store,
};
use beanbills_parser::render_bill;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "beanbills")]
#[command(version = "0.1.0")]
#[command(about = "Files bills into a Beancount ledger tree", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the default configuration file
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
    /// Save a bill from a JSON payload
    Save {
        payload: PathBuf,
        /// The payload holds a single transaction
        #[arg(long)]
        transaction: bool,
    },
    /// Print the ledger text of a JSON payload without saving it
    Render { payload: PathBuf },
    /// Rebuild the includes file or region
    Includes,
    /// Print payees, tags, links, accounts and currencies as JSON
    Completions,
    /// Rebuild the includes whenever a ledger file is added or removed
    Watch,
}

fn read_payload(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading payload {}", path.display()))
}

/// Log a core failure before handing it to anyhow
fn report<T>(result: CoreResult<T>, operation: &str) -> anyhow::Result<T> {
    result.map_err(|error: CoreError| {
        DefaultErrorLogger.log_error(&error, operation);
        anyhow::Error::new(error)
    })
}

fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists, use --force to replace it", path.display());
    }
    std::fs::write(path, Config::generate_default())
        .with_context(|| format!("writing {}", path.display()))?;
    println!("{}", path.display());
    Ok(())
}

/// Load the configuration and start logging at its level
fn setup(path: &Path) -> anyhow::Result<Config> {
    let config = Config::load_or_default(path).map_err(|e| anyhow::anyhow!("{}", e.to_details()))?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();
    log::debug!("Config loaded: bills folder={}", config.bills.folder.display());
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Init { force } => init(&args.config, force)?,
        Command::Save { payload, transaction } => {
            let config = setup(&args.config)?;
            let text = read_payload(&payload)?;
            let store = Store::new(&config);
            let saved = if transaction {
                let raw: RawTransaction = serde_json::from_str(&text)
                    .with_context(|| format!("decoding {}", payload.display()))?;
                let txn = report(raw.decode(config.payload.policy), "decode_transaction")?;
                report(store.save_transaction(&txn), "save_transaction")?
            } else {
                let bill = report(
                    RawBill::from_json(&text).and_then(|raw| raw.decode(config.payload.policy)),
                    "decode_bill",
                )?;
                report(store.save_bill(&bill), "save_bill")?
            };
            println!("{}", serde_json::to_string_pretty(&saved)?);
        }
        Command::Render { payload } => {
            let config = setup(&args.config)?;
            let text = read_payload(&payload)?;
            let bill = report(
                RawBill::from_json(&text).and_then(|raw| raw.decode(config.payload.policy)),
                "decode_bill",
            )?;
            let store = Store::new(&config);
            let sources: Vec<&Path> = bill.documents.iter().map(|d| d.source.as_path()).collect();
            println!("{}", render_bill(&bill, &store.stored_names(&sources)));
        }
        Command::Includes => {
            let config = setup(&args.config)?;
            let written = report(Store::new(&config).includes().rebuild(), "rebuild_includes")?;
            println!("{}", written.display());
        }
        Command::Completions => {
            let config = setup(&args.config)?;
            let completions = report(CompletionExtractor::new(&config).extract(), "extract_completions")?;
            println!("{}", serde_json::to_string_pretty(&completions)?);
        }
        Command::Watch => {
            let config = setup(&args.config)?;
            let watcher = IncludesWatcher::new(IncludesBuilder::new(&config));
            report(watcher.run(), "watch_bills")?;
        }
    }

    Ok(())
}
