//! SkillWallet CLI: `skillwallet` command.
//!
//! Verifies exported skill records against the ledger, and exposes the
//! encoding steps (normalization, hashing, key derivation) for audits.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use skillwallet::core::timestamp::normalize_value;
use skillwallet::core::{canonical_record_bytes, record_hash, record_skill_calldata};
use skillwallet::rpc::{ContractAddress, RpcConfig, RpcLedger};
use skillwallet::{
    IntegrityVerifier, JsonFileRecordSource, LedgerReader, LookupMode, Outcome, RecordKeyDeriver,
    SkillRecord, SqliteLedger, VerificationResult, VerifierConfig, VerifyError,
};

// ── CLI structure ─────────────────────────────────────────────────────────────

/// Verify SkillWallet records against the on-chain ledger.
#[derive(Parser, Debug)]
#[command(name = "skillwallet", version, about, long_about = None)]
struct Cli {
    /// Log debug events from the verifier and ledger backends
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify records from an exported records file
    Verify {
        /// JSON file mapping record ids to record documents
        #[arg(long)]
        records: PathBuf,

        /// Record ids to verify (default: every record in the file)
        ids: Vec<String>,

        /// Attach the candidate-key trace to each result
        #[arg(long)]
        trace: bool,

        /// Scan the full ledger snapshot even when by-key lookup is available
        #[arg(long)]
        scan: bool,

        /// Print results as JSON lines
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        ledger: LedgerArgs,
    },

    /// Show the hash and candidate keys of one record
    Hash {
        /// JSON file mapping record ids to record documents
        #[arg(long, conflicts_with = "document")]
        records: Option<PathBuf>,

        /// Record id within --records
        #[arg(requires = "records")]
        id: Option<String>,

        /// JSON file holding a single record document
        #[arg(long)]
        document: Option<PathBuf>,

        /// Also print the `recordSkill` calldata
        #[arg(long)]
        calldata: bool,
    },

    /// Normalize a raw `reviewedAt` value to epoch seconds
    Normalize {
        /// JSON value, e.g. 1700000000000 or '{"_seconds":1700000000}'.
        /// Input that is not JSON is taken as a string.
        value: String,
    },

    /// List ledger entries, or copy them into a SQLite mirror
    Entries {
        /// Write the entries into this SQLite mirror instead of printing them
        #[arg(long)]
        mirror: Option<PathBuf>,

        #[command(flatten)]
        ledger: LedgerArgs,
    },
}

/// Where ledger entries are read from.
#[derive(Args, Debug)]
struct LedgerArgs {
    /// JSON-RPC endpoint
    #[arg(long, env = "SKILLWALLET_RPC_URL")]
    rpc_url: Option<String>,

    /// Deployed SkillWallet contract address
    #[arg(long, env = "SKILLWALLET_CONTRACT_ADDRESS")]
    contract: Option<String>,

    /// deployment.json holding the contract address
    #[arg(long, env = "SKILLWALLET_DEPLOYMENT_FILE")]
    deployment: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Read a local SQLite mirror instead of the JSON-RPC endpoint
    #[arg(long)]
    sqlite: Option<PathBuf>,
}

impl LedgerArgs {
    fn rpc_config(&self) -> Result<RpcConfig> {
        let mut config = RpcConfig::from_env().context("invalid ledger environment")?;
        if let Some(url) = &self.rpc_url {
            config = config.with_url(url.clone());
        }
        if let Some(address) = &self.contract {
            let address: ContractAddress = address
                .parse()
                .with_context(|| format!("invalid --contract `{}`", address))?;
            config = config.with_contract_address(address);
        }
        if let Some(path) = &self.deployment {
            config = config
                .with_deployment_file(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    fn open(&self) -> Result<Arc<dyn LedgerReader>> {
        if let Some(path) = &self.sqlite {
            let mirror = SqliteLedger::open(path)
                .with_context(|| format!("failed to open mirror {}", path.display()))?;
            return Ok(Arc::new(mirror));
        }
        let config = self.rpc_config()?;
        debug!(url = %config.url, "using rpc ledger");
        let ledger = RpcLedger::connect(config).context("failed to configure rpc ledger")?;
        Ok(Arc::new(ledger))
    }
}

// ── Main entry point ──────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Verify {
            records,
            ids,
            trace,
            scan,
            json,
            ledger,
        } => cmd_verify(&records, ids, trace, scan, json, &ledger).await,
        Commands::Hash {
            records,
            id,
            document,
            calldata,
        } => cmd_hash(records, id, document, calldata).map(|()| ExitCode::SUCCESS),
        Commands::Normalize { value } => cmd_normalize(&value).map(|()| ExitCode::SUCCESS),
        Commands::Entries { mirror, ledger } => cmd_entries(mirror, &ledger).await.map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

/// `RUST_LOG` wins; otherwise warnings, or debug for our crates with `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,skillwallet=debug,skillwallet_ledger=debug,skillwallet_rpc=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// `skillwallet verify --records FILE [ID...]`
///
/// Exit code 0 when every record verified, 1 when any did not, 2 when the
/// ledger was unavailable for any record.
async fn cmd_verify(
    records: &Path,
    ids: Vec<String>,
    trace: bool,
    scan: bool,
    json: bool,
    ledger: &LedgerArgs,
) -> Result<ExitCode> {
    let source = JsonFileRecordSource::open(records)
        .with_context(|| format!("failed to read records from {}", records.display()))?;
    let ids: Vec<String> = if ids.is_empty() {
        source.ids().into_iter().map(str::to_string).collect()
    } else {
        ids
    };
    if ids.is_empty() {
        bail!("{} holds no records", records.display());
    }

    let mut config = VerifierConfig::default();
    if trace {
        config = config.with_trace();
    }
    if scan {
        config = config.with_lookup(LookupMode::Scan);
    }
    let verifier = IntegrityVerifier::new(ledger.open()?, config);

    let (mut not_verified, mut unavailable) = (0usize, 0usize);
    for id in &ids {
        match verifier.verify_from_source(&source, id).await {
            Ok(result) => {
                match result.outcome() {
                    Outcome::Verified => {}
                    Outcome::NotVerified => not_verified += 1,
                    Outcome::Unavailable => unavailable += 1,
                }
                print_result(id, &result, json)?;
            }
            Err(e @ (VerifyError::MalformedRecord(_) | VerifyError::UnknownRecord(_))) => {
                not_verified += 1;
                eprintln!("{id}: {e}");
            }
            Err(e) => return Err(e).with_context(|| format!("failed to load record {id}")),
        }
    }

    if !json {
        println!();
        println!(
            "{} verified, {} not verified, {} unavailable",
            ids.len() - not_verified - unavailable,
            not_verified,
            unavailable
        );
    }

    Ok(if unavailable > 0 {
        ExitCode::from(2)
    } else if not_verified > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn print_result(id: &str, result: &VerificationResult, json: bool) -> Result<()> {
    if json {
        let mut value = serde_json::to_value(result)?;
        if let Value::Object(map) = &mut value {
            map.insert("id".to_string(), Value::String(id.to_string()));
        }
        println!("{}", serde_json::to_string(&value)?);
        return Ok(());
    }

    let status = match result.outcome() {
        Outcome::Verified => "VERIFIED",
        Outcome::NotVerified => "NOT VERIFIED",
        Outcome::Unavailable => "UNAVAILABLE",
    };
    println!("{id}: {status}");
    println!("  {}", result.message);
    println!("  Database hash: {}", result.database_hash);
    if let Some(remote) = result.blockchain_hash {
        println!("  Ledger hash:   {}", remote);
    }
    if let Some(trace) = &result.trace {
        println!(
            "  reviewedAt {} ({}), {} lookup",
            trace.reviewed_at,
            trace.timestamp_source,
            serde_json::to_string(&trace.lookup)?.trim_matches('"')
        );
        for candidate in &trace.candidates {
            let found = match candidate.found {
                Some(true) => "found",
                Some(false) => "absent",
                None => "not tried",
            };
            println!(
                "    {:<9} t={:<14} {} {}",
                candidate.variant, candidate.timestamp, candidate.record_key, found
            );
        }
    }
    Ok(())
}

/// `skillwallet hash (--records FILE ID | --document FILE)`
fn cmd_hash(records: Option<PathBuf>, id: Option<String>, document: Option<PathBuf>, calldata: bool) -> Result<()> {
    let doc = match (records, id, document) {
        (Some(path), Some(id), None) => {
            let raw = std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let mut all: Value = serde_json::from_str(&raw).with_context(|| format!("{} is not JSON", path.display()))?;
            all.get_mut(&id)
                .map(Value::take)
                .ok_or_else(|| anyhow!("record `{}` not in {}", id, path.display()))?
        }
        (None, None, Some(path)) => {
            let raw = std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("{} is not JSON", path.display()))?
        }
        _ => bail!("give either --records FILE ID or --document FILE"),
    };

    let record = SkillRecord::from_document(&doc).context("malformed record")?;
    let reviewed_at = record.normalized_reviewed_at();
    let bytes = canonical_record_bytes(&record, reviewed_at.seconds);

    println!("reviewedAt:  {} ({})", reviewed_at.seconds, reviewed_at.source);
    println!("Encoding:    {} bytes", bytes.len());
    println!("Record hash: {}", record_hash(&record, reviewed_at.seconds));
    println!("Candidate keys:");
    for candidate in RecordKeyDeriver::default().derive(&record.custom_uid, &record.course_code, reviewed_at.seconds) {
        println!("  {:<9} t={:<14} {}", candidate.variant, candidate.timestamp, candidate.key);
    }
    if calldata {
        println!(
            "recordSkill calldata: 0x{}",
            hex::encode(record_skill_calldata(&record, reviewed_at.seconds))
        );
    }
    Ok(())
}

/// `skillwallet normalize VALUE`
fn cmd_normalize(input: &str) -> Result<()> {
    let value = serde_json::from_str(input).unwrap_or_else(|_| Value::String(input.to_string()));
    let normalized = normalize_value(&value);
    println!("{} ({})", normalized.seconds, normalized.source);
    if normalized.is_degenerate() {
        eprintln!("warning: `{}` has no usable time; it encodes as 0", input);
    }
    Ok(())
}

/// `skillwallet entries [--mirror PATH]`
async fn cmd_entries(mirror: Option<PathBuf>, ledger: &LedgerArgs) -> Result<()> {
    let ledger = ledger.open()?;

    if let Some(path) = mirror {
        let target = SqliteLedger::open(&path).with_context(|| format!("failed to open mirror {}", path.display()))?;
        let report = target
            .mirror_from(ledger.as_ref())
            .await
            .context("failed to mirror ledger")?;
        println!(
            "Mirrored {} entries into {}: {} new, {} already present, {} conflicting",
            report.entries,
            path.display(),
            report.inserted,
            report.already_present,
            report.conflicts
        );
        return Ok(());
    }

    let entries = ledger.entries().await.context("failed to read ledger")?;
    for (position, entry) in entries.iter().enumerate() {
        println!("{position:>6}  {}  {}", entry.record_key, entry.data_hash);
    }
    eprintln!("{} entries from {} ledger", entries.len(), ledger.backend());
    Ok(())
}
