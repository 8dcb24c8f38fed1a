//! gasctl
//!
//! Command-line governance tool for a journaled gas schedule.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use crossbeam::channel::Receiver;
use gas_schedule::codec::{BincodeCodec, BlobCodec};
use gas_schedule::digest::ScheduleDigest;
use gas_schedule::pricing::StoragePricing;
use gas_schedule::reconfig::ReconfigEvent;
use gas_schedule::{Authority, Config, ConfigEntry, Governor, ScheduleError, VersionedConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// gasctl
#[derive(Parser, Debug)]
#[command(name = "gasctl")]
#[command(about = "Govern a versioned gas schedule")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./gas_schedule_data")]
    data_dir: PathBuf,

    /// Network owner address
    #[arg(long, default_value = "0x1")]
    owner: String,

    /// Address to act as
    #[arg(long, default_value = "0x1")]
    signer: String,

    /// Run with deferred-reconfiguration mode active
    #[arg(long)]
    deferred: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode a schedule blob
    Encode {
        /// Feature version of the schedule
        #[arg(short = 'v', long)]
        feature_version: u64,

        /// Entries as name=value, in order
        #[arg(short, long = "entry", value_parser = parse_entry)]
        entries: Vec<ConfigEntry>,

        /// Output file
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Install the genesis schedule
    Init {
        /// Blob file
        blob: PathBuf,
    },

    /// Replace the live schedule now
    Set {
        /// Blob file
        blob: PathBuf,
    },

    /// Stage a schedule for the next epoch
    Stage {
        /// Blob file
        blob: PathBuf,

        /// Refuse unless the live schedule has this digest (hex)
        #[arg(long)]
        expect_digest: Option<ScheduleDigest>,
    },

    /// Apply the staged schedule (epoch boundary)
    Apply,

    /// Print the live and staged schedules
    Show,

    /// Print the digest of the live schedule
    Digest,

    /// Reset storage pricing to the built-in defaults
    ResetPricing,
}

fn parse_entry(s: &str) -> Result<ConfigEntry, String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {}", s))?;
    let value = value
        .parse::<u64>()
        .map_err(|e| format!("bad value for {}: {}", name, e))?;
    Ok(ConfigEntry::new(name, value))
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gas_schedule=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_rejection() => {
            tracing::error!("Rejected: {}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("Failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> gas_schedule::Result<()> {
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .owner(&args.owner)
        .deferred_mode(args.deferred)
        .build();
    let open = || {
        tracing::debug!("gasctl v{} on {}", gas_schedule::VERSION, config.data_dir.display());
        Governor::open(config.clone())
    };
    let signer = Authority::new(args.signer);

    match args.command {
        Commands::Encode {
            feature_version,
            entries,
            out,
        } => {
            let schedule = VersionedConfig::new(feature_version, entries);
            let blob = BincodeCodec::default().encode(&schedule)?;
            fs::write(&out, &blob)?;
            tracing::info!("Wrote {} byte blob to {}", blob.len(), out.display());
            Ok(())
        }
        Commands::Init { blob } => open()?.initialize(&signer, &read_blob(&blob)?),
        Commands::Set { blob } => {
            let governor = open()?;
            let events = governor.subscribe();
            governor.set_current(&signer, &read_blob(&blob)?)?;
            report(events);
            Ok(())
        }
        Commands::Stage {
            blob,
            expect_digest,
        } => {
            let governor = open()?;
            let blob = read_blob(&blob)?;
            match expect_digest {
                Some(digest) => governor.stage_for_next_epoch_checked(&signer, &digest, &blob),
                None => governor.stage_for_next_epoch(&signer, &blob),
            }
        }
        Commands::Apply => {
            if !open()?.apply_staged(&signer)? {
                println!("nothing staged");
            }
            Ok(())
        }
        Commands::Show => show(&open()?),
        Commands::Digest => {
            match open()?.current_digest()? {
                Some(digest) => println!("{}", digest),
                None => println!("uninitialized"),
            }
            Ok(())
        }
        Commands::ResetPricing => {
            let governor = open()?;
            let events = governor.subscribe();
            governor.set_storage_pricing(&signer, StoragePricing::default())?;
            report(events);
            Ok(())
        }
    }
}

fn report(events: Option<Receiver<ReconfigEvent>>) {
    for event in events.iter().flat_map(|rx| rx.try_iter()) {
        println!("reconfiguration #{}: {:?}", event.sequence, event.reason);
    }
}

fn read_blob(path: &Path) -> Result<Vec<u8>, ScheduleError> {
    Ok(fs::read(path)?)
}

fn show(governor: &Governor) -> gas_schedule::Result<()> {
    println!("mode: {}", governor.mode());

    match (governor.current()?, governor.legacy()?) {
        (Some(current), _) => print_schedule("live", &current),
        (None, Some(legacy)) => {
            println!("live: legacy ({} entries)", legacy.entries.len());
            for entry in &legacy.entries {
                println!("  {} = {}", entry.name, entry.value);
            }
        }
        (None, None) => println!("live: uninitialized"),
    }

    if let Some(staged) = governor.staged()? {
        print_schedule("staged", &staged);
    }
    Ok(())
}

fn print_schedule(label: &str, schedule: &VersionedConfig) {
    println!(
        "{}: feature version {} ({} entries)",
        label,
        schedule.feature_version,
        schedule.len()
    );
    for entry in &schedule.entries {
        println!("  {} = {}", entry.name, entry.value);
    }
}
