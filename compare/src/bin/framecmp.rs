use anyhow::{ensure, Context, Result};
use byte_unit::{Byte, UnitType};
use clap::{Parser, Subcommand};
use compare::{DispatchConfig, Dispatcher, DJB2_SEED};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Compare and hash raw frame files with the dispatched kernels
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML dispatch config; without it the COMPARE_DISABLE_* environment applies
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show detected capabilities and the kernel chosen for each operation
    Caps,

    /// Hamming distance and sum of squared error of two equal-size files
    Diff { a: PathBuf, b: PathBuf },

    /// djb2 hash of a file
    Hash {
        file: PathBuf,

        #[arg(long, default_value_t = DJB2_SEED)]
        seed: u32,

        /// Hash chunks on the rayon pool
        #[arg(long)]
        parallel: bool,
    },
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn size(len: usize) -> String {
    format!("{:.2}", Byte::from_u64(len as u64).get_appropriate_unit(UnitType::Binary))
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let dispatcher = match &cli.config {
        Some(path) => Dispatcher::from_config(&DispatchConfig::from_toml_file(path)?),
        None => Dispatcher::global(),
    };

    match cli.command {
        Command::Caps => {
            println!("capabilities: {}", dispatcher.capabilities());
            println!("hamming distance: {}", dispatcher.hamming_kernel(usize::MAX).name);
            println!("sum square error: {}", dispatcher.sse_kernel(usize::MAX).name);
            println!("djb2 hash: {}", dispatcher.hash_kernel(usize::MAX).name);
        }
        Command::Diff { a, b } => {
            let a_bytes = read(&a)?;
            let b_bytes = read(&b)?;
            ensure!(
                a_bytes.len() == b_bytes.len(),
                "{} is {} but {} is {}",
                a.display(),
                size(a_bytes.len()),
                b.display(),
                size(b_bytes.len()),
            );
            tracing::info!("Comparing {} per file", size(a_bytes.len()));

            println!("hamming distance: {}", dispatcher.par_hamming_distance(&a_bytes, &b_bytes));
            println!("sum square error: {}", dispatcher.par_sum_square_error(&a_bytes, &b_bytes));
        }
        Command::Hash { file, seed, parallel } => {
            let bytes = read(&file)?;
            tracing::info!("Hashing {} from {}", size(bytes.len()), file.display());

            let hash = if parallel {
                dispatcher.par_hash_djb2(&bytes, seed)
            } else {
                dispatcher.hash_djb2(&bytes, seed)
            };
            println!("{hash:#010x}  {}", file.display());
        }
    }

    Ok(())
}
