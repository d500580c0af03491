//! jpeg-recompress CLI - shrink a JPEG while keeping it structurally similar

use std::path::PathBuf;

use clap::Parser;

mod recompress;

/// Re-encode an image at the lowest JPEG quality that still meets an SSIM target.
#[derive(Parser, Debug)]
#[command(name = "jpeg-recompress")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source image (JPEG, PNG, GIF, BMP, TIFF or WebP)
    pub src: PathBuf,

    /// Destination JPEG
    pub dest: PathBuf,

    /// Maximum quality
    #[arg(long = "max", default_value_t = 95)]
    pub max_quality: u8,

    /// Minimum quality
    #[arg(long = "min", default_value_t = 40)]
    pub min_quality: u8,

    /// Target SSIM
    #[arg(short = 't', long = "target", default_value_t = 0.99995)]
    pub target: f64,

    /// Maximum number of attempts to find the best quality
    #[arg(short = 'l', long = "loops", default_value_t = 6)]
    pub loops: u32,

    /// Overwrite the output image if it already exists
    #[arg(short, long)]
    pub force: bool,

    /// Disable copying files that will not be compressed
    #[arg(short = 'c', long = "no-copy")]
    pub no_copy: bool,

    /// Write a JSON (or CSV, by extension) report of the search
    #[arg(long, env = "JPEG_RECOMPRESS_REPORT")]
    pub report: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    recompress::run(&cli)
}
