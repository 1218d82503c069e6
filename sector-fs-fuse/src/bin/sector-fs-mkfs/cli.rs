use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
pub struct Cli {
    /// Disk image to create
    #[arg(long, short)]
    pub image: PathBuf,

    /// Total sectors of the image
    #[arg(long, short, default_value_t = 16 * 2048)]
    pub sectors: u32,

    /// Host directory whose regular files are imported into the root
    #[arg(long, short = 'S')]
    pub source: Option<PathBuf>,
}
