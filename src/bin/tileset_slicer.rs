use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use tileset_tools::{
    slicer::{self, SliceConfig},
    usage_exit, TraversalOrder,
};

/// Cut sheet images into fixed size tiles written as `<n>.png`
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// A sheet image, or a directory whose `*.png` sheets are sliced in name order
    src: PathBuf,

    /// Directory the tiles are written to, created if missing
    dst: PathBuf,

    /// Tile width in pixels
    width: u32,

    /// Tile height in pixels
    height: u32,

    /// `keep` writes fully transparent tiles, any other value skips them.
    /// Without it every tile is written.
    keep_empty: Option<String>,

    /// Tile order: `row` walks each row left to right, `column` walks each
    /// column top to bottom
    #[arg(long, default_value = "row")]
    order: TraversalOrder,

    /// Number of the first tile written
    #[arg(long, default_value_t = 0)]
    first: u32,

    #[arg(short, long)]
    verbose: bool,
}

fn run(args: &Args) -> tileset_tools::Result<u32> {
    let config = SliceConfig::new(args.width, args.height)?
        .with_keep_empty(slicer::keep_empty_token(args.keep_empty.as_deref()))
        .with_order(args.order);
    log::debug!("{config:?}");
    let next = slicer::slice_path(&args.src, &args.dst, &config, args.first)?;
    return Ok(next - args.first);
}

fn main() -> ExitCode {
    let args = Args::try_parse().unwrap_or_else(|err| usage_exit(err));
    tileset_tools::init_logging(args.verbose);

    match run(&args) {
        Ok(created) => {
            println!("{created} images created.");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
