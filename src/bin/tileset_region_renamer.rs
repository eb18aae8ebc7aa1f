use std::{path::PathBuf, process::ExitCode};

use clap::{error::ErrorKind, CommandFactory, Parser};
use glam::UVec2;
use tileset_tools::{
    grid::{parse_regions, Region, RowWidth},
    manifest::Manifest,
    renamer::{self, OverlapPolicy},
    usage_exit,
};

/// Rename numbered tiles that fall inside grid regions to `<prefix>-<n>.png`
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    override_usage = "tileset_region_renamer [OPTIONS] <SRC_DIR> <PREFIX> <TILES_IN_ROW> <X1> <Y1> <X2> <Y2>\n       \
                      tileset_region_renamer [OPTIONS] <SRC_DIR> <TILES_IN_ROW> <JSON_REGIONS>"
)]
struct Args {
    /// Directory holding the numbered `*.png` tiles
    src_dir: PathBuf,

    /// `<prefix> <tiles_in_row> <x1> <y1> <x2> <y2>` for one region, or
    /// `<tiles_in_row> <json>` with a JSON array of `[prefix, x1, y1, x2, y2]`
    #[arg(required = true, value_name = "ARGS")]
    rest: Vec<String>,

    /// Whether a tile inside several regions goes to the first (`first`, the
    /// default) or to all of them (`every`). Only valid with a region list.
    #[arg(long)]
    overlap: Option<OverlapPolicy>,

    /// Log what would be renamed and deleted without touching any file
    #[arg(long)]
    dry_run: bool,

    /// Also write an imageset manifest (TOML) describing the renamed tiles
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,

    /// Mark the manifest imagesets as filtered
    #[arg(long, requires = "manifest")]
    filtering: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug)]
enum Invocation {
    Single { tiles_in_row: u32, region: Region },
    Multi { tiles_in_row: u32, regions_json: String },
}

fn number(name: &str, value: &str) -> Result<u32, clap::Error> {
    return value.parse().map_err(|_| {
        Args::command().error(
            ErrorKind::ValueValidation,
            format!("<{name}> must be a non-negative integer, got '{value}'"),
        )
    });
}

impl Invocation {
    fn from_args(args: &Args) -> Result<Self, clap::Error> {
        let invocation = Self::from_rest(&args.rest)?;
        if args.overlap.is_some() && matches!(invocation, Self::Single { .. }) {
            return Err(Args::command().error(
                ErrorKind::ArgumentConflict,
                "--overlap needs a region list; a single region cannot overlap another",
            ));
        }
        return Ok(invocation);
    }

    fn from_rest(rest: &[String]) -> Result<Self, clap::Error> {
        match rest {
            [tiles_in_row, json] => Ok(Self::Multi {
                tiles_in_row: number("TILES_IN_ROW", tiles_in_row)?,
                regions_json: json.clone(),
            }),
            [prefix, tiles_in_row, x1, y1, x2, y2] => {
                let top_left = UVec2::new(number("X1", x1)?, number("Y1", y1)?);
                let bottom_right = UVec2::new(number("X2", x2)?, number("Y2", y2)?);
                Ok(Self::Single {
                    tiles_in_row: number("TILES_IN_ROW", tiles_in_row)?,
                    region: Region::new(prefix.as_str(), top_left, bottom_right),
                })
            }
            _ => Err(Args::command().error(
                ErrorKind::WrongNumberOfValues,
                format!("expected 2 or 6 arguments after <SRC_DIR>, got {}", rest.len()),
            )),
        }
    }
}

fn print_counts<'a, I: IntoIterator<Item = (&'a String, &'a u32)>>(counts: I) {
    for (prefix, count) in counts {
        println!("{prefix}: {count}");
    }
}

fn run(args: &Args, invocation: Invocation) -> tileset_tools::Result<()> {
    match invocation {
        Invocation::Single {
            tiles_in_row,
            region,
        } => {
            let row_width = RowWidth::new(tiles_in_row)?;
            if args.dry_run {
                let ops = renamer::preview_region(&args.src_dir, &region, row_width)?;
                for op in &ops {
                    log::info!("would rename {} -> {}", op.from.display(), op.to.display());
                }
                println!("{} images would be renamed.", ops.len());
                return Ok(());
            }
            let renamed = renamer::rename_region(&args.src_dir, &region, row_width)?;
            println!("{renamed} images renamed.");
            if let Some(path) = &args.manifest {
                Manifest::for_region(&args.src_dir, &region.prefix, renamed, args.filtering).write(path)?;
            }
        }
        Invocation::Multi {
            tiles_in_row,
            regions_json,
        } => {
            let row_width = RowWidth::new(tiles_in_row)?;
            let regions = parse_regions(&regions_json)?;
            let policy = args.overlap.unwrap_or_default();
            if args.dry_run {
                let plan = renamer::preview(&args.src_dir, row_width, &regions, policy)?;
                for op in &plan.ops {
                    log::info!("would rename {} -> {}", op.from.display(), op.to.display());
                }
                for leftover in &plan.leftovers {
                    log::info!("would delete {}", leftover.display());
                }
                print_counts(plan.counters.iter());
                println!(
                    "{} images would be renamed, {} images would be deleted.",
                    plan.ops.len(),
                    plan.leftovers.len()
                );
                return Ok(());
            }
            let summary = renamer::rename_regions(&args.src_dir, row_width, &regions, policy)?;
            print_counts(&summary.counts);
            println!(
                "{} images renamed, {} images deleted.",
                summary.renamed, summary.deleted
            );
            if let Some(path) = &args.manifest {
                Manifest::from_summary(&args.src_dir, &summary, args.filtering).write(path)?;
            }
        }
    }
    return Ok(());
}

fn main() -> ExitCode {
    let args = Args::try_parse().unwrap_or_else(|err| usage_exit(err));
    let invocation = Invocation::from_args(&args).unwrap_or_else(|err| usage_exit(err));
    tileset_tools::init_logging(args.verbose);

    match run(&args, invocation) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
