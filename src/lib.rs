pub mod candidate;
pub mod error;
pub mod grid;
pub mod manifest;
pub mod renamer;
pub mod slicer;

use std::str::FromStr;

use derive_more::{Deref, DerefMut, From};
use glam::UVec2;

pub use error::{Result, TilesetError};

pub trait Area {
    type Output;
    fn area(&self) -> Self::Output;
}

impl Area for Grid {
    type Output = u64;

    fn area(&self) -> Self::Output {
        return u64::from(self.x) * u64::from(self.y);
    }
}

/// Tile counts of a sheet, columns in `x` and rows in `y`
#[derive(Deref, DerefMut, From, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Grid(pub UVec2);

impl Grid {
    /// Whole tiles that fit in `image_dims`; a partial last row or column is dropped
    pub fn whole_tiles(image_dims: UVec2, tile_size: UVec2) -> Self {
        return Self(image_dims / tile_size);
    }

    pub fn iter_locs(&self, order: TraversalOrder) -> GridIter {
        return GridIter {
            dims: self.0,
            order,
            cur: 0,
            len: self.area(),
        };
    }
}

/// Order in which the cells of a grid are visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalOrder {
    /// Rows top to bottom, each row left to right
    #[default]
    RowMajor,
    /// Columns left to right, each column top to bottom
    ColumnMajor,
}

impl FromStr for TraversalOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "row" => Ok(Self::RowMajor),
            "column" => Ok(Self::ColumnMajor),
            other => Err(format!("unknown order '{other}', expected 'row' or 'column'")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GridIter {
    dims: UVec2,
    order: TraversalOrder,
    cur: u64,
    len: u64,
}

impl Iterator for GridIter {
    type Item = UVec2;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur >= self.len {
            return None;
        }
        let i = self.cur;
        self.cur += 1;
        let (columns, rows) = (u64::from(self.dims.x), u64::from(self.dims.y));
        // both quotient and remainder are bounded by a u32 grid dimension
        let (x, y) = match self.order {
            TraversalOrder::RowMajor => (i % columns, i / columns),
            TraversalOrder::ColumnMajor => (i / rows, i % rows),
        };
        return Some(UVec2::new(x as u32, y as u32));
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.len - self.cur).ok();
        return (remaining.unwrap_or(usize::MAX), remaining);
    }
}

/// Prints a usage error and exits with status 1; help and version exit normally
pub fn usage_exit(err: clap::Error) -> ! {
    if !err.use_stderr() {
        err.exit();
    }
    let _ = err.print();
    std::process::exit(1);
}

/// Terminal logger shared by the binaries
pub fn init_logging(verbose: bool) {
    use simplelog::*;
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();
    if let Err(err) = TermLogger::init(level, config, TerminalMode::Mixed, ColorChoice::Auto) {
        eprintln!("could not initialize logger: {err}");
    }
}
