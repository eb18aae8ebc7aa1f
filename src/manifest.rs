//! Imageset definitions for renamed tiles.
//!
//! The engine loads an imageset as every file `directory + pattern(i)` for `i`
//! in an inclusive range, so a prefix that was numbered `0..count` maps onto a
//! single images entry.

use std::{fs, path::Path};

use serde::Serialize;

use crate::{
    candidate::TILE_EXTENSION,
    error::{Result, TilesetError},
    renamer::RenameSummary,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub imageset: Vec<Imageset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Imageset {
    pub id: String,
    pub filtering: bool,
    pub images: Vec<ImageRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImageRange {
    pub directory: String,
    pub file_pattern: String,
    pub file_range: [u32; 2],
}

impl Manifest {
    /// One imageset per prefix that matched at least one tile
    pub fn from_counts<'a, I>(dir: &Path, counts: I, filtering: bool) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a u32)>,
    {
        let mut directory = dir.to_string_lossy().into_owned();
        if !directory.ends_with('/') {
            directory.push('/');
        }
        let imageset = counts
            .into_iter()
            .filter(|(_, count)| **count > 0)
            .map(|(prefix, &count)| Imageset {
                id: prefix.clone(),
                filtering,
                images: vec![ImageRange {
                    directory: directory.clone(),
                    file_pattern: format!("{prefix}-{{}}.{TILE_EXTENSION}"),
                    file_range: [0, count - 1],
                }],
            })
            .collect();
        return Self { imageset };
    }

    /// Imageset for the tiles of a single region rename
    pub fn for_region(dir: &Path, prefix: &str, renamed: usize, filtering: bool) -> Self {
        let count = u32::try_from(renamed).unwrap_or(u32::MAX);
        return Self::from_counts(dir, [(&prefix.to_owned(), &count)], filtering);
    }

    pub fn from_summary(dir: &Path, summary: &RenameSummary, filtering: bool) -> Self {
        return Self::from_counts(dir, &summary.counts, filtering);
    }

    pub fn to_toml(&self) -> Result<String> {
        return Ok(toml::to_string(self)?);
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_toml()?).map_err(TilesetError::io(path))?;
        log::info!("wrote imageset manifest {}", path.display());
        return Ok(());
    }
}
