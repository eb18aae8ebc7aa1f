use std::{
    fs,
    path::{Path, PathBuf},
};

use derive_more::Deref;

use crate::{
    error::{Result, TilesetError},
    grid::TileIndex,
};

pub const TILE_EXTENSION: &str = "png";

/// Whether `path` would be picked up by a `*.png` listing. Case sensitive,
/// hidden files are left out.
pub fn is_png(path: &Path) -> bool {
    let visible = path
        .file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| !name.starts_with('.'));
    return visible && path.extension().map_or(false, |ext| ext == TILE_EXTENSION);
}

/// Whether the base name of `path` is a bare base-10 integer, of any size, with
/// an optional leading `+`
pub fn is_numeric_name(path: &Path) -> bool {
    let stem = match path.file_stem().and_then(|stem| stem.to_str()) {
        Some(stem) => stem,
        None => return false,
    };
    let digits = stem.strip_prefix('+').unwrap_or(stem);
    return !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit());
}

/// The tile index a file still carries in its name. `None` for non-numeric
/// names and for numbers too large to be a tile index.
pub fn tile_index(path: &Path) -> Option<TileIndex> {
    if !is_numeric_name(path) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    return stem.parse::<u32>().ok().map(TileIndex);
}

/// All `*.png` files directly inside `dir`, sorted by file name
pub fn png_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(TilesetError::io(dir))? {
        let entry = entry.map_err(TilesetError::io(dir))?;
        let path = entry.path();
        if !is_png(&path) {
            continue;
        }
        if entry.file_type().map_err(TilesetError::io(&path))?.is_dir() {
            continue;
        }
        files.push(path);
    }
    files.sort();
    return Ok(files);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub index: TileIndex,
    pub path: PathBuf,
}

/// Files whose names are still a bare tile index, ordered by index.
///
/// Renamed files drop out of the set as soon as their name stops parsing as
/// an index, so rescanning a directory after a rename pass yields exactly the
/// tiles that were not matched yet. Numeric names too large to place on the
/// grid are kept apart: no region can match them, but they are still raw tiles.
#[derive(Debug, Default, Clone, Deref)]
pub struct CandidateSet {
    #[deref]
    candidates: Vec<Candidate>,
    unplaceable: Vec<PathBuf>,
}

impl CandidateSet {
    pub fn scan(dir: &Path) -> Result<Self> {
        let set = Self::from_paths(png_files(dir)?);
        log::debug!("{} candidate tiles in {}", set.len(), dir.display());
        return Ok(set);
    }

    pub fn from_paths<I: IntoIterator<Item = PathBuf>>(paths: I) -> Self {
        let mut set = Self::default();
        for path in paths.into_iter().filter(|path| is_png(path)) {
            match tile_index(&path) {
                Some(index) => set.candidates.push(Candidate { index, path }),
                None if is_numeric_name(&path) => {
                    log::warn!("{} is too large to locate on the grid", path.display());
                    set.unplaceable.push(path);
                }
                None => log::trace!("skipping {}: not a tile index", path.display()),
            }
        }
        set.candidates
            .sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.path.cmp(&b.path)));
        set.unplaceable.sort();
        return set;
    }

    /// Numeric names that no region can match
    pub fn unplaceable(&self) -> &[PathBuf] {
        return &self.unplaceable;
    }

    pub fn remove(&mut self, path: &Path) {
        self.candidates.retain(|candidate| candidate.path != path);
    }

    /// Every raw tile file of the set, placeable or not
    pub fn into_paths(self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.candidates.into_iter().map(|candidate| candidate.path).collect();
        paths.extend(self.unplaceable);
        return paths;
    }
}
