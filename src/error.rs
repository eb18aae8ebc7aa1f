use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TilesetError>;

#[derive(Error, Debug)]
pub enum TilesetError {
    #[error("tiles in row must be positive")]
    ZeroRowWidth,

    #[error("tile size must be positive, got {width}x{height}")]
    ZeroTileSize { width: u32, height: u32 },

    #[error("tile numbering for {0} ran past the largest tile number")]
    CounterOverflow(String),

    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("{}: {source}", path.display())]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("invalid region list: {0}")]
    Regions(#[from] serde_json::Error),

    #[error("could not serialize imageset manifest: {0}")]
    Manifest(#[from] toml::ser::Error),
}

impl TilesetError {
    /// Wraps an io error with the path it happened on, for use with `map_err`.
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        return move |source| Self::Io { path, source };
    }

    pub(crate) fn image(path: &Path) -> impl FnOnce(image::ImageError) -> Self {
        let path = path.to_path_buf();
        return move |source| Self::Image { path, source };
    }
}
