use std::{fs, path::Path};

use glam::UVec2;
use image::{imageops, GenericImageView, ImageFormat, RgbaImage};

use crate::{
    candidate,
    error::{Result, TilesetError},
    Grid, TraversalOrder,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceConfig {
    tile_size: UVec2,
    /// Write fully transparent tiles too
    pub keep_empty: bool,
    pub order: TraversalOrder,
}

impl SliceConfig {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TilesetError::ZeroTileSize { width, height });
        }
        return Ok(Self {
            tile_size: UVec2::new(width, height),
            keep_empty: true,
            order: TraversalOrder::default(),
        });
    }

    /// Width and height of one tile in pixels, never zero
    pub fn tile_size(&self) -> UVec2 {
        return self.tile_size;
    }

    pub fn with_keep_empty(mut self, keep_empty: bool) -> Self {
        self.keep_empty = keep_empty;
        return self;
    }

    pub fn with_order(mut self, order: TraversalOrder) -> Self {
        self.order = order;
        return self;
    }
}

/// Reads the optional `keep_empty` argument of the slicer: absent or `keep`
/// keeps empty tiles, any other token drops them
pub fn keep_empty_token(token: Option<&str>) -> bool {
    return token.map_or(true, |token| token == "keep");
}

/// Top left pixel of every whole tile in an image of `image_dims`
pub fn tile_locs<U: Into<UVec2>>(image_dims: U, config: &SliceConfig) -> Vec<UVec2> {
    let tile_size = config.tile_size();
    return Grid::whole_tiles(image_dims.into(), tile_size)
        .iter_locs(config.order)
        .map(|cell| cell * tile_size)
        .collect();
}

pub fn is_fully_transparent(tile: &RgbaImage) -> bool {
    return tile.pixels().all(|pixel| pixel[3] == 0);
}

fn tile_at(image: &RgbaImage, loc: UVec2, tile_size: UVec2) -> RgbaImage {
    let mut canvas = RgbaImage::new(tile_size.x, tile_size.y);
    let piece = image.view(loc.x, loc.y, tile_size.x, tile_size.y).to_image();
    imageops::replace(&mut canvas, &piece, 0, 0);
    return canvas;
}

/// The tiles of `image` that would be written, in output order
pub fn tiles<'a>(image: &'a RgbaImage, config: &'a SliceConfig) -> impl Iterator<Item = RgbaImage> + 'a {
    return tile_locs(image.dimensions(), config)
        .into_iter()
        .map(move |loc| tile_at(image, loc, config.tile_size()))
        .filter(move |tile| config.keep_empty || !is_fully_transparent(tile));
}

pub fn slice_image(image: &RgbaImage, config: &SliceConfig) -> Vec<RgbaImage> {
    return tiles(image, config).collect();
}

/// Writes the tiles of the image at `src` to `dst_dir` as `<n>.png`, `n`
/// counting up from `first_n`. Returns the number after the last written tile.
pub fn slice_file(src: &Path, dst_dir: &Path, config: &SliceConfig, first_n: u32) -> Result<u32> {
    let image = image::open(src).map_err(TilesetError::image(src))?.to_rgba8();
    let (width, height) = image.dimensions();
    log::info!(
        "Splitting image \"{}\" (width: {width} height: {height})",
        src.display()
    );

    let mut n = first_n;
    for tile in tiles(&image, config) {
        let next = n
            .checked_add(1)
            .ok_or_else(|| TilesetError::CounterOverflow(dst_dir.display().to_string()))?;
        let path = dst_dir.join(format!("{n}.{}", candidate::TILE_EXTENSION));
        tile.save_with_format(&path, ImageFormat::Png)
            .map_err(TilesetError::image(&path))?;
        log::trace!("wrote {}", path.display());
        n = next;
    }
    log::debug!("{} tiles written from {}", n - first_n, src.display());
    return Ok(n);
}

/// Slices a single image, or every `*.png` of a directory in file name order,
/// continuing the tile numbering from one image to the next
pub fn slice_path(src: &Path, dst_dir: &Path, config: &SliceConfig, first_n: u32) -> Result<u32> {
    fs::create_dir_all(dst_dir).map_err(TilesetError::io(dst_dir))?;
    let sources = if src.is_dir() {
        candidate::png_files(src)?
    } else {
        vec![src.to_path_buf()]
    };
    let mut n = first_n;
    for source in &sources {
        n = slice_file(source, dst_dir, config, n)?;
    }
    return Ok(n);
}

#[cfg(test)]
mod test {
    use image::Rgba;

    use super::*;

    const OPAQUE: Rgba<u8> = Rgba([200, 40, 40, 255]);

    /// 2x2 tiles of 4px where only the top right tile has any visible pixel
    fn one_visible_tile() -> RgbaImage {
        let mut image = RgbaImage::new(8, 8);
        image.put_pixel(6, 1, OPAQUE);
        image
    }

    fn config(width: u32, height: u32) -> SliceConfig {
        SliceConfig::new(width, height).unwrap()
    }

    #[test]
    fn zero_tile_size_is_rejected() {
        assert!(matches!(
            SliceConfig::new(0, 16),
            Err(TilesetError::ZeroTileSize { width: 0, height: 16 })
        ));
    }

    #[test]
    fn locs_follow_order() {
        let row = config(4, 4);
        let column = row.with_order(TraversalOrder::ColumnMajor);
        assert_eq!(
            tile_locs(UVec2::splat(8), &row),
            vec![UVec2::new(0, 0), UVec2::new(4, 0), UVec2::new(0, 4), UVec2::new(4, 4)]
        );
        assert_eq!(
            tile_locs(UVec2::splat(8), &column),
            vec![UVec2::new(0, 0), UVec2::new(0, 4), UVec2::new(4, 0), UVec2::new(4, 4)]
        );
    }

    #[test]
    fn remainder_pixels_are_dropped() {
        let locs = tile_locs(UVec2::new(70, 40), &config(32, 16));
        assert_eq!(locs.len(), 2 * 2);
        assert!(locs.iter().all(|loc| loc.x + 32 <= 70 && loc.y + 16 <= 40));
    }

    #[test]
    fn transparency_check() {
        let mut tile = RgbaImage::new(4, 4);
        assert!(is_fully_transparent(&tile));
        // colour without alpha still counts as empty
        tile.put_pixel(1, 1, Rgba([255, 255, 255, 0]));
        assert!(is_fully_transparent(&tile));
        tile.put_pixel(2, 2, Rgba([0, 0, 0, 1]));
        assert!(!is_fully_transparent(&tile));
    }

    #[test]
    fn keep_empty_keeps_every_tile() {
        let tiles = slice_image(&one_visible_tile(), &config(4, 4));
        assert_eq!(tiles.len(), 4);
        assert!(tiles.iter().all(|tile| tile.dimensions() == (4, 4)));
        assert_eq!(tiles[1].get_pixel(2, 1), &OPAQUE);
    }

    #[test]
    fn empty_tiles_are_dropped() {
        let tiles = slice_image(&one_visible_tile(), &config(4, 4).with_keep_empty(false));
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].get_pixel(2, 1), &OPAQUE);
    }

    #[test]
    fn tile_size_getter() {
        assert_eq!(config(32, 16).tile_size(), UVec2::new(32, 16));
    }

    #[test]
    fn counter_at_the_last_number_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("sheet.png");
        RgbaImage::from_pixel(8, 8, OPAQUE).save(&src).unwrap();
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();

        let result = slice_file(&src, &out, &config(8, 8), u32::MAX);

        assert!(matches!(result, Err(TilesetError::CounterOverflow(_))));
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
        // one number below the limit still writes its tile
        assert_eq!(slice_file(&src, &out, &config(8, 8), u32::MAX - 1).unwrap(), u32::MAX);
        assert!(out.join(format!("{}.png", u32::MAX - 1)).exists());
    }

    #[test]
    fn keep_empty_tokens() {
        assert!(keep_empty_token(None));
        assert!(keep_empty_token(Some("keep")));
        assert!(!keep_empty_token(Some("drop")));
        assert!(!keep_empty_token(Some("KEEP")));
    }
}
