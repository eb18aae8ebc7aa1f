use std::{fmt, num::NonZeroU32};

use derive_more::{Deref, From};
use glam::UVec2;
use serde::Deserialize;

use crate::error::{Result, TilesetError};

/// Column (x) and row (y) of a tile in the sheet grid
pub type GridCoordinate = UVec2;

/// Flat position of a tile in the sheet, as written in its file name
#[derive(Deref, From, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileIndex(pub u32);

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of tile columns per row of the sheet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowWidth(NonZeroU32);

impl RowWidth {
    pub fn new(tiles_in_row: u32) -> Result<Self> {
        return NonZeroU32::new(tiles_in_row)
            .map(Self)
            .ok_or(TilesetError::ZeroRowWidth);
    }

    pub fn get(&self) -> u32 {
        return self.0.get();
    }
}

pub fn locate(index: TileIndex, row_width: RowWidth) -> GridCoordinate {
    let width = row_width.get();
    let y = *index / width;
    let x = *index - y * width;
    return UVec2 { x, y };
}

/// A rectangle of grid cells whose tiles share one name prefix.
///
/// Both corners are inclusive. Deserializes from the `[prefix, x1, y1, x2, y2]`
/// tuples of the renamer's region list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RegionTuple")]
pub struct Region {
    pub prefix: String,
    pub top_left: GridCoordinate,
    pub bottom_right: GridCoordinate,
}

type RegionTuple = (String, u32, u32, u32, u32);

impl From<RegionTuple> for Region {
    fn from((prefix, x1, y1, x2, y2): RegionTuple) -> Self {
        return Self::new(prefix, UVec2::new(x1, y1), UVec2::new(x2, y2));
    }
}

impl Region {
    pub fn new(
        prefix: impl Into<String>,
        top_left: GridCoordinate,
        bottom_right: GridCoordinate,
    ) -> Self {
        return Self {
            prefix: prefix.into(),
            top_left,
            bottom_right,
        };
    }

    pub fn contains(&self, coord: GridCoordinate) -> bool {
        return coord.x >= self.top_left.x
            && coord.x <= self.bottom_right.x
            && coord.y >= self.top_left.y
            && coord.y <= self.bottom_right.y;
    }

    pub fn matches(&self, index: TileIndex, row_width: RowWidth) -> bool {
        return self.contains(locate(index, row_width));
    }

    /// A region whose corners are swapped on either axis contains no cell
    pub fn is_inverted(&self) -> bool {
        return self.top_left.x > self.bottom_right.x || self.top_left.y > self.bottom_right.y;
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' ({},{})..=({},{})",
            self.prefix, self.top_left.x, self.top_left.y, self.bottom_right.x, self.bottom_right.y
        )
    }
}

/// Parses a JSON array of `[prefix, x1, y1, x2, y2]` tuples
pub fn parse_regions(json: &str) -> Result<Vec<Region>> {
    let regions: Vec<Region> = serde_json::from_str(json)?;
    for region in regions.iter().filter(|region| region.is_inverted()) {
        log::warn!("region {region} has inverted corners and will match nothing");
    }
    return Ok(regions);
}

#[cfg(test)]
mod test {
    use super::*;

    fn width(n: u32) -> RowWidth {
        RowWidth::new(n).unwrap()
    }

    #[test]
    fn locate_round_trips() {
        for w in 1..=7 {
            let row_width = width(w);
            for i in 0..100 {
                let coord = locate(TileIndex(i), row_width);
                assert!(coord.x < w);
                assert_eq!(coord.y * w + coord.x, i);
            }
        }
    }

    #[test]
    fn locate_on_three_wide_grid() {
        let row_width = width(3);
        assert_eq!(locate(TileIndex(0), row_width), UVec2::new(0, 0));
        assert_eq!(locate(TileIndex(4), row_width), UVec2::new(1, 1));
        assert_eq!(locate(TileIndex(8), row_width), UVec2::new(2, 2));
    }

    #[test]
    fn zero_row_width_is_rejected() {
        assert!(matches!(RowWidth::new(0), Err(TilesetError::ZeroRowWidth)));
    }

    #[test]
    fn corners_are_inclusive() {
        let region = Region::new("grass", UVec2::new(1, 2), UVec2::new(3, 4));
        assert!(region.contains(UVec2::new(1, 2)));
        assert!(region.contains(UVec2::new(3, 4)));
        assert!(region.contains(UVec2::new(2, 3)));
        assert!(!region.contains(UVec2::new(0, 2)));
        assert!(!region.contains(UVec2::new(4, 4)));
        assert!(!region.contains(UVec2::new(3, 5)));
    }

    #[test]
    fn inverted_region_matches_nothing() {
        let region = Region::new("x", UVec2::new(2, 0), UVec2::new(0, 2));
        assert!(region.is_inverted());
        assert!((0..9).all(|i| !region.matches(TileIndex(i), width(3))));
    }

    #[test]
    fn regions_from_json() {
        let regions = parse_regions(r#"[["grass", 0, 0, 1, 1], ["water", 2, 0, 2, 2]]"#).unwrap();
        assert_eq!(
            regions,
            vec![
                Region::new("grass", UVec2::new(0, 0), UVec2::new(1, 1)),
                Region::new("water", UVec2::new(2, 0), UVec2::new(2, 2)),
            ]
        );
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            parse_regions(r#"[["grass", 0, 0, 1]]"#),
            Err(TilesetError::Regions(_))
        ));
        assert!(parse_regions(r#"[["grass", -1, 0, 1, 1]]"#).is_err());
    }
}
