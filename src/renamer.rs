use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use derive_more::Deref;

use crate::{
    candidate::CandidateSet,
    error::{Result, TilesetError},
    grid::{Region, RowWidth},
};

/// Next sequence number per prefix. A prefix's first match gets 0.
#[derive(Debug, Default, Clone, Deref)]
pub struct Counters(BTreeMap<String, u32>);

impl Counters {
    pub fn new() -> Self {
        return Self::default();
    }

    /// Number of tiles matched so far for `prefix`, which is also the number
    /// the next match will get
    pub fn peek(&self, prefix: &str) -> u32 {
        return self.0.get(prefix).copied().unwrap_or(0);
    }

    fn register(&mut self, prefix: &str) {
        self.0.entry(prefix.to_owned()).or_insert(0);
    }

    fn take(&mut self, prefix: &str) -> Result<u32> {
        let next = self.0.entry(prefix.to_owned()).or_insert(0);
        let current = *next;
        *next = current
            .checked_add(1)
            .ok_or_else(|| TilesetError::CounterOverflow(format!("prefix '{prefix}'")))?;
        return Ok(current);
    }
}

/// What happens to a tile that lies inside more than one region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// The first region to match a tile claims it; later regions never see it
    #[default]
    FirstMatch,
    /// Every matching region gets its own copy of the tile
    EveryMatch,
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "first" => Ok(Self::FirstMatch),
            "every" => Ok(Self::EveryMatch),
            other => Err(format!("unknown overlap policy '{other}', expected 'first' or 'every'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOp {
    pub from: PathBuf,
    pub to: PathBuf,
    pub prefix: String,
    pub number: u32,
}

/// `<dir>/<prefix>-<n><suffix>`, keeping the original extension
pub fn target_path(from: &Path, prefix: &str, number: u32) -> PathBuf {
    let suffix = from
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let name = format!("{prefix}-{number}{suffix}");
    return match from.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    };
}

/// Renames for every candidate inside `region`, numbered from the prefix's
/// current counter
pub fn plan_region(
    candidates: &CandidateSet,
    region: &Region,
    row_width: RowWidth,
    counters: &mut Counters,
) -> Result<Vec<RenameOp>> {
    counters.register(&region.prefix);
    let mut ops = Vec::new();
    for candidate in candidates.iter().filter(|candidate| region.matches(candidate.index, row_width)) {
        let number = counters.take(&region.prefix)?;
        ops.push(RenameOp {
            from: candidate.path.clone(),
            to: target_path(&candidate.path, &region.prefix, number),
            prefix: region.prefix.clone(),
            number,
        });
    }
    log::debug!("region {region} matched {} tiles", ops.len());
    return Ok(ops);
}

/// The outcome of planning every region against one candidate set
#[derive(Debug, Clone)]
pub struct Plan {
    pub ops: Vec<RenameOp>,
    /// Raw tiles no region matched, removed by the cleanup pass
    pub leftovers: Vec<PathBuf>,
    pub counters: Counters,
}

pub fn plan_regions(
    mut candidates: CandidateSet,
    regions: &[Region],
    row_width: RowWidth,
    policy: OverlapPolicy,
) -> Result<Plan> {
    let mut counters = Counters::new();
    let mut ops = Vec::new();
    for region in regions {
        let region_ops = plan_region(&candidates, region, row_width, &mut counters)?;
        if policy == OverlapPolicy::FirstMatch {
            for op in &region_ops {
                candidates.remove(&op.from);
            }
        }
        ops.extend(region_ops);
    }
    let leftovers = candidates
        .into_paths()
        .into_iter()
        .filter(|path| !ops.iter().any(|op| &op.from == path))
        .collect();
    return Ok(Plan {
        ops,
        leftovers,
        counters,
    });
}

/// What `rename_regions` would do to `dir`, without touching it
pub fn preview(
    dir: &Path,
    row_width: RowWidth,
    regions: &[Region],
    policy: OverlapPolicy,
) -> Result<Plan> {
    return plan_regions(CandidateSet::scan(dir)?, regions, row_width, policy);
}

/// The renames `rename_region` would perform in `dir`, without touching it
pub fn preview_region(dir: &Path, region: &Region, row_width: RowWidth) -> Result<Vec<RenameOp>> {
    let candidates = CandidateSet::scan(dir)?;
    return plan_region(&candidates, region, row_width, &mut Counters::new());
}

/// Performs `ops` in order. A source that later ops still need is copied, its
/// last use renames it.
pub fn apply(ops: &[RenameOp]) -> Result<usize> {
    let last_use: HashMap<&Path, usize> = ops
        .iter()
        .enumerate()
        .map(|(i, op)| (op.from.as_path(), i))
        .collect();
    for (i, op) in ops.iter().enumerate() {
        if last_use[op.from.as_path()] == i {
            log::trace!("rename {} -> {}", op.from.display(), op.to.display());
            fs::rename(&op.from, &op.to).map_err(TilesetError::io(&op.from))?;
        } else {
            log::trace!("copy {} -> {}", op.from.display(), op.to.display());
            fs::copy(&op.from, &op.to).map_err(TilesetError::io(&op.from))?;
        }
    }
    return Ok(ops.len());
}

/// Renames the tiles of `dir` inside `region` to `<prefix>-<n>.png`, `n`
/// starting at 0. Returns the number of renamed files.
pub fn rename_region(dir: &Path, region: &Region, row_width: RowWidth) -> Result<usize> {
    let candidates = CandidateSet::scan(dir)?;
    let ops = plan_region(&candidates, region, row_width, &mut Counters::new())?;
    return apply(&ops);
}

/// Deletes every `*.png` in `dir` that still has a bare tile index name
pub fn remove_leftovers(dir: &Path) -> Result<usize> {
    let leftovers = CandidateSet::scan(dir)?.into_paths();
    for path in &leftovers {
        log::trace!("delete {}", path.display());
        fs::remove_file(path).map_err(TilesetError::io(path))?;
    }
    return Ok(leftovers.len());
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameSummary {
    /// Tiles matched per prefix, ordered by prefix
    pub counts: BTreeMap<String, u32>,
    pub renamed: usize,
    pub deleted: usize,
}

/// Applies each region in order, numbering per prefix across the whole run,
/// then deletes the tiles no region matched.
pub fn rename_regions(
    dir: &Path,
    row_width: RowWidth,
    regions: &[Region],
    policy: OverlapPolicy,
) -> Result<RenameSummary> {
    let mut counters = Counters::new();
    let mut renamed = 0;
    match policy {
        OverlapPolicy::FirstMatch => {
            for region in regions {
                log::info!("renaming region {region}");
                let candidates = CandidateSet::scan(dir)?;
                let ops = plan_region(&candidates, region, row_width, &mut counters)?;
                renamed += apply(&ops)?;
            }
        }
        OverlapPolicy::EveryMatch => {
            let plan = plan_regions(CandidateSet::scan(dir)?, regions, row_width, policy)?;
            renamed += apply(&plan.ops)?;
            counters = plan.counters;
        }
    }
    let deleted = remove_leftovers(dir)?;
    return Ok(RenameSummary {
        counts: counters.0,
        renamed,
        deleted,
    });
}

#[cfg(test)]
mod test {
    use glam::UVec2;

    use super::*;

    fn sheet(n: u32) -> CandidateSet {
        CandidateSet::from_paths((0..n).map(|i| PathBuf::from(format!("tiles/{i}.png"))))
    }

    fn paths(indices: &[u32]) -> Vec<PathBuf> {
        indices.iter().map(|i| PathBuf::from(format!("tiles/{i}.png"))).collect()
    }

    fn grass() -> Region {
        Region::new("grass", UVec2::new(0, 0), UVec2::new(1, 1))
    }

    fn names(ops: &[RenameOp]) -> Vec<(String, String)> {
        ops.iter()
            .map(|op| {
                let name = |p: &Path| p.file_name().unwrap().to_string_lossy().into_owned();
                (name(&op.from), name(&op.to))
            })
            .collect()
    }

    #[test]
    fn target_keeps_directory_and_suffix() {
        assert_eq!(
            target_path(Path::new("tiles/4.png"), "grass", 3),
            PathBuf::from("tiles/grass-3.png")
        );
        assert_eq!(target_path(Path::new("4"), "grass", 0), PathBuf::from("grass-0"));
    }

    #[test]
    fn region_numbering_starts_at_zero() {
        let mut counters = Counters::new();
        let ops = plan_region(&sheet(9), &grass(), RowWidth::new(3).unwrap(), &mut counters).unwrap();
        assert_eq!(
            names(&ops),
            vec![
                ("0.png".into(), "grass-0.png".into()),
                ("1.png".into(), "grass-1.png".into()),
                ("3.png".into(), "grass-2.png".into()),
                ("4.png".into(), "grass-3.png".into()),
            ]
        );
        assert_eq!(counters.peek("grass"), 4);
    }

    #[test]
    fn shared_prefix_continues_numbering() {
        let regions = [
            grass(),
            Region::new("water", UVec2::new(2, 0), UVec2::new(2, 0)),
            Region::new("grass", UVec2::new(0, 2), UVec2::new(0, 2)),
        ];
        let plan = plan_regions(sheet(9), &regions, RowWidth::new(3).unwrap(), OverlapPolicy::FirstMatch).unwrap();
        let last = plan.ops.last().unwrap();
        assert_eq!(last.from, PathBuf::from("tiles/6.png"));
        assert_eq!(last.number, 4);
        assert_eq!(plan.counters.peek("water"), 1);
        assert_eq!(plan.leftovers, paths(&[5, 7, 8]));
    }

    #[test]
    fn first_match_claims_overlapping_tiles() {
        let regions = [grass(), Region::new("edge", UVec2::new(1, 1), UVec2::new(2, 2))];
        let plan = plan_regions(sheet(9), &regions, RowWidth::new(3).unwrap(), OverlapPolicy::FirstMatch).unwrap();
        let edge: Vec<&Path> = plan
            .ops
            .iter()
            .filter(|op| op.prefix == "edge")
            .map(|op| op.from.as_path())
            .collect();
        assert!(!edge.contains(&Path::new("tiles/4.png")));
        assert_eq!(edge.len(), 3);
    }

    #[test]
    fn every_match_shares_overlapping_tiles() {
        let regions = [grass(), Region::new("edge", UVec2::new(1, 1), UVec2::new(2, 2))];
        let plan = plan_regions(sheet(9), &regions, RowWidth::new(3).unwrap(), OverlapPolicy::EveryMatch).unwrap();
        let shared: Vec<&RenameOp> = plan
            .ops
            .iter()
            .filter(|op| op.from == Path::new("tiles/4.png"))
            .collect();
        assert_eq!(shared.len(), 2);
        assert_eq!(plan.counters.peek("edge"), 4);
        assert_eq!(plan.leftovers, paths(&[2, 6]));
    }

    #[test]
    fn unmatched_prefix_is_counted_as_zero() {
        let regions = [Region::new("void", UVec2::new(5, 5), UVec2::new(6, 6))];
        let plan = plan_regions(sheet(9), &regions, RowWidth::new(3).unwrap(), OverlapPolicy::FirstMatch).unwrap();
        assert!(plan.ops.is_empty());
        assert_eq!(plan.counters.get("void"), Some(&0));
        assert_eq!(plan.leftovers.len(), 9);
    }

    #[test]
    fn exhausted_counter_is_an_error() {
        let mut counters = Counters(BTreeMap::from([("grass".to_string(), u32::MAX)]));
        let result = plan_region(&sheet(9), &grass(), RowWidth::new(3).unwrap(), &mut counters);
        assert!(matches!(result, Err(TilesetError::CounterOverflow(_))));
        assert_eq!(counters.peek("grass"), u32::MAX);
    }

    #[test]
    fn unplaceable_tiles_are_leftovers() {
        let candidates = CandidateSet::from_paths(
            ["tiles/0.png", "tiles/4294967296.png"].into_iter().map(PathBuf::from),
        );
        let regions = [Region::new("g", UVec2::ZERO, UVec2::ZERO)];
        let plan = plan_regions(candidates, &regions, RowWidth::new(3).unwrap(), OverlapPolicy::FirstMatch).unwrap();
        assert_eq!(plan.ops.len(), 1);
        assert_eq!(plan.leftovers, vec![PathBuf::from("tiles/4294967296.png")]);
    }

    #[test]
    fn overlap_policy_from_str() {
        assert_eq!("first".parse(), Ok(OverlapPolicy::FirstMatch));
        assert_eq!("every".parse(), Ok(OverlapPolicy::EveryMatch));
        assert!("all".parse::<OverlapPolicy>().is_err());
    }
}
