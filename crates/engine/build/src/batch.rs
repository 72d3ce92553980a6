//! Voxel set → minimal ordered command script.
//!
//! Each command costs a network round trip, so the batcher folds dense
//! per-level footprints into single `fill` commands and only falls back to
//! per-cell `setblock` where a fill would touch unintended cells.

use crate::block::BlockType;
use crate::command::{BuildCommand, CommandScript};
use std::collections::{BTreeMap, HashSet};
use stratavox_geo::VoxelPoint;

/// One voxel together with the block to place there. The input set must
/// already be deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub pos: VoxelPoint,
    pub block: BlockType,
}

impl Placement {
    pub fn new(pos: VoxelPoint, block: BlockType) -> Self {
        Self { pos, block }
    }
}

/// Batching policy.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Prepend an air fill clearing the overall bounding box.
    pub clear: bool,
    /// Block used by the clearing pass.
    pub clear_block: BlockType,
    /// Completion marker appended as a `say` command.
    pub marker: Option<String>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            clear: true,
            clear_block: BlockType::air(),
            marker: Some("stratavox build complete".to_string()),
        }
    }
}

/// Folds a deduplicated voxel set into an ordered command script.
#[derive(Debug, Clone, Default)]
pub struct CommandBatcher {
    options: BatchOptions,
}

impl CommandBatcher {
    pub fn new(options: BatchOptions) -> Self {
        Self { options }
    }

    /// Groups placements by height level and block type, emitting one `fill`
    /// per dense rectangular footprint and `setblock` otherwise. Levels are
    /// ordered bottom-up; the clearing pass covers only the box actually
    /// used, never the full world.
    pub fn batch(&self, placements: &[Placement]) -> CommandScript {
        let mut script = CommandScript::new();
        if placements.is_empty() {
            return script;
        }

        let mut groups: BTreeMap<(i64, &BlockType), Vec<VoxelPoint>> = BTreeMap::new();
        for placement in placements {
            groups
                .entry((placement.pos.y, &placement.block))
                .or_default()
                .push(placement.pos);
        }

        if self.options.clear {
            let (min, max) = bounding_box(placements.iter().map(|p| p.pos));
            // Building over uncleared terrain produces misleading geometry,
            // so a failed clear aborts the script.
            script.push_critical(BuildCommand::Fill {
                min,
                max,
                block: self.options.clear_block.clone(),
            });
        }

        let mut fills = 0usize;
        let mut set_blocks = 0usize;
        for (&(y, block), points) in &groups {
            let footprint: HashSet<(i64, i64)> = points.iter().map(|p| (p.x, p.z)).collect();
            let (min, max) = bounding_box(points.iter().copied());
            let area = (max.x - min.x + 1) * (max.z - min.z + 1);

            if footprint.len() as i64 == area {
                script.push(BuildCommand::Fill {
                    min: VoxelPoint::new(min.x, y, min.z),
                    max: VoxelPoint::new(max.x, y, max.z),
                    block: block.clone(),
                });
                fills += 1;
            } else {
                for point in points {
                    script.push(BuildCommand::SetBlock {
                        pos: *point,
                        block: block.clone(),
                    });
                    set_blocks += 1;
                }
            }
        }

        if let Some(marker) = &self.options.marker {
            script.push(BuildCommand::Raw(format!("say {marker}")));
        }

        tracing::debug!(
            "batched {} placements into {} commands ({} fills, {} setblocks)",
            placements.len(),
            script.len(),
            fills,
            set_blocks
        );
        script
    }
}

fn bounding_box(points: impl Iterator<Item = VoxelPoint>) -> (VoxelPoint, VoxelPoint) {
    let mut min = VoxelPoint::new(i64::MAX, i64::MAX, i64::MAX);
    let mut max = VoxelPoint::new(i64::MIN, i64::MIN, i64::MIN);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        min.z = min.z.min(p.z);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        max.z = max.z.max(p.z);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stone() -> BlockType {
        BlockType::new("stone").unwrap()
    }

    fn no_frills() -> CommandBatcher {
        CommandBatcher::new(BatchOptions {
            clear: false,
            marker: None,
            ..BatchOptions::default()
        })
    }

    fn layer(y: i64, xs: std::ops::RangeInclusive<i64>, zs: std::ops::RangeInclusive<i64>) -> Vec<Placement> {
        let mut out = Vec::new();
        for x in xs {
            for z in zs.clone() {
                out.push(Placement::new(VoxelPoint::new(x, y, z), stone()));
            }
        }
        out
    }

    #[test]
    fn test_dense_level_collapses_to_single_fill() {
        let script = no_frills().batch(&layer(64, 0..=4, 0..=4));
        assert_eq!(script.len(), 1);
        assert_eq!(script.commands()[0].command.to_text(), "fill 0 64 0 4 64 4 stone");
    }

    #[test]
    fn test_sparse_level_falls_back_to_setblock() {
        // L-shape: bounding rectangle contains cells we never placed.
        let mut placements = layer(64, 0..=3, 0..=0);
        placements.extend(layer(64, 0..=0, 1..=3));
        let script = no_frills().batch(&placements);

        assert_eq!(script.len(), placements.len());
        for cmd in &script {
            assert!(cmd.command.to_text().starts_with("setblock"));
        }
    }

    #[test]
    fn test_fill_never_covers_unplaced_cells() {
        let mut placements = layer(70, 0..=9, 0..=9);
        placements.remove(37);
        let script = no_frills().batch(&placements);
        // One missing cell breaks density for the whole level.
        assert!(script
            .commands()
            .iter()
            .all(|c| c.command.to_text().starts_with("setblock")));
    }

    #[test]
    fn test_mixed_blocks_on_one_level_are_split() {
        let mut placements = layer(64, 0..=1, 0..=1);
        placements.push(Placement::new(
            VoxelPoint::new(5, 64, 5),
            BlockType::new("gold_block").unwrap(),
        ));
        let script = no_frills().batch(&placements);
        // Dense stone square plus one gold setblock-or-fill (a single cell is
        // a dense 1x1 footprint, so it also becomes a fill).
        assert_eq!(script.len(), 2);
    }

    #[test]
    fn test_levels_are_ordered_bottom_up() {
        let mut placements = layer(80, 0..=1, 0..=1);
        placements.extend(layer(60, 0..=1, 0..=1));
        placements.extend(layer(70, 0..=1, 0..=1));
        let script = no_frills().batch(&placements);

        let heights: Vec<i64> = script
            .commands()
            .iter()
            .filter_map(|c| match &c.command {
                BuildCommand::Fill { min, .. } => Some(min.y),
                BuildCommand::SetBlock { pos, .. } => Some(pos.y),
                BuildCommand::Raw(_) => None,
            })
            .collect();
        assert_eq!(heights, vec![60, 70, 80]);
    }

    #[test]
    fn test_clear_pass_covers_used_box_and_is_critical() {
        let mut placements = layer(60, 0..=2, 0..=2);
        placements.extend(layer(62, 0..=2, 0..=2));
        let batcher = CommandBatcher::new(BatchOptions {
            marker: None,
            ..BatchOptions::default()
        });
        let script = batcher.batch(&placements);

        let clear = &script.commands()[0];
        assert!(clear.critical);
        assert_eq!(clear.command.to_text(), "fill 0 60 0 2 62 2 air");
    }

    #[test]
    fn test_marker_is_appended_last() {
        let batcher = CommandBatcher::new(BatchOptions {
            clear: false,
            marker: Some("done".to_string()),
            ..BatchOptions::default()
        });
        let script = batcher.batch(&layer(64, 0..=0, 0..=0));
        let last = script.commands().last().unwrap();
        assert_eq!(last.command.to_text(), "say done");
    }

    #[test]
    fn test_empty_input_produces_empty_script() {
        let script = CommandBatcher::default().batch(&[]);
        assert!(script.is_empty());
    }
}
