//! # Survey Tasks
//!
//! Tasks that inspect blocks on worker threads, and the report their results are
//! collected into.

pub mod survey_task;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::spatial::BlockPos;
use crate::world::FetchStats;

pub use survey_task::{SurveyTask, SurveyTaskResult};

/// What one surveyed block looks like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSurvey {
    /// Position of the surveyed block
    pub pos: BlockPos,
    /// Faces of the block bordering transparent nodes
    pub visible_faces: usize,
    /// Neighbor cells that could not be filled
    pub absent_neighbors: usize,
    /// Node count per global name, unmapped IDs under the empty name
    pub node_counts: BTreeMap<String, usize>,
}

/// Counts of loaded media, reported when a media directory is configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MediaSummary {
    /// Images decoded
    pub images: usize,
    /// Meshes parsed
    pub meshes: usize,
}

/// The aggregate of a survey run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SurveyReport {
    /// Per-block results, sorted by position once finished
    pub blocks: Vec<BlockSurvey>,
    /// Positions requested but holding no usable block
    pub empty_blocks: Vec<BlockPos>,
    /// Sum of visible faces over all blocks
    pub total_visible_faces: usize,
    /// Sum of node counts over all blocks
    pub node_totals: BTreeMap<String, usize>,
    /// Tasks whose worker stopped before answering
    pub lost_tasks: usize,
    /// Accessor counters at the end of the run
    pub fetch: FetchStats,
    /// Loaded media, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaSummary>,
}

impl SurveyReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one block's survey to the totals.
    pub fn record(&mut self, survey: BlockSurvey) {
        self.total_visible_faces += survey.visible_faces;
        for (name, count) in &survey.node_counts {
            *self.node_totals.entry(name.clone()).or_insert(0) += count;
        }
        self.blocks.push(survey);
    }

    /// Notes a requested position that had no usable block.
    pub fn record_empty(&mut self, pos: BlockPos) {
        self.empty_blocks.push(pos);
    }

    /// Sorts the per-block lists and attaches the accessor counters.
    ///
    /// Workers finish in any order; sorting makes reports of the same world
    /// identical.
    pub fn finish(&mut self, fetch: FetchStats) {
        self.blocks.sort_by_key(|survey| survey.pos);
        self.empty_blocks.sort();
        self.fetch = fetch;
    }

    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey(x: i32, faces: usize, stone: usize) -> BlockSurvey {
        BlockSurvey {
            pos: BlockPos::new(x, 0, 0),
            visible_faces: faces,
            absent_neighbors: 0,
            node_counts: BTreeMap::from([("default:stone".to_string(), stone)]),
        }
    }

    #[test]
    fn record_accumulates_totals() {
        let mut report = SurveyReport::new();
        report.record(survey(1, 10, 100));
        report.record(survey(0, 5, 50));
        report.record_empty(BlockPos::new(3, 0, 0));
        report.record_empty(BlockPos::new(2, 0, 0));
        report.finish(FetchStats::default());

        assert_eq!(report.total_visible_faces, 15);
        assert_eq!(report.node_totals["default:stone"], 150);
        assert_eq!(report.blocks[0].pos, BlockPos::new(0, 0, 0));
        assert_eq!(
            report.empty_blocks,
            vec![BlockPos::new(2, 0, 0), BlockPos::new(3, 0, 0)]
        );
    }

    #[test]
    fn serializes_positions_as_arrays() {
        let mut report = SurveyReport::new();
        report.record(survey(-1, 1, 1));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["blocks"][0]["pos"], serde_json::json!([-1, 0, 0]));
        assert_eq!(json["fetch"]["present"], 0);
        assert!(json.get("media").is_none());
    }
}
