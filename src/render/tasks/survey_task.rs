//! # Survey Task
//!
//! This module defines the `SurveyTask`, which assembles the neighborhood of one
//! block on a worker thread, extracts its visible faces and counts its nodes.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use crate::render::neighborhood::BlockNeighborhood;
use crate::render::surface::visible_faces;
use crate::spatial::BlockPos;
use crate::task_management::{Task, TaskResult};
use crate::world::World;

use super::{BlockSurvey, SurveyReport};

/// Neighbor cells in a neighborhood, excluding the center.
const NEIGHBOR_COUNT: usize = 26;

/// A task that surveys a single block.
pub struct SurveyTask {
    /// The shared world accessor
    world: Arc<World>,
    /// The block to survey
    pos: BlockPos,
}

impl SurveyTask {
    /// Creates a survey task for the block at `pos`.
    pub fn new(world: Arc<World>, pos: BlockPos) -> Self {
        SurveyTask { world, pos }
    }

    /// Performs the survey on the current thread.
    ///
    /// Returns `None` when the block itself is not available.
    pub fn survey(&self) -> Option<BlockSurvey> {
        let neighborhood = BlockNeighborhood::assemble(&self.world, self.pos);
        let center = neighborhood.center()?;

        let mut node_counts = BTreeMap::new();
        for (_, node) in center.nodes() {
            *node_counts
                .entry(center.resolve_name(node.id).to_string())
                .or_insert(0) += 1;
        }

        let faces = visible_faces(&neighborhood);
        let absent_neighbors = NEIGHBOR_COUNT + 1 - neighborhood.present_count();
        debug!(
            "Surveyed block {}: {} visible faces, {} absent neighbors",
            self.pos,
            faces.len(),
            absent_neighbors
        );

        Some(BlockSurvey {
            pos: self.pos,
            visible_faces: faces.len(),
            absent_neighbors,
            node_counts,
        })
    }
}

impl Task for SurveyTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        Box::new(SurveyTaskResult {
            pos: self.pos,
            survey: self.survey(),
        })
    }
}

/// The result of a survey task.
pub struct SurveyTaskResult {
    pos: BlockPos,
    survey: Option<BlockSurvey>,
}

impl TaskResult for SurveyTaskResult {
    fn handle_result(self: Box<Self>, report: &mut SurveyReport) -> Vec<Box<dyn Task + Send>> {
        match self.survey {
            Some(survey) => report.record(survey),
            None => report.record_empty(self.pos),
        }
        Vec::new()
    }
}
