//! # Render Module
//!
//! The consumers of decoded blocks: neighborhood assembly, visible surface
//! extraction and the survey tasks that run both over many blocks.
//!
//! ## Pipeline
//!
//! 1. A [`BlockNeighborhood`] is assembled around a center block from the world
//! 2. [`visible_faces`] walks the center block and keeps faces bordering transparent
//!    nodes, looking into neighbor blocks at the boundary
//! 3. A [`SurveyTask`](tasks::SurveyTask) does both on a worker thread and reports
//!    the result

pub mod block_side;
pub mod neighborhood;
pub mod surface;
pub mod tasks;

pub use block_side::BlockSide;
pub use neighborhood::{BlockNeighborhood, NeighborhoodError, ResolvedNode, AIR_NAME};
pub use surface::{is_transparent, visible_faces, VisibleFace};
