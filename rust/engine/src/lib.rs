// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Opening-Lite Engine
//!
//! Finds where cable trays and conduits of a host model cross walls of
//! linked architectural models, merges nearby crossings into one
//! rectangular opening per group and reconciles the result with the
//! openings already placed in the host model.
//!
//! The pipeline runs in four stages:
//!
//! 1. [`wall_frame`] derives an orthonormal (U, V, N) frame per linked wall,
//!    in host coordinates.
//! 2. [`projector`] intersects each straight run with each wall's mid-plane
//!    and projects a skew-enlarged footprint into the wall's UV space.
//! 3. [`cluster`] merges footprints closer than the cluster gap until no
//!    two groups on a wall are within the gap.
//! 4. [`reconcile`] matches groups to existing openings and plans creates
//!    and updates.
//!
//! Host documents are reached through [`DocumentSource`] and
//! [`OpeningWriter`]; [`MemoryDocument`] implements both over a JSON
//! snapshot.
//!
//! ```no_run
//! use opening_lite_engine::{CancelToken, EngineConfig, MemoryDocument, OpeningEngine};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut doc = MemoryDocument::from_json(&std::fs::read_to_string("model.json")?)?;
//! let engine = OpeningEngine::new(EngineConfig::from_env());
//! let report = engine.apply(&mut doc, &CancelToken::new())?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod classify;
pub mod cluster;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod face;
pub mod memory;
pub mod projector;
pub mod reconcile;
pub mod report;
pub mod synthetic;
pub mod wall_frame;

pub use cancel::CancelToken;
pub use classify::{CategoryClassifier, RunClassifier, RunKind};
pub use cluster::Cluster;
pub use config::{mm, to_mm, EngineConfig};
pub use document::{
    CrossSection, DocumentSource, ElementId, FaceRef, HostFaceRef, LinkedSource, MepRun,
    OpeningFamily, OpeningFlags, OpeningMetadata, OpeningPlacement, OpeningRecord, OpeningWriter,
    PlanarFace, RunGeometry, SourceId, SourceWall, WallKey, WallLocation,
};
pub use engine::{OpeningEngine, RunPlan};
pub use error::{DocumentError, Error, Result, WriteError};
pub use face::{FaceProjector, PlanarFaceProjector};
pub use memory::{Level, MemoryDocument};
pub use reconcile::{FailedWrite, MissingOpening, RunMode, WriteTarget};
pub use report::{AuditReport, RunStats};
pub use wall_frame::WallFrame;
