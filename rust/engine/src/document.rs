// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Document model and collaborator interfaces.
//!
//! The engine never owns building data. Walls, MEP runs and placed openings
//! are read through [`DocumentSource`]; new and updated openings go through
//! [`OpeningWriter`]. All lengths are in metres, all coordinates in the
//! frame noted on each field.

use std::fmt;

use opening_lite_geometry::{Aabb3, Point3, RectUv, Transform3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{DocumentError, WriteError};

/// Identifier of a linked model instance in the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub i64);

/// Identifier of an element (wall, run or opening) inside its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub i64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite key of a wall: the linked source it lives in plus its id there.
///
/// This pair is the only link between an opening and its wall; it is stored
/// on the opening as metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WallKey {
    pub source: SourceId,
    pub wall: ElementId,
}

impl WallKey {
    pub fn new(source: SourceId, wall: ElementId) -> Self {
        Self { source, wall }
    }
}

impl fmt::Display for WallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}:W{}", self.source, self.wall)
    }
}

// ---------------------------------------------------------------------------
// Linked sources and walls (source-local coordinates)
// ---------------------------------------------------------------------------

/// A linked building model and the walls it contains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedSource {
    pub id: SourceId,
    #[serde(default)]
    pub name: String,
    /// Source-local space to host space.
    #[serde(default)]
    pub transform: Transform3,
    #[serde(default)]
    pub walls: Vec<SourceWall>,
}

/// A wall as stored in its linked source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceWall {
    pub id: ElementId,
    /// Placement of the wall; only curve-based walls can host openings.
    pub location: Option<WallLocation>,
    /// Wall width; a fallback applies when absent.
    #[serde(default)]
    pub thickness: Option<f64>,
    /// Local bounding box.
    pub bounds: Option<Aabb3>,
    /// Planar faces of the wall solid.
    #[serde(default)]
    pub faces: Vec<PlanarFace>,
}

/// Placement of a wall in its source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WallLocation {
    /// Location line; for arcs only the endpoints are used.
    Curve {
        start: Point3<f64>,
        end: Point3<f64>,
    },
    Point { point: Point3<f64> },
}

/// Opaque handle to a face, usable to host a new opening on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceRef(pub String);

impl fmt::Display for FaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A planar face of a wall solid in source-local coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanarFace {
    pub reference: FaceRef,
    /// Origin of the face's parametric frame.
    pub origin: Point3<f64>,
    pub normal: Vector3<f64>,
    /// Parametric axes; `(u, v) = ((p - origin)·u_axis, (p - origin)·v_axis)`.
    pub u_axis: Vector3<f64>,
    pub v_axis: Vector3<f64>,
    /// Parametric extent of the face.
    pub uv_bounds: RectUv,
}

/// Face reference qualified by the linked source it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostFaceRef {
    pub source: SourceId,
    pub face: FaceRef,
}

// ---------------------------------------------------------------------------
// MEP runs (host coordinates)
// ---------------------------------------------------------------------------

/// A cable tray or conduit segment in the host model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MepRun {
    pub id: ElementId,
    /// Category name as reported by the document ("Cable Trays", "Conduits").
    pub category: String,
    #[serde(default)]
    pub family: Option<String>,
    pub geometry: RunGeometry,
    #[serde(default)]
    pub section: CrossSection,
}

/// Centre-line geometry of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunGeometry {
    Line {
        start: Point3<f64>,
        end: Point3<f64>,
    },
    /// Bends and fittings; not analysed.
    Curve,
    /// No location geometry at all.
    Missing,
}

/// Raw size parameters of a run, before clearance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub diameter: Option<f64>,
}

// ---------------------------------------------------------------------------
// Openings (host coordinates)
// ---------------------------------------------------------------------------

/// The family used for opening objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningFamily {
    pub id: ElementId,
    pub name: String,
    /// False when the family cannot be placed (wrong category, inactive type).
    #[serde(default = "default_true")]
    pub usable: bool,
}

fn default_true() -> bool {
    true
}

/// Status flags stored on an opening.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningFlags {
    /// Manually approved; never reported as empty.
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub changed: bool,
}

/// A placed opening object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningRecord {
    pub id: ElementId,
    pub family: ElementId,
    /// Owning wall from the stored metadata; `None` when the metadata is
    /// missing or unreadable.
    #[serde(default)]
    pub host: Option<WallKey>,
    /// Placement point on the hosting face.
    pub position: Point3<f64>,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub flags: OpeningFlags,
}

/// Geometry of an opening to create or update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpeningPlacement {
    pub position: Point3<f64>,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

/// Metadata stamped on created and updated openings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningMetadata {
    pub host: WallKey,
    pub mark_new: bool,
    pub mark_changed: bool,
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Read access to the host document.
pub trait DocumentSource {
    /// Linked models selected for this run, with their walls.
    fn list_linked_sources(&self) -> Result<Vec<LinkedSource>, DocumentError>;

    /// Cable trays and conduits of the host model.
    fn list_mep_runs(&self) -> Result<Vec<MepRun>, DocumentError>;

    /// The family new openings are placed with, if one is configured.
    fn opening_family(&self) -> Result<Option<OpeningFamily>, DocumentError>;

    /// All openings of the given family.
    fn list_existing_openings(&self, family: ElementId)
        -> Result<Vec<OpeningRecord>, DocumentError>;
}

/// Write access to the host document, used in apply mode only.
///
/// The caller wraps all writes of one run in a single document transaction.
/// `mark_new` and `mark_changed` only ever set their flag; a `false` leaves
/// the stored flag as it is.
pub trait OpeningWriter {
    fn create_opening(
        &mut self,
        face: &HostFaceRef,
        placement: &OpeningPlacement,
        metadata: &OpeningMetadata,
    ) -> Result<ElementId, WriteError>;

    fn update_opening(
        &mut self,
        id: ElementId,
        placement: &OpeningPlacement,
        metadata: &OpeningMetadata,
    ) -> Result<(), WriteError>;
}
