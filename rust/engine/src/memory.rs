// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory document backed by a JSON snapshot.

use serde::{Deserialize, Serialize};

use crate::document::{
    DocumentSource, ElementId, HostFaceRef, LinkedSource, MepRun, OpeningFamily, OpeningMetadata,
    OpeningPlacement, OpeningRecord, OpeningWriter,
};
use crate::error::{DocumentError, WriteError};

/// A named building storey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    /// Storey elevation in host coordinates (m).
    pub elevation: f64,
}

/// Complete host document held in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDocument {
    #[serde(default)]
    pub opening_family: Option<OpeningFamily>,
    #[serde(default)]
    pub levels: Vec<Level>,
    #[serde(default)]
    pub sources: Vec<LinkedSource>,
    #[serde(default)]
    pub runs: Vec<MepRun>,
    #[serde(default)]
    pub openings: Vec<OpeningRecord>,
    #[serde(default)]
    next_id: i64,
}

impl MemoryDocument {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn opening(&self, id: ElementId) -> Option<&OpeningRecord> {
        self.openings.iter().find(|o| o.id == id)
    }

    /// Openings of the configured family, ordered by level name then id.
    /// Openings without a level sort first.
    pub fn sorted_openings(&self) -> Vec<&OpeningRecord> {
        let Some(family) = &self.opening_family else {
            return Vec::new();
        };
        let mut list: Vec<&OpeningRecord> = self
            .openings
            .iter()
            .filter(|o| o.family == family.id)
            .collect();
        list.sort_by(|a, b| a.level.cmp(&b.level).then(a.id.cmp(&b.id)));
        list
    }

    /// Removes an opening. Only ever called on explicit user request.
    pub fn delete_opening(&mut self, id: ElementId) -> Result<OpeningRecord, DocumentError> {
        let idx = self
            .openings
            .iter()
            .position(|o| o.id == id)
            .ok_or(DocumentError::NotFound(id))?;
        Ok(self.openings.remove(idx))
    }

    fn allocate_id(&mut self) -> ElementId {
        let highest = self
            .openings
            .iter()
            .map(|o| o.id.0)
            .chain(self.runs.iter().map(|r| r.id.0))
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(highest + 1);
        let id = ElementId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Highest level at or below `z`.
    fn level_at(&self, z: f64) -> Option<String> {
        self.levels
            .iter()
            .filter(|l| l.elevation <= z + 1e-9)
            .max_by(|a, b| a.elevation.total_cmp(&b.elevation))
            .map(|l| l.name.clone())
    }

    fn face_exists(&self, face: &HostFaceRef) -> bool {
        self.sources
            .iter()
            .filter(|s| s.id == face.source)
            .flat_map(|s| &s.walls)
            .flat_map(|w| &w.faces)
            .any(|f| f.reference == face.face)
    }
}

fn check_placement(placement: &OpeningPlacement) -> Result<(), WriteError> {
    let dims = [placement.width, placement.height, placement.depth];
    if dims.iter().all(|d| d.is_finite() && *d > 0.0)
        && placement.position.coords.iter().all(|c| c.is_finite())
    {
        Ok(())
    } else {
        Err(WriteError::Rejected(format!(
            "invalid opening size {} x {} x {}",
            placement.width, placement.height, placement.depth
        )))
    }
}

impl DocumentSource for MemoryDocument {
    fn list_linked_sources(&self) -> Result<Vec<LinkedSource>, DocumentError> {
        Ok(self.sources.clone())
    }

    fn list_mep_runs(&self) -> Result<Vec<MepRun>, DocumentError> {
        Ok(self.runs.clone())
    }

    fn opening_family(&self) -> Result<Option<OpeningFamily>, DocumentError> {
        Ok(self.opening_family.clone())
    }

    fn list_existing_openings(
        &self,
        family: ElementId,
    ) -> Result<Vec<OpeningRecord>, DocumentError> {
        Ok(self
            .openings
            .iter()
            .filter(|o| o.family == family)
            .cloned()
            .collect())
    }
}

impl OpeningWriter for MemoryDocument {
    fn create_opening(
        &mut self,
        face: &HostFaceRef,
        placement: &OpeningPlacement,
        metadata: &OpeningMetadata,
    ) -> Result<ElementId, WriteError> {
        let family = self
            .opening_family
            .as_ref()
            .map(|f| f.id)
            .ok_or_else(|| WriteError::Rejected("no opening family".into()))?;
        if !self.face_exists(face) {
            return Err(WriteError::InvalidFace(format!("{}/{}", face.source, face.face)));
        }
        check_placement(placement)?;

        let id = self.allocate_id();
        let level = self.level_at(placement.position.z);
        let mut record = OpeningRecord {
            id,
            family,
            host: Some(metadata.host),
            position: placement.position,
            width: placement.width,
            height: placement.height,
            depth: placement.depth,
            level,
            flags: Default::default(),
        };
        record.flags.new = metadata.mark_new;
        record.flags.changed = metadata.mark_changed;
        self.openings.push(record);
        Ok(id)
    }

    fn update_opening(
        &mut self,
        id: ElementId,
        placement: &OpeningPlacement,
        metadata: &OpeningMetadata,
    ) -> Result<(), WriteError> {
        check_placement(placement)?;
        let record = self
            .openings
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(WriteError::OpeningNotFound(id))?;
        record.position = placement.position;
        record.width = placement.width;
        record.height = placement.height;
        record.depth = placement.depth;
        record.host = Some(metadata.host);
        record.flags.new |= metadata.mark_new;
        record.flags.changed |= metadata.mark_changed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{FaceRef, OpeningFlags, SourceId, WallKey};
    use crate::synthetic::straight_wall;
    use opening_lite_geometry::{Point3, Transform3};

    fn doc() -> MemoryDocument {
        MemoryDocument {
            opening_family: Some(OpeningFamily {
                id: ElementId(9000),
                name: "Wall Opening".into(),
                usable: true,
            }),
            levels: vec![
                Level {
                    name: "00 Ground".into(),
                    elevation: 0.0,
                },
                Level {
                    name: "01 First".into(),
                    elevation: 3.0,
                },
            ],
            sources: vec![LinkedSource {
                id: SourceId(1),
                name: "ARC".into(),
                transform: Transform3::identity(),
                walls: vec![straight_wall(
                    ElementId(100),
                    Point3::origin(),
                    Point3::new(5.0, 0.0, 0.0),
                    0.2,
                    3.0,
                )],
            }],
            ..Default::default()
        }
    }

    fn face() -> HostFaceRef {
        HostFaceRef {
            source: SourceId(1),
            face: FaceRef("100:side-a".into()),
        }
    }

    fn placement(z: f64) -> OpeningPlacement {
        OpeningPlacement {
            position: Point3::new(1.0, 0.1, z),
            width: 0.2,
            height: 0.2,
            depth: 0.25,
        }
    }

    fn metadata() -> OpeningMetadata {
        OpeningMetadata {
            host: WallKey::new(SourceId(1), ElementId(100)),
            mark_new: true,
            mark_changed: false,
        }
    }

    #[test]
    fn create_assigns_fresh_ids_and_level() {
        let mut doc = doc();
        let a = doc.create_opening(&face(), &placement(1.0), &metadata()).unwrap();
        let b = doc.create_opening(&face(), &placement(4.0), &metadata()).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, ElementId(1));
        assert_eq!(doc.opening(a).unwrap().level.as_deref(), Some("00 Ground"));
        assert_eq!(doc.opening(b).unwrap().level.as_deref(), Some("01 First"));
        assert!(doc.opening(a).unwrap().flags.new);
    }

    #[test]
    fn create_rejects_unknown_face() {
        let mut doc = doc();
        let bad = HostFaceRef {
            source: SourceId(2),
            face: FaceRef("100:side-a".into()),
        };
        let err = doc.create_opening(&bad, &placement(1.0), &metadata()).unwrap_err();
        assert!(matches!(err, WriteError::InvalidFace(_)));
        assert!(doc.openings.is_empty());
    }

    #[test]
    fn update_keeps_existing_flags() {
        let mut doc = doc();
        let id = doc.create_opening(&face(), &placement(1.0), &metadata()).unwrap();
        let mut grown = placement(1.0);
        grown.width = 0.4;
        let meta = OpeningMetadata {
            mark_new: false,
            mark_changed: true,
            ..metadata()
        };
        doc.update_opening(id, &grown, &meta).unwrap();
        let record = doc.opening(id).unwrap();
        assert_eq!(record.width, 0.4);
        assert_eq!(
            record.flags,
            OpeningFlags {
                approved: false,
                new: true,
                changed: true
            }
        );
        assert_eq!(
            doc.update_opening(ElementId(1), &grown, &meta),
            Err(WriteError::OpeningNotFound(ElementId(1)))
        );
    }

    #[test]
    fn sorted_by_level_then_id_and_delete() {
        let mut doc = doc();
        let upper = doc.create_opening(&face(), &placement(4.0), &metadata()).unwrap();
        let lower_a = doc.create_opening(&face(), &placement(1.0), &metadata()).unwrap();
        let lower_b = doc.create_opening(&face(), &placement(0.5), &metadata()).unwrap();
        let ids: Vec<ElementId> = doc.sorted_openings().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![lower_a, lower_b, upper]);

        let removed = doc.delete_opening(lower_a).unwrap();
        assert_eq!(removed.id, lower_a);
        assert_eq!(doc.openings.len(), 2);
        assert_eq!(doc.delete_opening(lower_a).unwrap_err(), DocumentError::NotFound(lower_a));
    }

    #[test]
    fn snapshot_round_trip_keeps_id_counter() {
        let mut doc = doc();
        let first = doc.create_opening(&face(), &placement(1.0), &metadata()).unwrap();
        doc.delete_opening(first).unwrap();

        let mut restored = MemoryDocument::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(restored.sources[0].walls[0].faces.len(), 6);
        let second = restored.create_opening(&face(), &placement(1.0), &metadata()).unwrap();
        assert!(second.0 > first.0);
    }
}
