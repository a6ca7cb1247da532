// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sample snapshot for trying the commands.

use opening_lite_engine::synthetic::{cable_tray, conduit, straight_wall};
use opening_lite_engine::{
    CrossSection, ElementId, Level, LinkedSource, MemoryDocument, MepRun, OpeningFamily,
    OpeningFlags, OpeningRecord, RunGeometry, SourceId, WallKey,
};
use opening_lite_geometry::{Point3, Transform3, Vector3};

/// Existing opening in the sample that no run needs any more.
pub const STALE_OPENING: ElementId = ElementId(500);

/// Two linked models, a handful of trays and conduits and one stale
/// opening.
pub fn sample_document() -> MemoryDocument {
    let main = LinkedSource {
        id: SourceId(1),
        name: "ARC-Main".into(),
        transform: Transform3::identity(),
        walls: vec![
            straight_wall(
                ElementId(100),
                Point3::origin(),
                Point3::new(12.0, 0.0, 0.0),
                0.25,
                3.2,
            ),
            straight_wall(
                ElementId(101),
                Point3::new(12.0, 0.0, 0.0),
                Point3::new(12.0, 8.0, 0.0),
                0.2,
                3.2,
            ),
        ],
    };
    let annex = LinkedSource {
        id: SourceId(2),
        name: "ARC-Annex".into(),
        transform: Transform3::translation(Vector3::new(0.0, 20.0, 0.0)),
        walls: vec![straight_wall(
            ElementId(200),
            Point3::origin(),
            Point3::new(10.0, 0.0, 0.0),
            0.3,
            3.2,
        )],
    };

    let runs = vec![
        // Two conduits close enough to share an opening
        conduit(
            ElementId(1),
            Point3::new(3.0, -1.0, 2.5),
            Point3::new(3.0, 1.0, 2.5),
            0.032,
        ),
        conduit(
            ElementId(2),
            Point3::new(3.3, -1.0, 2.5),
            Point3::new(3.3, 1.0, 2.5),
            0.032,
        ),
        cable_tray(
            ElementId(3),
            Point3::new(7.0, -2.0, 2.8),
            Point3::new(7.0, 2.0, 2.8),
            0.4,
            0.1,
        ),
        cable_tray(
            ElementId(4),
            Point3::new(11.0, 4.0, 2.6),
            Point3::new(13.0, 4.0, 2.6),
            0.3,
            0.1,
        ),
        // Sloped conduit into the annex
        conduit(
            ElementId(5),
            Point3::new(5.0, 19.0, 1.0),
            Point3::new(5.0, 21.0, 1.4),
            0.05,
        ),
        // Along the wall, never crossing it
        conduit(ElementId(6), Point3::new(1.0, 0.8, 2.5), Point3::new(9.0, 0.8, 2.5), 0.025),
        MepRun {
            id: ElementId(7),
            category: "Ducts".into(),
            family: None,
            geometry: RunGeometry::Line {
                start: Point3::new(5.0, -1.0, 2.0),
                end: Point3::new(5.0, 1.0, 2.0),
            },
            section: CrossSection {
                width: Some(0.5),
                height: Some(0.3),
                diameter: None,
            },
        },
    ];

    let stale = OpeningRecord {
        id: STALE_OPENING,
        family: ElementId(9000),
        host: Some(WallKey::new(SourceId(1), ElementId(100))),
        position: Point3::new(10.0, -0.125, 1.0),
        width: 0.2,
        height: 0.2,
        depth: 0.3,
        level: Some("00 Ground".into()),
        flags: OpeningFlags::default(),
    };

    let mut doc = MemoryDocument::default();
    doc.opening_family = Some(OpeningFamily {
        id: ElementId(9000),
        name: "Wall Opening".into(),
        usable: true,
    });
    doc.levels = vec![
        Level {
            name: "00 Ground".into(),
            elevation: 0.0,
        },
        Level {
            name: "01 First".into(),
            elevation: 3.2,
        },
    ];
    doc.sources = vec![main, annex];
    doc.runs = runs;
    doc.openings = vec![stale];
    doc
}
