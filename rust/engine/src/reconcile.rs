// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Opening reconciler.
//!
//! Matches each cluster against the openings already placed on the same
//! wall and decides what to create, what to grow and which openings are no
//! longer needed. Planning is pure: it reads the opening population once
//! and produces a [`ReconcilePlan`]. Audit and apply runs share the plan;
//! only [`apply_plan`] writes, and it is only called in apply mode.
//!
//! Matching is greedy nearest-center per cluster, in cluster order, against
//! the opening positions read at the start of the run. Two clusters may
//! select the same opening; that opening is then updated once per cluster
//! and reported as contested. Its position ends at the last cluster's
//! center, so the next run moves it again: walls with contested openings
//! never settle. This happens when `cluster_gap` is smaller than
//! `search_tolerance`.

use std::collections::BTreeMap;

use opening_lite_geometry::{Point2, RectUv};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::cluster::Cluster;
use crate::config::{EngineConfig, MOVE_THRESHOLD, RESIZE_THRESHOLD};
use crate::document::{
    ElementId, HostFaceRef, OpeningMetadata, OpeningPlacement, OpeningRecord, OpeningWriter,
    WallKey,
};
use crate::projector::RunIds;
use crate::wall_frame::WallFrame;

/// Depth differences below this are ignored.
const DEPTH_EPSILON: f64 = 1e-9;

/// Whether a run may write to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Compute and report only.
    Audit,
    /// Compute, report and write creates/updates.
    Apply,
}

/// A cluster no existing opening matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingOpening {
    pub wall: WallKey,
    pub rect: RectUv,
    pub runs: RunIds,
}

/// One write the reconciler wants to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedAction {
    Create {
        face: HostFaceRef,
        placement: OpeningPlacement,
        metadata: OpeningMetadata,
    },
    Update {
        id: ElementId,
        placement: OpeningPlacement,
        metadata: OpeningMetadata,
        previous: OpeningPlacement,
    },
}

/// Outcome of matching clusters against existing openings.
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    pub actions: Vec<PlannedAction>,
    pub missing: Vec<MissingOpening>,
    /// Matched openings smaller than their cluster before this run.
    pub need_resize: Vec<ElementId>,
    /// Openings no cluster matched and that are not approved.
    pub empty: Vec<ElementId>,
    /// Openings selected by more than one cluster.
    pub contested: Vec<ElementId>,
    /// Cluster matches, including matches that need no write.
    pub matched: usize,
}

impl ReconcilePlan {
    pub fn planned_creates(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, PlannedAction::Create { .. }))
            .count()
    }

    pub fn planned_updates(&self) -> usize {
        self.actions.len() - self.planned_creates()
    }
}

/// Index of existing openings by owning wall.
struct OpeningIndex<'a> {
    openings: &'a [OpeningRecord],
    by_wall: FxHashMap<WallKey, Vec<usize>>,
}

impl<'a> OpeningIndex<'a> {
    fn new(openings: &'a [OpeningRecord]) -> Self {
        let mut by_wall: FxHashMap<WallKey, Vec<usize>> = FxHashMap::default();
        for (idx, op) in openings.iter().enumerate() {
            if let Some(host) = op.host {
                by_wall.entry(host).or_default().push(idx);
            }
        }
        Self { openings, by_wall }
    }

    /// Nearest opening on the wall by UV center distance, if within
    /// `tolerance`. Ties keep the first candidate.
    fn nearest(
        &self,
        frame: &WallFrame,
        center: &Point2<f64>,
        tolerance: f64,
    ) -> Option<usize> {
        let candidates = self.by_wall.get(&frame.key)?;
        let mut best: Option<(usize, f64)> = None;
        for &idx in candidates {
            let uv = frame.to_uv(&self.openings[idx].position);
            let d = (uv - *center).norm();
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((idx, d));
            }
        }
        best.filter(|(_, d)| *d <= tolerance).map(|(idx, _)| idx)
    }
}

fn placement_of(op: &OpeningRecord) -> OpeningPlacement {
    OpeningPlacement {
        position: op.position,
        width: op.width,
        height: op.height,
        depth: op.depth,
    }
}

fn needs_write(current: &OpeningPlacement, next: &OpeningPlacement) -> bool {
    (next.position - current.position).norm() > MOVE_THRESHOLD
        || next.width > current.width
        || next.height > current.height
        || next.depth > current.depth + DEPTH_EPSILON
}

/// Plans creates and updates for all clusters and classifies the existing
/// openings.
///
/// `existing` must be the full population of the opening family; openings
/// without wall metadata are never matched but can still be empty.
pub fn plan_reconciliation(
    frames: &[WallFrame],
    clusters: &BTreeMap<WallKey, Vec<Cluster>>,
    existing: &[OpeningRecord],
    config: &EngineConfig,
) -> ReconcilePlan {
    let frames_by_key: FxHashMap<WallKey, &WallFrame> =
        frames.iter().map(|f| (f.key, f)).collect();
    let index = OpeningIndex::new(existing);

    // Per-opening state as planned so far; only differs from `existing`
    // for openings already updated by an earlier cluster
    let mut working: Vec<OpeningPlacement> = existing.iter().map(placement_of).collect();
    let mut match_count: Vec<usize> = vec![0; existing.len()];
    let mut resize_seen: FxHashSet<ElementId> = FxHashSet::default();
    let mut plan = ReconcilePlan::default();

    for (key, wall_clusters) in clusters {
        let Some(frame) = frames_by_key.get(key) else {
            tracing::debug!(wall = %key, "Clusters for unknown wall ignored");
            continue;
        };
        let depth = frame.thickness + config.depth_margin;

        for cluster in wall_clusters {
            let center = cluster.rect.center();
            let req_w = cluster.rect.width();
            let req_h = cluster.rect.height();
            let position = frame.placement_point(&center);

            let Some(idx) = index.nearest(frame, &center, config.search_tolerance) else {
                plan.missing.push(MissingOpening {
                    wall: *key,
                    rect: cluster.rect,
                    runs: cluster.runs.clone(),
                });
                plan.actions.push(PlannedAction::Create {
                    face: frame.face.host_ref.clone(),
                    placement: OpeningPlacement {
                        position,
                        width: req_w,
                        height: req_h,
                        depth,
                    },
                    metadata: OpeningMetadata {
                        host: *key,
                        mark_new: true,
                        mark_changed: false,
                    },
                });
                continue;
            };

            let opening = &existing[idx];
            plan.matched += 1;
            match_count[idx] += 1;
            if match_count[idx] == 2 {
                tracing::warn!(
                    opening = %opening.id,
                    wall = %key,
                    "Opening shared by several clusters; it is moved on every apply"
                );
                plan.contested.push(opening.id);
            }

            let current = working[idx];
            let undersized = req_w > current.width + RESIZE_THRESHOLD
                || req_h > current.height + RESIZE_THRESHOLD;
            if undersized && resize_seen.insert(opening.id) {
                plan.need_resize.push(opening.id);
            }

            let next = OpeningPlacement {
                position,
                width: current.width.max(req_w),
                height: current.height.max(req_h),
                depth: current.depth.max(depth),
            };
            if needs_write(&current, &next) {
                plan.actions.push(PlannedAction::Update {
                    id: opening.id,
                    placement: next,
                    metadata: OpeningMetadata {
                        host: *key,
                        mark_new: false,
                        mark_changed: undersized,
                    },
                    previous: current,
                });
                working[idx] = next;
            }
        }
    }

    plan.empty = existing
        .iter()
        .zip(&match_count)
        .filter(|(op, count)| **count == 0 && !op.flags.approved)
        .map(|(op, _)| op.id)
        .collect();

    plan
}

/// What a failed write was trying to do.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WriteTarget {
    Create { wall: WallKey },
    Update { opening: ElementId },
}

/// A write rejected by the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedWrite {
    pub target: WriteTarget,
    pub error: String,
}

/// Result of executing a plan.
#[derive(Debug, Clone, Default)]
pub struct WriteOutcome {
    pub created: Vec<ElementId>,
    pub updated: Vec<ElementId>,
    pub failed: Vec<FailedWrite>,
}

/// Executes every planned action in order.
///
/// A rejected write is recorded and the next action is attempted; the plan
/// itself is never modified.
pub fn apply_plan<W>(plan: &ReconcilePlan, writer: &mut W) -> WriteOutcome
where
    W: OpeningWriter + ?Sized,
{
    let mut outcome = WriteOutcome::default();
    let mut updated_seen: FxHashSet<ElementId> = FxHashSet::default();

    for action in &plan.actions {
        match action {
            PlannedAction::Create {
                face,
                placement,
                metadata,
            } => match writer.create_opening(face, placement, metadata) {
                Ok(id) => outcome.created.push(id),
                Err(err) => {
                    tracing::warn!(wall = %metadata.host, %err, "Opening creation failed");
                    outcome.failed.push(FailedWrite {
                        target: WriteTarget::Create {
                            wall: metadata.host,
                        },
                        error: err.to_string(),
                    });
                }
            },
            PlannedAction::Update {
                id,
                placement,
                metadata,
                ..
            } => match writer.update_opening(*id, placement, metadata) {
                Ok(()) => {
                    if updated_seen.insert(*id) {
                        outcome.updated.push(*id);
                    }
                }
                Err(err) => {
                    tracing::warn!(opening = %id, %err, "Opening update failed");
                    outcome.failed.push(FailedWrite {
                        target: WriteTarget::Update { opening: *id },
                        error: err.to_string(),
                    });
                }
            },
        }
    }

    outcome
}
