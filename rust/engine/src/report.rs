// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Audit report returned by every run.

use std::fmt;

use serde::Serialize;

use crate::document::ElementId;
use crate::reconcile::{FailedWrite, MissingOpening, ReconcilePlan, RunMode, WriteOutcome};

/// Counters collected while a run progresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub linked_sources: usize,
    pub walls_total: usize,
    pub walls_cached: usize,
    pub runs_total: usize,
    pub runs_analysed: usize,
    pub runs_skipped: usize,
    pub raw_penetrations: usize,
    pub clusters: usize,
    pub existing_openings: usize,
    pub planned_creates: usize,
    pub planned_updates: usize,
}

/// Findings and write results of one run.
///
/// `missing`, `need_resize`, `empty` and `contested` describe the model as
/// it was before the run and are identical between audit and apply runs
/// over the same document. `created`, `updated` and `failed` are only
/// populated in apply mode.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub mode: RunMode,
    pub stats: RunStats,
    pub created: Vec<ElementId>,
    pub updated: Vec<ElementId>,
    pub missing: Vec<MissingOpening>,
    pub need_resize: Vec<ElementId>,
    pub empty: Vec<ElementId>,
    pub contested: Vec<ElementId>,
    pub failed: Vec<FailedWrite>,
}

impl AuditReport {
    pub(crate) fn new(
        mode: RunMode,
        stats: RunStats,
        plan: ReconcilePlan,
        outcome: WriteOutcome,
    ) -> Self {
        Self {
            mode,
            stats,
            created: outcome.created,
            updated: outcome.updated,
            missing: plan.missing,
            need_resize: plan.need_resize,
            empty: plan.empty,
            contested: plan.contested,
            failed: outcome.failed,
        }
    }

    /// True when the model needs attention: missing, undersized or
    /// unneeded openings, or writes that failed.
    pub fn has_findings(&self) -> bool {
        !(self.missing.is_empty()
            && self.need_resize.is_empty()
            && self.empty.is_empty()
            && self.failed.is_empty())
    }

    /// One-line summary for log output.
    pub fn summary_line(&self) -> String {
        format!(
            "created={} updated={} missing={} need_resize={} empty={} failed={}",
            self.created.len(),
            self.updated.len(),
            self.missing.len(),
            self.need_resize.len(),
            self.empty.len(),
            self.failed.len()
        )
    }
}

fn write_ids(f: &mut fmt::Formatter<'_>, title: &str, ids: &[ElementId]) -> fmt::Result {
    if ids.is_empty() {
        return Ok(());
    }
    writeln!(f)?;
    writeln!(f, "### {title}")?;
    for id in ids {
        writeln!(f, "- Id {id}")?;
    }
    Ok(())
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            RunMode::Audit => "audit",
            RunMode::Apply => "apply",
        };
        writeln!(f, "## Result ({mode})")?;
        writeln!(f, "- Created: **{}**", self.created.len())?;
        writeln!(f, "- Updated: **{}**", self.updated.len())?;
        writeln!(f, "- Missing openings: **{}**", self.missing.len())?;
        writeln!(f, "- Need resize: **{}**", self.need_resize.len())?;
        writeln!(f, "- Empty openings: **{}**", self.empty.len())?;
        if !self.contested.is_empty() {
            writeln!(f, "- Shared by several clusters: **{}**", self.contested.len())?;
        }
        if !self.failed.is_empty() {
            writeln!(f, "- Failed writes: **{}**", self.failed.len())?;
        }

        let s = &self.stats;
        writeln!(f)?;
        writeln!(f, "### Statistics")?;
        writeln!(
            f,
            "- Linked sources: {} ({} walls, {} usable)",
            s.linked_sources, s.walls_total, s.walls_cached
        )?;
        writeln!(
            f,
            "- MEP runs: {} ({} analysed, {} skipped)",
            s.runs_total, s.runs_analysed, s.runs_skipped
        )?;
        writeln!(
            f,
            "- Penetrations: {} in {} clusters",
            s.raw_penetrations, s.clusters
        )?;
        writeln!(f, "- Existing openings: {}", s.existing_openings)?;

        if !self.missing.is_empty() {
            writeln!(f)?;
            writeln!(f, "### Missing openings")?;
            for m in &self.missing {
                let runs: Vec<String> = m.runs.iter().map(ToString::to_string).collect();
                writeln!(
                    f,
                    "- Wall {} | {:.0} x {:.0} mm | runs: {}",
                    m.wall,
                    m.rect.width() * 1000.0,
                    m.rect.height() * 1000.0,
                    runs.join(", ")
                )?;
            }
        }
        write_ids(f, "Created", &self.created)?;
        write_ids(f, "Updated", &self.updated)?;
        write_ids(f, "Need resize", &self.need_resize)?;
        write_ids(f, "Empty openings", &self.empty)?;
        write_ids(f, "Shared openings", &self.contested)?;

        if !self.failed.is_empty() {
            writeln!(f)?;
            writeln!(f, "### Failed writes")?;
            for failure in &self.failed {
                writeln!(f, "- {:?}: {}", failure.target, failure.error)?;
            }
        }
        Ok(())
    }
}
