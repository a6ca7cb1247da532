// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline facade: frames → penetrations → clusters → reconciliation.

use crate::cancel::CancelToken;
use crate::classify::{CategoryClassifier, RunClassifier};
use crate::cluster::cluster_all;
use crate::config::EngineConfig;
use crate::document::{DocumentSource, OpeningWriter};
use crate::error::{Error, Result};
use crate::face::{FaceProjector, PlanarFaceProjector};
use crate::projector::compute_penetrations;
use crate::reconcile::{apply_plan, plan_reconciliation, ReconcilePlan, RunMode, WriteOutcome};
use crate::report::{AuditReport, RunStats};
use crate::wall_frame::build_wall_frames;

/// Detects wall penetrations and reconciles them with placed openings.
pub struct OpeningEngine<C = CategoryClassifier, F = PlanarFaceProjector> {
    config: EngineConfig,
    classifier: C,
    faces: F,
}

impl OpeningEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            classifier: CategoryClassifier::default(),
            faces: PlanarFaceProjector,
        }
    }
}

impl Default for OpeningEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<C: RunClassifier, F: FaceProjector> OpeningEngine<C, F> {
    /// Replaces the run classifier.
    pub fn with_classifier<C2: RunClassifier>(self, classifier: C2) -> OpeningEngine<C2, F> {
        OpeningEngine {
            config: self.config,
            classifier,
            faces: self.faces,
        }
    }

    /// Replaces the face projection provider.
    pub fn with_projector<F2: FaceProjector>(self, faces: F2) -> OpeningEngine<C, F2> {
        OpeningEngine {
            config: self.config,
            classifier: self.classifier,
            faces,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reads the document and computes the complete reconciliation plan.
    ///
    /// Never writes. Fatal conditions are checked before any geometry is
    /// computed: invalid configuration, missing or unusable opening family,
    /// no linked sources, no MEP runs. A document whose sources yield no
    /// usable wall is also fatal.
    pub fn plan<D>(&self, doc: &D, cancel: &CancelToken) -> Result<RunPlan>
    where
        D: DocumentSource + ?Sized,
    {
        self.config.validate()?;

        let family = match doc.opening_family()? {
            Some(family) if family.usable => family,
            Some(family) => return Err(Error::OpeningFamilyUnusable(family.name)),
            None => return Err(Error::OpeningFamilyUnusable("no opening family configured".into())),
        };
        let sources = doc.list_linked_sources()?;
        if sources.is_empty() {
            return Err(Error::NoLinkedSources);
        }
        let runs = doc.list_mep_runs()?;
        if runs.is_empty() {
            return Err(Error::NoMepRuns);
        }

        let mut stats = RunStats {
            linked_sources: sources.len(),
            walls_total: sources.iter().map(|s| s.walls.len()).sum(),
            runs_total: runs.len(),
            ..Default::default()
        };

        let frames = build_wall_frames(&sources);
        stats.walls_cached = frames.len();
        if frames.is_empty() {
            return Err(Error::NoUsableWalls(sources.len()));
        }
        tracing::info!(
            sources = stats.linked_sources,
            walls = stats.walls_total,
            usable = stats.walls_cached,
            "Wall frames built"
        );

        let penetrations = compute_penetrations(
            &runs,
            &frames,
            &self.classifier,
            &self.faces,
            &self.config,
            cancel,
        )?;
        stats.runs_analysed = penetrations.runs_analysed;
        stats.runs_skipped = penetrations.runs_skipped;
        stats.raw_penetrations = penetrations.request_count();
        tracing::info!(
            runs = stats.runs_total,
            analysed = stats.runs_analysed,
            skipped = stats.runs_skipped,
            penetrations = stats.raw_penetrations,
            "Penetrations computed"
        );

        let clusters = cluster_all(&penetrations.by_wall, self.config.cluster_gap, cancel)?;
        stats.clusters = clusters.values().map(Vec::len).sum();
        tracing::info!(clusters = stats.clusters, walls = clusters.len(), "Footprints clustered");

        let existing = doc.list_existing_openings(family.id)?;
        stats.existing_openings = existing.len();
        cancel.check()?;

        let plan = plan_reconciliation(&frames, &clusters, &existing, &self.config);
        stats.planned_creates = plan.planned_creates();
        stats.planned_updates = plan.planned_updates();
        tracing::info!(
            existing = stats.existing_openings,
            matched = plan.matched,
            creates = stats.planned_creates,
            updates = stats.planned_updates,
            empty = plan.empty.len(),
            "Reconciliation planned"
        );

        Ok(RunPlan { stats, plan })
    }

    /// Computes findings without touching the document.
    pub fn audit<D>(&self, doc: &D, cancel: &CancelToken) -> Result<AuditReport>
    where
        D: DocumentSource + ?Sized,
    {
        Ok(self.plan(doc, cancel)?.into_audit_report())
    }

    /// Computes findings and writes the planned creates and updates.
    pub fn apply<D>(&self, doc: &mut D, cancel: &CancelToken) -> Result<AuditReport>
    where
        D: DocumentSource + OpeningWriter + ?Sized,
    {
        let plan = self.plan(&*doc, cancel)?;
        cancel.check()?;
        Ok(plan.commit(doc))
    }

    pub fn run<D>(&self, doc: &mut D, mode: RunMode, cancel: &CancelToken) -> Result<AuditReport>
    where
        D: DocumentSource + OpeningWriter + ?Sized,
    {
        match mode {
            RunMode::Audit => self.audit(&*doc, cancel),
            RunMode::Apply => self.apply(doc, cancel),
        }
    }
}

/// A computed plan, not yet written.
#[derive(Debug, Clone)]
pub struct RunPlan {
    stats: RunStats,
    plan: ReconcilePlan,
}

impl RunPlan {
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn reconcile(&self) -> &ReconcilePlan {
        &self.plan
    }

    /// Report for an audit run: findings only, nothing written.
    pub fn into_audit_report(self) -> AuditReport {
        AuditReport::new(RunMode::Audit, self.stats, self.plan, WriteOutcome::default())
    }

    /// Writes every planned action and reports the outcome.
    pub fn commit<W: OpeningWriter + ?Sized>(self, writer: &mut W) -> AuditReport {
        let outcome = apply_plan(&self.plan, writer);
        tracing::info!(
            created = outcome.created.len(),
            updated = outcome.updated.len(),
            failed = outcome.failed.len(),
            "Plan applied"
        );
        AuditReport::new(RunMode::Apply, self.stats, self.plan, outcome)
    }
}
