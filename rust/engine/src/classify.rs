// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Run classification and required cross-sections.
//!
//! Which kind of run an element is decides how its size parameters are
//! read. Classification is pluggable: anything implementing
//! [`RunClassifier`], including a plain closure, can replace the default
//! category matcher.

use serde::{Deserialize, Serialize};

use crate::config::{FALLBACK_CONDUIT_DIAMETER, FALLBACK_TRAY_HEIGHT, FALLBACK_TRAY_WIDTH};
use crate::document::MepRun;

/// Kind of MEP run, as far as opening sizes are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunKind {
    /// Rectangular section: width x height.
    CableTray,
    /// Round section: diameter, opened as a square.
    Conduit,
    /// Anything else; not analysed.
    Unsupported,
}

/// Maps a run's attributes to a [`RunKind`].
pub trait RunClassifier {
    fn classify(&self, run: &MepRun) -> RunKind;
}

impl<F> RunClassifier for F
where
    F: Fn(&MepRun) -> RunKind,
{
    fn classify(&self, run: &MepRun) -> RunKind {
        self(run)
    }
}

/// Default classifier: case-insensitive keyword match on category, then
/// family name.
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    tray_keywords: Vec<String>,
    conduit_keywords: Vec<String>,
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self {
            tray_keywords: vec!["cable tray".into(), "cabletray".into(), "tray".into()],
            conduit_keywords: vec!["conduit".into()],
        }
    }
}

impl CategoryClassifier {
    pub fn new(tray_keywords: Vec<String>, conduit_keywords: Vec<String>) -> Self {
        Self {
            tray_keywords: tray_keywords.into_iter().map(|k| k.to_lowercase()).collect(),
            conduit_keywords: conduit_keywords
                .into_iter()
                .map(|k| k.to_lowercase())
                .collect(),
        }
    }

    fn match_text(&self, text: &str) -> Option<RunKind> {
        let text = text.to_lowercase();
        // Conduit first: "Conduit Fittings" must not fall through to trays
        if self.conduit_keywords.iter().any(|k| text.contains(k.as_str())) {
            return Some(RunKind::Conduit);
        }
        if self.tray_keywords.iter().any(|k| text.contains(k.as_str())) {
            return Some(RunKind::CableTray);
        }
        None
    }
}

impl RunClassifier for CategoryClassifier {
    fn classify(&self, run: &MepRun) -> RunKind {
        self.match_text(&run.category)
            .or_else(|| run.family.as_deref().and_then(|f| self.match_text(f)))
            .unwrap_or(RunKind::Unsupported)
    }
}

/// Clear opening size `(width, height)` a run needs, clearance included.
///
/// Missing or non-positive size parameters fall back to typical sizes.
/// Returns `None` for unsupported kinds.
pub fn required_section(kind: RunKind, run: &MepRun, clearance: f64) -> Option<(f64, f64)> {
    let positive = |v: Option<f64>| v.filter(|x| x.is_finite() && *x > 0.0);
    match kind {
        RunKind::CableTray => {
            let w = positive(run.section.width).unwrap_or(FALLBACK_TRAY_WIDTH);
            let h = positive(run.section.height).unwrap_or(FALLBACK_TRAY_HEIGHT);
            Some((w + clearance, h + clearance))
        }
        RunKind::Conduit => {
            let d = positive(run.section.diameter).unwrap_or(FALLBACK_CONDUIT_DIAMETER);
            Some((d + clearance, d + clearance))
        }
        RunKind::Unsupported => None,
    }
}
