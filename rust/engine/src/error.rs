// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the penetration engine.
//!
//! Only fatal conditions are errors. Walls or runs that cannot be analysed
//! are skipped, and missing / undersized / empty openings are report
//! output, not failures.

use crate::document::ElementId;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a reconciliation run before anything is written.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No linked models were supplied to take walls from.
    #[error("no linked sources selected")]
    NoLinkedSources,

    /// The host document contains no cable trays or conduits.
    #[error("no MEP runs found")]
    NoMepRuns,

    /// Linked sources were found but none of their walls yielded a frame.
    #[error("no usable walls in {0} linked source(s)")]
    NoUsableWalls(usize),

    /// The opening family is missing or cannot be placed.
    #[error("opening family unusable: {0}")]
    OpeningFamilyUnusable(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {field} = {value}")]
    InvalidConfig { field: &'static str, value: f64 },

    /// The run was cancelled; partial results were discarded.
    #[error("reconciliation cancelled")]
    Cancelled,

    /// Reading from the document collaborator failed.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),
}

/// Failure reported by the document collaborator on a read.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    #[error("query failed: {0}")]
    Query(String),

    #[error("element not found: {0}")]
    NotFound(ElementId),
}

/// Failure reported by the document collaborator on a single write.
///
/// Write failures never abort a run: the item is recorded as failed and the
/// next one is attempted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WriteError {
    #[error("opening {0} not found")]
    OpeningNotFound(ElementId),

    #[error("face reference cannot host an opening: {0}")]
    InvalidFace(String),

    #[error("write rejected: {0}")]
    Rejected(String),
}
