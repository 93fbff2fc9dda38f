// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Incremental diffing of captured interactions.

pub mod engine;
pub mod filter;
pub mod record;
pub mod session;

pub use engine::{DiffEngine, DiffEngineError, DiffOutcome, SpecDiffEngine};
pub use filter::{FilterError, RequestFilter};
pub use record::{DiffRecord, InteractionPart, InteractionTrail, SpecTrail, UndocumentedUrl};
pub use session::{
    DiffError, DiffSessionInfo, DiffSessions, DiffStats, DiffsSnapshot, ProgressEvent, Snapshot,
    UndocumentedSnapshot,
};
