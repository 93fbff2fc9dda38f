// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable capture ledger for intercepted HTTP interactions.
//!
//! A capture is a directory holding one envelope file per interaction, a
//! status record and a summary record. Envelopes are addressed by
//! [`Pointer`]s, which sort in append order and survive process restarts.
//! Status and summary updates are serialised across processes by an
//! advisory lock file (see [`lock`]).

mod body_serde;
pub mod clock;
mod error;
mod interaction;
mod io;
pub mod ledger;
pub mod lock;
mod paths;
pub mod pointer;
mod store;

pub use clock::{Clock, FakeClock, SystemClock};
pub use error::LedgerError;
pub use interaction::{Body, Header, HttpRequest, HttpResponse, Interaction};
pub use ledger::{
    CaptureLedger, CaptureMetadata, CaptureState, CaptureStatus, CaptureSummary, Entries,
    FinalizeOutcome, LedgerEntry, LedgerOptions,
};
pub use lock::{AdvisoryLock, FileLock, LockGuard, LockPolicy};
pub use pointer::{Pointer, PointerStore};
pub use store::CaptureStore;
