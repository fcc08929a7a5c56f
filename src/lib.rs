// Copyright 2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lectern — course portal snapshot watcher.
//!
//! Captures the state of a remote academic portal (subjects → meetings →
//! lectures), diffs it against the previously stored snapshot, and pushes
//! a structured notification describing exactly what changed.

pub mod acquire;
pub mod collect;
pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod notify;
pub mod store;
pub mod worker;
