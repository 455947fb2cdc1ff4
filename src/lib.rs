//! Dashboard reconciliation engine for a pellet-grill controller.
//!
//! Polls backend state, diffs consecutive snapshots into minimal change
//! events, tracks operating-mode transitions, manages per-probe
//! notification rules, and keeps the countdown timer in sync.  All I/O
//! goes through the port traits in [`app::ports`], so the whole engine
//! runs (and is tested) against mock adapters.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod diff;
pub mod error;
pub mod hopper;
pub mod mode;
pub mod notify;
pub mod poller;
pub mod snapshot;
pub mod timer;

#[cfg(test)]
pub(crate) mod test_support;
