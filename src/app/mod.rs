//! Application core — pure reconciliation logic, zero I/O.
//!
//! This module contains the business rules for the dashboard engine:
//! poll orchestration, snapshot diffing, mode tracking, notification
//! bookkeeping, and timer sync.  All interaction with the backend and
//! the renderer happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without a network or a screen.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
