//! Port traits — the boundary between the engine and the outside world.
//!
//! ```text
//!   Backend adapter ──▶ SnapshotSource ──▶ DashService ──▶ RenderSink
//!                   ◀── ControlPort    ◀──
//! ```
//!
//! Adapters (HTTP client, renderer) implement these traits.  The
//! [`DashService`](super::service::DashService) consumes them via
//! generics, so the core never touches a socket or the DOM directly.
//!
//! Transport failures are `anyhow::Error`: the engine does not care
//! whether a poll died in DNS or deserialization, it only counts the
//! failure against the cycle's offline ceiling.

use crate::hopper::HopperStatus;
use crate::snapshot::{ControlUpdate, Snapshot, TimerRecord};
use crate::timer::TimerCommand;

use super::events::UiEvent;

// ───────────────────────────────────────────────────────────────
// Read-side port (backend → engine)
// ───────────────────────────────────────────────────────────────

/// Polled reads of backend state.  One method per resource, each with
/// its own cadence and failure accounting.
pub trait SnapshotSource {
    /// `GET /api/current` — the full telemetry snapshot.
    fn fetch_snapshot(&mut self) -> anyhow::Result<Snapshot>;

    /// `GET /api/hopper` — consumable level.
    fn fetch_hopper(&mut self) -> anyhow::Result<HopperStatus>;

    /// `GET /api/timer` — countdown timer record.
    fn fetch_timer(&mut self) -> anyhow::Result<TimerRecord>;
}

// ───────────────────────────────────────────────────────────────
// Write-side port (engine → backend)
// ───────────────────────────────────────────────────────────────

/// Control writes.  The response is an ack only; committed state always
/// arrives through the next poll, never merged from the write reply.
pub trait ControlPort {
    /// `POST /api/control` — full-object control write.
    fn send_control(&mut self, update: &ControlUpdate) -> anyhow::Result<()>;

    /// `POST /api/timer` — timer action.
    fn send_timer(&mut self, command: TimerCommand) -> anyhow::Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Render sink port (engine → UI)
// ───────────────────────────────────────────────────────────────

/// The engine emits [`UiEvent`]s through this port.  The adapter on the
/// other side decides how to render them (DOM patches, TUI redraw, a
/// test recorder).
pub trait RenderSink {
    fn emit(&mut self, event: &UiEvent);
}
