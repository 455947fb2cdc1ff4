//! Unified error types for the dashboard engine.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! service layer's handling uniform.  Transport failures originate in
//! adapters as `anyhow::Error` and are counted by the poll cycles rather
//! than converted; everything the domain itself can reject lives here.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level engine error
// ---------------------------------------------------------------------------

/// Every fallible domain operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An incoming snapshot failed structural validation.
    Snapshot(SnapshotError),
    /// User input was rejected before a write was issued.
    Input(InputError),
    /// The server rejected a control write.
    WriteRejected,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snapshot(e) => write!(f, "snapshot: {e}"),
            Self::Input(e) => write!(f, "input: {e}"),
            Self::WriteRejected => write!(f, "control write rejected by server"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Snapshot validation errors
// ---------------------------------------------------------------------------

/// A snapshot decoded cleanly but is internally inconsistent.
/// These are fatal for the offending poll: the snapshot is dropped and
/// the cycle counts it as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotError {
    /// A notification record has both shutdown and keep-warm set.
    ConflictingActions,
    /// A notification record references a probe label not in the snapshot.
    UnknownProbeLabel,
    /// More than one probe claims to be primary.
    MultiplePrimaryProbes,
    /// Recipe mode reported without a step index.
    RecipeWithoutStep,
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConflictingActions => write!(f, "shutdown and keep-warm both set"),
            Self::UnknownProbeLabel => write!(f, "notify record for unknown probe"),
            Self::MultiplePrimaryProbes => write!(f, "multiple primary probes"),
            Self::RecipeWithoutStep => write!(f, "recipe mode without step index"),
        }
    }
}

impl From<SnapshotError> for Error {
    fn from(e: SnapshotError) -> Self {
        Self::Snapshot(e)
    }
}

// ---------------------------------------------------------------------------
// User input errors
// ---------------------------------------------------------------------------

/// Local range/consistency validation failures.  No network round trip
/// is spent on a value that fails these checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    /// Setpoint outside the configured range for the active units.
    SetpointOutOfRange,
    /// Notification threshold outside the configured range.
    ThresholdOutOfRange,
    /// Command referenced a probe label the cache has never seen.
    UnknownProbe,
    /// Shutdown and keep-warm requested together.
    ConflictingActions,
    /// Timer duration of zero or beyond 24 hours.
    BadTimerDuration,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetpointOutOfRange => write!(f, "setpoint out of range"),
            Self::ThresholdOutOfRange => write!(f, "threshold out of range"),
            Self::UnknownProbe => write!(f, "unknown probe label"),
            Self::ConflictingActions => write!(f, "shutdown and keep-warm both requested"),
            Self::BadTimerDuration => write!(f, "timer duration invalid"),
        }
    }
}

impl From<InputError> for Error {
    fn from(e: InputError) -> Self {
        Self::Input(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Engine-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
