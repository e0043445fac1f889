//! Error types for host-supplied identifiers.
//!
//! Engine commands themselves never fail: missing surfaces, unresolved anchors
//! and slow resources are contained locally. Errors only arise when turning
//! loosely-typed host values into engine types.

use core::fmt;

/// Invalid host-supplied identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// Slot name other than `prev`, `curr` or `next`.
    UnknownSlot(Box<str>),
    /// Cycle direction other than `next` or `prev`.
    UnknownCycleDirection(Box<str>),
    /// Reading direction other than `0`/`horizontal` or `1`/`vertical`.
    UnknownDirection(Box<str>),
    /// Surface index outside `0..3`.
    SurfaceOutOfRange(usize),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSlot(value) => write!(f, "unknown frame slot: {:?}", value),
            Self::UnknownCycleDirection(value) => {
                write!(f, "unknown cycle direction: {:?}", value)
            }
            Self::UnknownDirection(value) => write!(f, "unknown reading direction: {:?}", value),
            Self::SurfaceOutOfRange(index) => write!(f, "surface index out of range: {}", index),
        }
    }
}

impl std::error::Error for EngineError {}
