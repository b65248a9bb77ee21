//! gz_core — Core types for the graze engine.
//!
//! This crate is **I/O-free**. It defines the stable types/APIs used across
//! the engine (`gz_geom`, `gz_store`, `gz_engine`):
//!
//! - Typed identifiers: `PaddockId`, `AllocationId`, `RotationId`, `EventId`
//! - Geometry primitives: `Position`, `Ring`, `Polygon`, `RawGeometry`
//! - Domain entities: `ParentArea`, `Allocation`, `Rotation`, `SectionEvent`
//! - Parameter domains with safe defaults: `Pct`, `Params`
//! - Day stamps and injectable clocks (`DayStamp`, `Clock`)
//!
//! Serialization derives are gated behind the `serde` feature.

#![forbid(unsafe_code)]

pub mod errors {
    use core::fmt;

    /// Minimal error set for core-domain validation & parsing.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum CoreError {
        InvalidId,
        InvalidToken,
        InvalidDay,
        InvalidRing(&'static str),
        InvalidPct,
        DomainOutOfRange(&'static str),
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::InvalidId => write!(f, "invalid id"),
                CoreError::InvalidToken => write!(f, "invalid token"),
                CoreError::InvalidDay => write!(f, "invalid day stamp"),
                CoreError::InvalidRing(k) => write!(f, "invalid ring: {k}"),
                CoreError::InvalidPct => write!(f, "percentage out of range"),
                CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub mod ids;
pub mod geometry;
pub mod clock;
pub mod variables;
pub mod entities;

pub use errors::CoreError;

/// Lightweight re-exports so downstream crates can do `use gz_core::prelude::*;`.
pub mod prelude {
    pub use crate::clock::{Clock, DayStamp, FixedClock, SystemClock};
    pub use crate::entities::{
        Allocation, AllocationStatus, ParentArea, ProgressContext, Rotation, RotationDefaults,
        RotationStatus, SectionEvent, SkippedArea,
    };
    pub use crate::errors::CoreError;
    pub use crate::geometry::{Polygon, Position, RawGeometry, Ring};
    pub use crate::ids::{AllocationId, EventId, PaddockId, RotationId};
    pub use crate::variables::{CornerTag, Params, Pct, ProgressionDirection, ThresholdOverrides};
}
