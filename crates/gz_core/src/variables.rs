//! crates/gz_core/src/variables.rs
//! Parameter domains with safe defaults, validated percentage newtype, and
//! the wire-token enum macro shared with `entities`.

use core::fmt;

use crate::errors::CoreError;

// ------------ Macros ------------

/// Define an enum with explicit wire tokens. Serde derives stay behind the
/// `serde` feature; the `token()` accessor is always available.
macro_rules! serde_enum {
    ($(#[$m:meta])* $name:ident => { $($variant:ident = $token:literal),+ $(,)? }) => {
        $(#[$m])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum $name {
            $(
                #[cfg_attr(feature = "serde", serde(rename = $token))]
                $variant,
            )+
        }

        impl $name {
            /// Stable wire token for this variant.
            pub fn token(self) -> &'static str {
                match self { $( $name::$variant => $token, )+ }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.token())
            }
        }
    };
}

pub(crate) use serde_enum;

// ------------ Newtypes with invariants ------------

/// Validated percentage, 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Pct(u8);

impl Pct {
    pub fn new(v: u8) -> Result<Self, CoreError> {
        if v <= 100 {
            Ok(Pct(v))
        } else {
            Err(CoreError::InvalidPct)
        }
    }

    /// Rounds to the nearest integer and clamps into 0..=100. Non-finite
    /// input maps to 0 (callers that want a different default check first).
    pub fn from_f64_clamped(v: f64) -> Self {
        if !v.is_finite() {
            return Pct(0);
        }
        Pct(v.round().clamp(0.0, 100.0) as u8)
    }

    #[inline]
    pub fn as_u8(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }
}

impl fmt::Display for Pct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Pct {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        use serde::de::{Error as _, Unexpected};
        let v = u8::deserialize(d)?;
        Pct::new(v).map_err(|_| D::Error::invalid_value(Unexpected::Unsigned(v as u64), &"0..=100"))
    }
}

// ------------ Canonical enums (wire tokens explicit) ------------

serde_enum!(
    /// Paddock corner a rotation starts from.
    CornerTag => {
        NorthWest = "NW",
        NorthEast = "NE",
        SouthWest = "SW",
        SouthEast = "SE",
    }
);

serde_enum!(
    /// Sweep direction a rotation progresses in.
    ProgressionDirection => {
        Horizontal = "horizontal",
        Vertical = "vertical",
    }
);

// ------------ Params (engine-wide defaults) ------------

/// Global engine thresholds. Per-area [`ThresholdOverrides`] shadow the
/// overlap and completion values; the containment threshold and the
/// confidence default are global only.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Params {
    /// Containment ratio (intersection/candidate) at or above which a
    /// candidate polygon is accepted unchanged instead of clipped.
    pub containment_accept_pct: Pct,
    /// Pairwise overlap with a prior allocation tolerated without
    /// geometric subtraction.
    pub overlap_tolerance_pct: Pct,
    /// Cumulative grazed percentage at which a rotation completes.
    pub completion_threshold_pct: Pct,
    /// Confidence assigned when the caller supplies none and none can be
    /// recovered from the justification text.
    pub confidence_default: Pct,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            containment_accept_pct: Pct(99),
            overlap_tolerance_pct: Pct(5),
            completion_threshold_pct: Pct(90),
            confidence_default: Pct(50),
        }
    }
}

impl Params {
    /// Validate cross-field domains beyond what `Pct` already enforces.
    pub fn validate_domains(&self) -> Result<(), CoreError> {
        if self.completion_threshold_pct.as_u8() == 0 {
            return Err(CoreError::DomainOutOfRange("completion_threshold_pct"));
        }
        if self.containment_accept_pct.as_u8() == 0 {
            return Err(CoreError::DomainOutOfRange("containment_accept_pct"));
        }
        Ok(())
    }

    /// Effective parameters for one parent area: overrides shadow the
    /// global values, unset fields fall through.
    pub fn resolve(&self, overrides: &ThresholdOverrides) -> Params {
        Params {
            containment_accept_pct: self.containment_accept_pct,
            overlap_tolerance_pct: overrides
                .overlap_tolerance_pct
                .unwrap_or(self.overlap_tolerance_pct),
            completion_threshold_pct: overrides
                .completion_threshold_pct
                .unwrap_or(self.completion_threshold_pct),
            confidence_default: self.confidence_default,
        }
    }
}

/// Optional per-parent-area threshold overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThresholdOverrides {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub overlap_tolerance_pct: Option<Pct>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub completion_threshold_pct: Option<Pct>,
}

// === Tests ===
