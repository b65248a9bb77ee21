//! crates/gz_core/src/ids.rs
//! Typed identifiers for paddocks, allocations, rotations and events.
//! Deterministic, ASCII-only, strict shapes; no I/O.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors returned when validating or parsing IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdError {
    NonAscii,
    TooLong,
    BadShape,
}

const MAX_ID_LEN: usize = 80;
const TOKEN_MAX_LEN: usize = 64;
const SEQ_LEN: usize = 6;

/// Quickly verify ASCII (no NUL).
#[inline]
fn is_ascii_no_nul(s: &str) -> bool {
    !s.as_bytes().iter().any(|&b| b == 0 || b > 0x7F)
}

/// Token for caller-supplied id parts: ^[A-Za-z0-9_.-]{1,64}$ (ASCII only)
#[inline]
pub fn is_valid_token(s: &str) -> bool {
    let bs = s.as_bytes();
    let len = bs.len();
    if len == 0 || len > TOKEN_MAX_LEN || !is_ascii_no_nul(s) {
        return false;
    }
    bs.iter().all(|&b| {
        b.is_ascii_uppercase()
            || b.is_ascii_lowercase()
            || b.is_ascii_digit()
            || b == b'_'
            || b == b'.'
            || b == b'-'
    })
}

/// Zero-padded decimal sequence part of generated ids: exactly six digits.
#[inline]
fn is_valid_seq(s: &str) -> bool {
    s.len() == SEQ_LEN && s.as_bytes().iter().all(u8::is_ascii_digit)
}

macro_rules! id_string_newtype {
    ($(#[$m:meta])* $name:ident) => {
        $(#[$m])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
        pub struct $name(String);

        impl $name {
            #[inline] pub fn as_str(&self) -> &str { &self.0 }
        }

        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl TryFrom<&str> for $name {
            type Error = IdError;
            #[inline]
            fn try_from(value: &str) -> Result<Self, Self::Error> { value.parse() }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;
            #[inline]
            fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
        }

        impl From<$name> for String {
            #[inline]
            fn from(value: $name) -> String { value.0 }
        }
    }
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::NonAscii => write!(f, "id contains non-ASCII bytes"),
            IdError::TooLong => write!(f, "id too long"),
            IdError::BadShape => write!(f, "id shape mismatch"),
        }
    }
}

impl std::error::Error for IdError {}

// === Caller-named id: PAD ===

id_string_newtype!(
    /// "PAD:" + token ^[A-Za-z0-9_.-]{1,64}$ (caller-chosen, e.g. "PAD:north-40").
    PaddockId
);

impl PaddockId {
    /// Builds a paddock id from a bare token (without the "PAD:" prefix).
    pub fn from_token(token: &str) -> Result<Self, IdError> {
        if !is_valid_token(token) {
            return Err(IdError::BadShape);
        }
        Ok(PaddockId(format!("PAD:{token}")))
    }

    #[inline]
    pub fn token(&self) -> &str {
        &self.0[4..]
    }
}

impl FromStr for PaddockId {
    type Err = IdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_ascii_no_nul(s) { return Err(IdError::NonAscii); }
        if s.len() > MAX_ID_LEN { return Err(IdError::TooLong); }
        if s.as_bytes().get(0..4) != Some(b"PAD:") || !is_valid_token(&s[4..]) {
            return Err(IdError::BadShape);
        }
        Ok(PaddockId(s.to_owned()))
    }
}

// === Generated ids: ALC, ROT, EVT (prefix + six-digit sequence) ===

macro_rules! seq_id_newtype {
    ($(#[$m:meta])* $name:ident, $prefix:literal) => {
        id_string_newtype!($(#[$m])* $name);

        impl $name {
            /// Builds the id for the given store counter value (1-based).
            #[inline]
            pub fn from_counter(n: u64) -> Self {
                $name(format!(concat!($prefix, ":{:06}"), n))
            }

            /// The numeric sequence embedded in the id.
            #[inline]
            pub fn counter(&self) -> u64 {
                // shape is validated on construction; the tail is always digits
                self.0[$prefix.len() + 1..].parse().unwrap_or(0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if !is_ascii_no_nul(s) { return Err(IdError::NonAscii); }
                if s.len() > MAX_ID_LEN { return Err(IdError::TooLong); }
                let plen = $prefix.len() + 1;
                if s.len() != plen + SEQ_LEN
                    || !s.starts_with(concat!($prefix, ":"))
                    || !is_valid_seq(&s[plen..])
                {
                    return Err(IdError::BadShape);
                }
                Ok($name(s.to_owned()))
            }
        }
    }
}

seq_id_newtype!(
    /// "ALC:" + 6-digit sequence, e.g. "ALC:000017".
    AllocationId, "ALC"
);
seq_id_newtype!(
    /// "ROT:" + 6-digit sequence, e.g. "ROT:000002".
    RotationId, "ROT"
);
seq_id_newtype!(
    /// "EVT:" + 6-digit sequence, e.g. "EVT:000103".
    EventId, "EVT"
);

// === Tests ===

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paddock_tokens() {
        for ok in ["north-40", "A", "9", "_", "south.strip-2"] {
            let id = PaddockId::from_token(ok).unwrap();
            assert_eq!(id.token(), ok);
            assert_eq!(format!("{id}"), format!("PAD:{ok}"));
            let parsed: PaddockId = id.as_str().parse().unwrap();
            assert_eq!(parsed, id);
        }
        for bad in ["", " ", "é", "has space", "colon:inside"] {
            assert!(PaddockId::from_token(bad).is_err());
        }
        assert!("north-40".parse::<PaddockId>().is_err()); // missing prefix
    }

    #[test]
    fn generated_shapes() {
        let a = AllocationId::from_counter(17);
        assert_eq!(a.as_str(), "ALC:000017");
        assert_eq!(a.counter(), 17);

        let r: RotationId = "ROT:000002".parse().unwrap();
        assert_eq!(r.counter(), 2);

        assert!("EVT:103".parse::<EventId>().is_err()); // not zero-padded
        assert!("ALC:00001x".parse::<AllocationId>().is_err());
        assert!("ROT:0000022".parse::<RotationId>().is_err()); // too many digits
        assert!("ALC:000001".parse::<RotationId>().is_err()); // wrong prefix
    }
}
