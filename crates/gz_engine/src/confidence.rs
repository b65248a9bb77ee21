//! crates/gz_engine/src/confidence.rs
//! Best-effort recovery of a confidence value from malformed upstream
//! output, plus normalization onto the 0..=100 scale.
//!
//! The known failure mode: the producer appends something like
//! `</justification>\n<parameter name="confidence">0.55` to the
//! justification text instead of filling the confidence field. The grammar
//! recognized here is deliberately narrow, and this module is the only
//! place that touches it, so it can be deleted once upstream output is
//! fixed without touching core logic. This pass is pure data cleansing and
//! never fails.

use std::sync::OnceLock;

use regex::Regex;

use gz_core::variables::Pct;

/// Confidence and cleaned justification after recovery + normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfidence {
    pub confidence: Pct,
    pub justification: String,
}

fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<parameter\s+name=["']confidence["']>\s*([0-9]*\.?[0-9]+)"#)
            .expect("confidence marker pattern is valid")
    })
}

fn trailer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Everything from the marker to the end of the text is malformed
        // tool-call residue, not prose.
        Regex::new(r#"(?is)<parameter\s+name=["']confidence["'].*$"#)
            .expect("confidence trailer pattern is valid")
    })
}

fn closing_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</justification>").expect("closing tag pattern is valid"))
}

/// Extracts an embedded confidence marker from justification text, if any,
/// returning the value and the cleaned text.
fn extract_embedded(justification: &str) -> (Option<f64>, String) {
    let Some(caps) = marker_re().captures(justification) else {
        return (None, justification.to_string());
    };
    let extracted = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok());

    let cleaned = closing_tag_re().replace_all(justification, "");
    let cleaned = trailer_re().replace(&cleaned, "");
    (
        extracted.filter(|v| v.is_finite()),
        cleaned.trim().to_string(),
    )
}

/// Normalizes a resolved value onto 0..=100:
/// missing or non-finite → `default`; values in [0, 1] are scaled by 100
/// and rounded; anything else is rounded and clamped into range.
fn normalize(value: Option<f64>, default: Pct) -> Pct {
    match value {
        None => default,
        Some(v) if !v.is_finite() => default,
        Some(v) if (0.0..=1.0).contains(&v) => Pct::from_f64_clamped(v * 100.0),
        Some(v) => Pct::from_f64_clamped(v),
    }
}

/// Resolves the final confidence: an explicitly supplied value wins over
/// one extracted from the justification text; either way the marker is
/// stripped from the returned justification.
pub fn resolve_confidence(
    explicit: Option<f64>,
    justification: &str,
    default: Pct,
) -> ResolvedConfidence {
    let (extracted, cleaned) = extract_embedded(justification);
    ResolvedConfidence {
        confidence: normalize(explicit.or(extracted), default),
        justification: cleaned,
    }
}

// === Tests ===
