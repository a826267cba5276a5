//! Exact duration computation
//!
//! Computes the rational duration of one note object: base value, dotted
//! expansion, tuplet rescaling, and church-style rest scaling against the
//! ambient time signature. All arithmetic is exact; no floating point.

use crate::dom::{Document, NodeId};
use crate::errors::DurationError;
use crate::event::EventKind;
use num_rational::Rational64;

/// Exact rational used for all durations and positions
pub type Rational = Rational64;

/// Upper bound on tuplet search steps. Any real tuplet resolves within a
/// handful of steps; malformed descriptors would otherwise never converge.
const TUPLET_SEARCH_LIMIT: u32 = 64;

/// Parse `"3"` or `"3/4"` as an exact rational.
pub fn parse_rational(s: &str) -> Result<Rational, DurationError> {
    let trimmed = s.trim();
    let (numer, denom) = match trimmed.split_once('/') {
        Some((n, d)) => (n.trim(), d.trim()),
        None => (trimmed, "1"),
    };
    let numer: i64 = numer
        .parse()
        .map_err(|_| DurationError::InvalidRational(s.to_string()))?;
    let denom: i64 = denom
        .parse()
        .map_err(|_| DurationError::InvalidRational(s.to_string()))?;
    if denom == 0 {
        return Err(DurationError::InvalidRational(s.to_string()));
    }
    Ok(Rational::new(numer, denom))
}

/// Resolve a time signature to its rational meter. Named signatures map to
/// fixed meters; anything else must read as a rational.
pub fn timesig_meter(time_sign: &str) -> Result<Rational, DurationError> {
    match time_sign {
        "allaBreve" => Ok(Rational::new(2, 2)),
        "longAllaBreve" => Ok(Rational::new(4, 2)),
        "C" => Ok(Rational::new(4, 4)),
        "infinite" => Ok(Rational::new(999, 4)),
        other => parse_rational(other)
            .map_err(|_| DurationError::UnknownTimeSignature(other.to_string())),
    }
}

/// `base + Σ_{k=1..dots} base / 2^k`
fn dotted_value(base: Rational, dots: u32) -> Rational {
    let mut value = base;
    let mut half = base;
    for _ in 0..dots {
        half = half / 2;
        value += half;
    }
    value
}

/// Find the nearest integer `z` to `count`, stepping in the direction given
/// by `prolong`, such that `z / f` is an exact power of two, where `f` is 3
/// for tripartite tuplets and 1 otherwise.
fn resolve_tuplet(count: i64, tripartite: bool, prolong: bool) -> Result<i64, DurationError> {
    let f: i64 = if tripartite { 3 } else { 1 };
    let step: i64 = if prolong { 1 } else { -1 };
    let mut z = count + step;
    for _ in 0..TUPLET_SEARCH_LIMIT {
        if z < 1 {
            break;
        }
        if z % f == 0 && ((z / f) as u64).is_power_of_two() {
            return Ok(z);
        }
        z += step;
    }
    Err(DurationError::TupletNonConvergent { count })
}

fn parse_attr<T: std::str::FromStr>(
    doc: &Document,
    node: NodeId,
    name: &'static str,
) -> Result<Option<T>, DurationError> {
    match doc.attribute(node, name) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| DurationError::InvalidAttribute {
                name,
                value: raw.to_string(),
            }),
    }
}

/// Exact duration of one note object under the ambient time signature.
///
/// An event without a `duration` descendant has duration zero. A rest whose
/// display marks it church style occupies a whole measure: its value is
/// scaled by the ambient meter.
pub fn event_duration(
    doc: &Document,
    node: NodeId,
    kind: EventKind,
    time_sign: &str,
) -> Result<Rational, DurationError> {
    let duration_el = match doc.descendant(node, "duration") {
        Some(d) => d,
        None => return Ok(Rational::from_integer(0)),
    };

    let base = doc
        .attribute(duration_el, "base")
        .ok_or(DurationError::MissingBase)?;
    let dots: u32 = parse_attr(doc, duration_el, "dots")?.unwrap_or(0);
    let mut value = dotted_value(parse_rational(base)?, dots);

    if let Some(tuplet) = doc.find(duration_el, "tuplet") {
        let count: i64 = parse_attr(doc, tuplet, "count")?.unwrap_or(2);
        if count < 1 {
            return Err(DurationError::InvalidAttribute {
                name: "count",
                value: count.to_string(),
            });
        }
        let tripartite = doc.attribute(tuplet, "tripartite") == Some("true");
        let prolong = doc.attribute(tuplet, "prolong") == Some("true");
        let z = resolve_tuplet(count, tripartite, prolong)?;
        value *= Rational::new(z, count);
    }

    if kind == EventKind::Rest {
        if let Some(display) = doc.descendant(node, "display") {
            if doc.attribute(display, "churchStyle") == Some("true") {
                value *= timesig_meter(time_sign)?;
            }
        }
    }

    Ok(value)
}

/// True if the duration descriptor suppresses position advancement.
pub fn is_no_duration(doc: &Document, node: NodeId) -> bool {
    doc.descendant(node, "duration")
        .and_then(|d| doc.attribute(d, "noDuration"))
        == Some("true")
}
