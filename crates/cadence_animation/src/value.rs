//! Value model
//!
//! Property values are decomposed into numeric parts that can be
//! interpolated and a template that recomposes them:
//!
//! - `Number`: a plain number
//! - `Unit`: a number with a CSS unit suffix (`100px`, `45deg`)
//! - `Color`: four RGBA channels
//! - `Path`: a distance along a motion path
//! - `Complex`: any other text, split into numbers and the strings around them
//!
//! Text values may carry a relative operator prefix (`+=`, `-=`, `*=`), which
//! is resolved against the preceding value when tweens are built.

use crate::color::{format_rgba, is_color, parse_color};
use crate::path::{path_progress, PathMotion};
use cadence_core::{format_number, Host, RawValue};
use regex::Regex;
use std::sync::OnceLock;

/// The smallest positive duration; zero durations are replaced by it so that
/// progress ratios never divide by zero.
pub const MIN_DURATION: f64 = 5e-324;

const DIGITS: &str = r"[+-]?\d*\.?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?";

fn digits_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DIGITS).expect("Invalid regex pattern"))
}

fn units_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"^({DIGITS})+(%|px|pt|em|rem|in|cm|mm|ex|ch|pc|vw|vh|vmin|vmax|deg|rad|turn)$"
        ))
        .expect("Invalid regex pattern")
    })
}

fn leading_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("Invalid regex pattern")
    })
}

/// Split `100px` into `(100, "px")`; `None` when the text is not a number
/// followed by a known unit.
pub fn split_unit(text: &str) -> Option<(f64, String)> {
    let caps = units_regex().captures(text)?;
    let number = caps.get(1)?.as_str().parse().ok()?;
    Some((number, caps.get(2)?.as_str().to_string()))
}

/// The unit suffix of a value, if it has a known one
pub fn unit_of(text: &str) -> Option<String> {
    split_unit(text).map(|(_, unit)| unit)
}

/// Parse the leading number of `text`, ignoring anything after it
pub fn parse_float(text: &str) -> Option<f64> {
    leading_number_regex()
        .find(text)
        .and_then(|m| m.as_str().trim().parse().ok())
}

/// Round `value` to a granularity of `1 / base`, halves rounding up
pub fn round_to(value: f64, base: f64) -> f64 {
    if base == 0.0 {
        return value;
    }
    (value * base + 0.5).floor() / base
}

// =============================================================================
// Input values
// =============================================================================

/// A property value as supplied by the caller or read from a target
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    /// A point on a motion path, see [`crate::path::path`]
    Path(PathMotion),
}

impl Value {
    /// Numeric reading of the value (leading number for text)
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Text(s) => parse_float(s).unwrap_or(0.0),
            Value::Path(p) => p.total_length,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<RawValue> for Value {
    fn from(value: RawValue) -> Self {
        match value {
            RawValue::Number(n) => Value::Number(n),
            RawValue::Text(s) => Value::Text(s),
        }
    }
}

impl From<PathMotion> for Value {
    fn from(value: PathMotion) -> Self {
        Value::Path(value)
    }
}

// =============================================================================
// Decomposition
// =============================================================================

/// Relative value operator prefix
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelativeOperator {
    /// `+=`
    Add,
    /// `-=`
    Subtract,
    /// `*=`
    Multiply,
}

impl RelativeOperator {
    /// Split a leading operator off `text`
    pub fn strip(text: &str) -> (Option<Self>, &str) {
        if let Some(rest) = text.strip_prefix("+=") {
            (Some(RelativeOperator::Add), rest)
        } else if let Some(rest) = text.strip_prefix("-=") {
            (Some(RelativeOperator::Subtract), rest)
        } else if let Some(rest) = text.strip_prefix("*=") {
            (Some(RelativeOperator::Multiply), rest)
        } else {
            (None, text)
        }
    }

    /// Combine a base value with an operand
    pub fn apply(&self, base: f64, operand: f64) -> f64 {
        match self {
            RelativeOperator::Add => base + operand,
            RelativeOperator::Subtract => base - operand,
            RelativeOperator::Multiply => base * operand,
        }
    }
}

/// Type tag of a decomposed value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueType {
    Number,
    Unit,
    Color,
    Path,
    Complex,
}

/// A value broken into interpolatable parts
#[derive(Clone, Debug, PartialEq)]
pub enum DecomposedValue {
    Number(f64),
    Unit {
        number: f64,
        unit: String,
    },
    Color([f64; 4]),
    Path {
        path: PathMotion,
        number: f64,
        unit: String,
    },
    Complex {
        numbers: Vec<f64>,
        strings: Vec<String>,
    },
}

impl Default for DecomposedValue {
    fn default() -> Self {
        DecomposedValue::Number(0.0)
    }
}

impl DecomposedValue {
    pub fn kind(&self) -> ValueType {
        match self {
            DecomposedValue::Number(_) => ValueType::Number,
            DecomposedValue::Unit { .. } => ValueType::Unit,
            DecomposedValue::Color(_) => ValueType::Color,
            DecomposedValue::Path { .. } => ValueType::Path,
            DecomposedValue::Complex { .. } => ValueType::Complex,
        }
    }

    /// The single interpolated number of scalar kinds; the first part of
    /// multi-part kinds.
    pub fn number(&self) -> f64 {
        match self {
            DecomposedValue::Number(n) => *n,
            DecomposedValue::Unit { number, .. } | DecomposedValue::Path { number, .. } => *number,
            DecomposedValue::Color(channels) => channels[0],
            DecomposedValue::Complex { numbers, .. } => numbers.first().copied().unwrap_or(0.0),
        }
    }

    /// Replace the scalar number; no-op for multi-part kinds
    pub fn set_number(&mut self, value: f64) {
        match self {
            DecomposedValue::Number(n) => *n = value,
            DecomposedValue::Unit { number, .. } | DecomposedValue::Path { number, .. } => {
                *number = value
            }
            DecomposedValue::Color(_) | DecomposedValue::Complex { .. } => {}
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            DecomposedValue::Unit { unit, .. } | DecomposedValue::Path { unit, .. } => Some(unit),
            _ => None,
        }
    }

    /// The numeric parts of multi-part kinds
    pub fn numbers(&self) -> Option<&[f64]> {
        match self {
            DecomposedValue::Color(channels) => Some(channels),
            DecomposedValue::Complex { numbers, .. } => Some(numbers),
            _ => None,
        }
    }

    pub fn strings(&self) -> Option<&[String]> {
        match self {
            DecomposedValue::Complex { strings, .. } => Some(strings),
            _ => None,
        }
    }

    fn complex_from_text(text: &str) -> Self {
        let regex = digits_regex();
        let numbers: Vec<f64> = regex
            .find_iter(text)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();
        let strings = regex.split(text).map(str::to_string).collect();
        DecomposedValue::Complex {
            numbers: if numbers.is_empty() { vec![0.0] } else { numbers },
            strings,
        }
    }
}

/// Break a value into its interpolatable parts plus any relative operator
pub fn decompose(value: &Value) -> (DecomposedValue, Option<RelativeOperator>) {
    let text = match value {
        Value::Number(n) => return (DecomposedValue::Number(*n), None),
        Value::Path(path) => {
            return (
                DecomposedValue::Path {
                    number: path.total_length,
                    path: path.clone(),
                    unit: String::new(),
                },
                None,
            )
        }
        Value::Text(text) => text,
    };

    if let Some(n) = RawValue::Text(text.clone()).as_number() {
        return (DecomposedValue::Number(n), None);
    }

    let (operator, rest) = RelativeOperator::strip(text);
    if let Some((number, unit)) = split_unit(rest) {
        return (DecomposedValue::Unit { number, unit }, operator);
    }
    if operator.is_some() {
        let number = RawValue::Text(rest.to_string()).as_number().unwrap_or_else(|| {
            tracing::warn!(value = %text, "relative value is not a number; using 0");
            0.0
        });
        return (DecomposedValue::Number(number), operator);
    }
    if is_color(rest) {
        match parse_color(rest) {
            Some(channels) => return (DecomposedValue::Color(channels), None),
            None => tracing::warn!(value = %rest, "malformed color; treating as complex value"),
        }
    }
    (DecomposedValue::complex_from_text(rest), None)
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Coerce `from` and `to` to a common type so they can be interpolated
pub fn reconcile(from: &mut DecomposedValue, to: &mut DecomposedValue) {
    if from.kind() == to.kind() {
        return;
    }

    if let DecomposedValue::Complex { strings, .. } = &*to {
        *from = DecomposedValue::Complex {
            numbers: vec![scalar_or_zero(from)],
            strings: strings.clone(),
        };
    } else if let DecomposedValue::Complex { strings, .. } = &*from {
        *to = DecomposedValue::Complex {
            numbers: vec![scalar_or_zero(to)],
            strings: strings.clone(),
        };
    } else if let (DecomposedValue::Unit { unit, .. }, DecomposedValue::Path { unit: to_unit, .. }) =
        (&*from, &mut *to)
    {
        *to_unit = unit.clone();
    } else if let DecomposedValue::Unit { unit, .. } = &*to {
        *from = DecomposedValue::Unit {
            number: scalar_or_zero(from),
            unit: unit.clone(),
        };
    } else if let DecomposedValue::Unit { unit, .. } = &*from {
        *to = DecomposedValue::Unit {
            number: scalar_or_zero(to),
            unit: unit.clone(),
        };
    } else if matches!(to, DecomposedValue::Color(_)) {
        *from = DecomposedValue::Color([0.0; 4]);
    } else if matches!(from, DecomposedValue::Color(_)) {
        *to = DecomposedValue::Color([0.0; 4]);
    }
}

fn scalar_or_zero(value: &DecomposedValue) -> f64 {
    match value {
        DecomposedValue::Color(_) => 0.0,
        other => other.number(),
    }
}

/// When both sides are multi-part with differing part counts, zero the
/// `from` parts and adopt the `to` template so the two line up.
pub fn pad_parts(from: &mut DecomposedValue, to: &DecomposedValue) {
    let (Some(from_numbers), Some(to_numbers)) = (from.numbers(), to.numbers()) else {
        return;
    };
    if from_numbers.len() == to_numbers.len() {
        return;
    }
    let target_len = to_numbers.len();
    if let DecomposedValue::Complex { numbers, strings } = from {
        if numbers.len() < target_len {
            numbers.resize(target_len, 0.0);
        }
        numbers[..target_len].fill(0.0);
        if let Some(to_strings) = to.strings() {
            for (i, s) in to_strings.iter().enumerate() {
                match strings.get_mut(i) {
                    Some(slot) => slot.clone_from(s),
                    None => strings.push(s.clone()),
                }
            }
        }
    }
}

// =============================================================================
// Recomposition
// =============================================================================

fn lerp(from: f64, to: f64, progress: f64) -> f64 {
    if progress == 1.0 {
        return to;
    }
    from + progress * (to - from)
}

fn rounded(value: f64, round: f64) -> f64 {
    if round == 0.0 {
        value
    } else {
        round_to(value, round)
    }
}

/// Interpolate between two reconciled values and render the result.
///
/// `progress` is eased progress; the boundaries reproduce `from` and `to`
/// exactly.
pub fn recompose(
    from: &DecomposedValue,
    to: &DecomposedValue,
    progress: f64,
    round: f64,
    host: &dyn Host,
) -> RawValue {
    match to {
        DecomposedValue::Number(to_number) => {
            RawValue::Number(rounded(lerp(from.number(), *to_number, progress), round))
        }
        DecomposedValue::Unit { number, unit } => {
            let value = rounded(lerp(from.number(), *number, progress), round);
            RawValue::Text(format!("{}{}", format_number(value), unit))
        }
        DecomposedValue::Color(to_channels) => {
            let from_channels = match from {
                DecomposedValue::Color(channels) => *channels,
                _ => [0.0; 4],
            };
            let mut channels = [0.0; 4];
            for i in 0..4 {
                let value = lerp(from_channels[i], to_channels[i], progress);
                channels[i] = if i < 3 { round_to(value, 1.0) } else { value };
            }
            RawValue::Text(format_rgba(channels))
        }
        DecomposedValue::Path { path, number, unit } => {
            let value = path_progress(host, path, progress * number, round);
            RawValue::Text(format!("{}{}", format_number(value), unit))
        }
        DecomposedValue::Complex { numbers, strings } => {
            let from_numbers = from.numbers().unwrap_or(&[]);
            let mut out = strings.first().cloned().unwrap_or_default();
            for (j, to_number) in numbers.iter().enumerate() {
                let from_number = from_numbers.get(j).copied().unwrap_or(0.0);
                let value = rounded(lerp(from_number, *to_number, progress), round);
                out.push_str(&format_number(value));
                if let Some(next) = strings.get(j + 1) {
                    out.push_str(next);
                }
            }
            RawValue::Text(out)
        }
    }
}
