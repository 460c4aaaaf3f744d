//! Color parsing
//!
//! Hex (`#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`), `rgb()`/`rgba()` and
//! `hsl()`/`hsla()` strings normalize to four RGBA channels. Channels are
//! 0-255, alpha is 0-1.

use cadence_core::format_number;
use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

const NUM: &str = r"(-?\d+|-?\d*\.\d+)";

fn case_insensitive(
    cell: &'static OnceLock<Regex>,
    pattern: impl FnOnce() -> String,
) -> &'static Regex {
    cell.get_or_init(|| {
        RegexBuilder::new(&pattern())
            .case_insensitive(true)
            .build()
            .expect("Invalid regex pattern")
    })
}

fn hex_test() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    case_insensitive(&RE, || r"(^#([\da-f]{3}){1,2}$)|(^#([\da-f]{4}){1,2}$)".to_string())
}

fn rgb_exec() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    case_insensitive(&RE, || r"rgb\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*\)".to_string())
}

fn rgba_exec() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    case_insensitive(&RE, || {
        format!(r"rgba\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*,\s*{NUM}\s*\)")
    })
}

fn hsl_exec() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    case_insensitive(&RE, || format!(r"hsl\(\s*{NUM}\s*,\s*{NUM}%\s*,\s*{NUM}%\s*\)"))
}

fn hsla_exec() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    case_insensitive(&RE, || {
        format!(r"hsla\(\s*{NUM}\s*,\s*{NUM}%\s*,\s*{NUM}%\s*,\s*{NUM}\s*\)")
    })
}

/// Whether `value` looks like a color literal
pub fn is_color(value: &str) -> bool {
    is_hex(value) || has_prefix(value, "rgb") || has_prefix(value, "hsl")
}

fn is_hex(value: &str) -> bool {
    hex_test().is_match(value)
}

fn has_prefix(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Parse a color literal into `[r, g, b, a]`
///
/// Returns `None` for text that is not a color, or that claims a color prefix
/// but does not parse.
pub fn parse_color(value: &str) -> Option<[f64; 4]> {
    if has_prefix(value, "rgb") {
        parse_rgb(value)
    } else if is_hex(value) {
        parse_hex(value)
    } else if has_prefix(value, "hsl") {
        parse_hsl(value)
    } else {
        None
    }
}

fn capture_f64(caps: &regex::Captures<'_>, i: usize) -> Option<f64> {
    caps.get(i)?.as_str().parse().ok()
}

fn parse_rgb(value: &str) -> Option<[f64; 4]> {
    if let Some(caps) = rgb_exec().captures(value) {
        return Some([
            capture_f64(&caps, 1)?,
            capture_f64(&caps, 2)?,
            capture_f64(&caps, 3)?,
            1.0,
        ]);
    }
    let caps = rgba_exec().captures(value)?;
    Some([
        capture_f64(&caps, 1)?,
        capture_f64(&caps, 2)?,
        capture_f64(&caps, 3)?,
        capture_f64(&caps, 4)?,
    ])
}

fn parse_hex(value: &str) -> Option<[f64; 4]> {
    let digits: Vec<u8> = value
        .bytes()
        .skip(1)
        .map(|b| (b as char).to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()?;
    let short = digits.len() == 3 || digits.len() == 4;
    let channel = |i: usize| -> f64 {
        if short {
            (digits[i] * 17) as f64
        } else {
            (digits[i * 2] * 16 + digits[i * 2 + 1]) as f64
        }
    };
    let alpha = if digits.len() == 4 || digits.len() == 8 {
        (channel(3) / 255.0 * 1000.0).round() / 1000.0
    } else {
        1.0
    };
    Some([channel(0), channel(1), channel(2), alpha])
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

fn parse_hsl(value: &str) -> Option<[f64; 4]> {
    let caps = hsl_exec()
        .captures(value)
        .or_else(|| hsla_exec().captures(value))?;
    let h = capture_f64(&caps, 1)? / 360.0;
    let s = capture_f64(&caps, 2)? / 100.0;
    let l = capture_f64(&caps, 3)? / 100.0;
    let a = capture_f64(&caps, 4).unwrap_or(1.0);
    let (r, g, b) = if s == 0.0 {
        (l, l, l)
    } else {
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        (
            hue_to_rgb(p, q, h + 1.0 / 3.0),
            hue_to_rgb(p, q, h),
            hue_to_rgb(p, q, h - 1.0 / 3.0),
        )
    };
    Some([
        (r * 255.0 + 0.5).floor(),
        (g * 255.0 + 0.5).floor(),
        (b * 255.0 + 0.5).floor(),
        a,
    ])
}

/// Serialize channels as `rgba(r,g,b,a)`
pub fn format_rgba(channels: [f64; 4]) -> String {
    format!(
        "rgba({},{},{},{})",
        format_number(channels[0]),
        format_number(channels[1]),
        format_number(channels[2]),
        format_number(channels[3])
    )
}
