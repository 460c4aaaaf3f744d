//! Easing functions for animations
//!
//! Every easing maps normalized progress `[0, 1]` to eased progress. Penner
//! families are built from a single ease-in curve and mirrored into the out,
//! in-out and out-in variants. Expressions such as `easeOutElastic(1, .5)`,
//! `cubicBezier(.5, 0, .5, 1)`, `steps(5)` or `spring(1, 80, 10, 0)` parse
//! with [`Easing::parse`].

use crate::spring::SpringConfig;
use std::f64::consts::PI;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Easing expression errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EasingError {
    #[error("Unknown easing '{0}'")]
    UnknownName(String),

    #[error("Invalid parameters for easing '{name}': {reason}")]
    InvalidParameters { name: String, reason: String },
}

/// Base ease-in curves of the Penner families
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Curve {
    Quad,
    Cubic,
    Quart,
    Quint,
    /// Sixth power, continuing the polynomial family
    Expo,
    Sine,
    Circ,
    Back,
    Bounce,
    Elastic { amplitude: f64, period: f64 },
}

impl Curve {
    fn from_name(name: &str, args: &[f64]) -> Option<Self> {
        Some(match name {
            "Quad" => Curve::Quad,
            "Cubic" => Curve::Cubic,
            "Quart" => Curve::Quart,
            "Quint" => Curve::Quint,
            "Expo" => Curve::Expo,
            "Sine" => Curve::Sine,
            "Circ" => Curve::Circ,
            "Back" => Curve::Back,
            "Bounce" => Curve::Bounce,
            "Elastic" => Curve::Elastic {
                amplitude: args.first().copied().unwrap_or(1.0),
                period: args.get(1).copied().unwrap_or(0.5),
            },
            _ => return None,
        })
    }

    /// The ease-in form of this curve
    pub fn ease_in(&self, t: f64) -> f64 {
        match *self {
            Curve::Quad => t.powi(2),
            Curve::Cubic => t.powi(3),
            Curve::Quart => t.powi(4),
            Curve::Quint => t.powi(5),
            Curve::Expo => t.powi(6),
            Curve::Sine => 1.0 - (t * PI / 2.0).cos(),
            Curve::Circ => 1.0 - (1.0 - t * t).sqrt(),
            Curve::Back => t * t * (3.0 * t - 2.0),
            Curve::Bounce => {
                let mut b = 4;
                let mut pow2;
                loop {
                    b -= 1;
                    pow2 = 2f64.powi(b);
                    if t >= (pow2 - 1.0) / 11.0 || b <= 0 {
                        break;
                    }
                }
                1.0 / 4f64.powi(3 - b) - 7.5625 * ((pow2 * 3.0 - 2.0) / 22.0 - t).powi(2)
            }
            Curve::Elastic { amplitude, period } => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let a = amplitude.clamp(1.0, 10.0);
                let p = period.clamp(0.1, 2.0);
                let s = p / (PI * 2.0) * (1.0 / a).asin();
                -a * 2f64.powf(10.0 * (t - 1.0)) * (((t - 1.0) - s) * (PI * 2.0) / p).sin()
            }
        }
    }
}

/// Easing function type
#[derive(Clone, Default)]
pub enum Easing {
    #[default]
    Linear,
    In(Curve),
    Out(Curve),
    InOut(Curve),
    OutIn(Curve),
    /// CSS-style cubic bezier; x control points lie in `[0, 1]`
    CubicBezier(f64, f64, f64, f64),
    /// Stairstep quantization into `n` steps
    Steps(u32),
    /// Damped harmonic oscillator, optionally stretched over a duration (ms)
    Spring {
        config: SpringConfig,
        duration: Option<f64>,
    },
    /// Caller-supplied curve
    Custom(Rc<dyn Fn(f64) -> f64>),
}

impl fmt::Debug for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Easing::Linear => f.write_str("Linear"),
            Easing::In(c) => f.debug_tuple("In").field(c).finish(),
            Easing::Out(c) => f.debug_tuple("Out").field(c).finish(),
            Easing::InOut(c) => f.debug_tuple("InOut").field(c).finish(),
            Easing::OutIn(c) => f.debug_tuple("OutIn").field(c).finish(),
            Easing::CubicBezier(a, b, c, d) => f
                .debug_tuple("CubicBezier")
                .field(a)
                .field(b)
                .field(c)
                .field(d)
                .finish(),
            Easing::Steps(n) => f.debug_tuple("Steps").field(n).finish(),
            Easing::Spring { config, duration } => f
                .debug_struct("Spring")
                .field("config", config)
                .field("duration", duration)
                .finish(),
            Easing::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Easing {
    /// Apply the easing function to a progress value (0.0 to 1.0)
    pub fn apply(&self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::In(curve) => curve.ease_in(t),
            Easing::Out(curve) => 1.0 - curve.ease_in(1.0 - t),
            Easing::InOut(curve) => {
                if t < 0.5 {
                    curve.ease_in(t * 2.0) / 2.0
                } else {
                    1.0 - curve.ease_in(t * -2.0 + 2.0) / 2.0
                }
            }
            Easing::OutIn(curve) => {
                if t < 0.5 {
                    (1.0 - curve.ease_in(1.0 - t * 2.0)) / 2.0
                } else {
                    (curve.ease_in(t * 2.0 - 1.0) + 1.0) / 2.0
                }
            }
            Easing::CubicBezier(x1, y1, x2, y2) => {
                if x1 == y1 && x2 == y2 {
                    return t;
                }
                cubic_bezier_ease(t, *x1, *y1, *x2, *y2)
            }
            Easing::Steps(steps) => {
                let n = (*steps).max(1) as f64;
                (t.clamp(0.000001, 1.0) * n).ceil() * (1.0 / n)
            }
            Easing::Spring { config, duration } => config.solve(t, *duration),
            Easing::Custom(f) => f(t),
        }
    }

    /// Build a cubic bezier easing, rejecting x control points outside `[0, 1]`
    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, EasingError> {
        if !((0.0..=1.0).contains(&x1) && (0.0..=1.0).contains(&x2)) {
            return Err(EasingError::InvalidParameters {
                name: "cubicBezier".to_string(),
                reason: format!("x control points must lie in [0, 1], got {x1} and {x2}"),
            });
        }
        Ok(Easing::CubicBezier(x1, y1, x2, y2))
    }

    /// Wrap an arbitrary easing curve
    pub fn custom(f: impl Fn(f64) -> f64 + 'static) -> Self {
        Easing::Custom(Rc::new(f))
    }

    /// Parse an easing expression
    pub fn parse(expr: &str) -> Result<Self, EasingError> {
        Self::parse_with_duration(expr, None)
    }

    /// Parse an easing expression; spring easings are stretched over
    /// `duration` milliseconds when one is given.
    pub fn parse_with_duration(expr: &str, duration: Option<f64>) -> Result<Self, EasingError> {
        let expr = expr.trim();
        let name = expr.split('(').next().unwrap_or_default().trim();
        let args = parse_easing_parameters(expr).map_err(|reason| EasingError::InvalidParameters {
            name: name.to_string(),
            reason,
        })?;

        match name {
            "linear" => Ok(Easing::Linear),
            "spring" => Ok(Easing::Spring {
                config: SpringConfig::from_params(&args),
                duration,
            }),
            "cubicBezier" => match args.as_slice() {
                [x1, y1, x2, y2] => Self::cubic_bezier(*x1, *y1, *x2, *y2),
                _ => Err(EasingError::InvalidParameters {
                    name: name.to_string(),
                    reason: format!("expected 4 parameters, got {}", args.len()),
                }),
            },
            "steps" => {
                let steps = args.first().copied().unwrap_or(10.0);
                if steps < 1.0 {
                    return Err(EasingError::InvalidParameters {
                        name: name.to_string(),
                        reason: format!("step count must be at least 1, got {steps}"),
                    });
                }
                Ok(Easing::Steps(steps as u32))
            }
            _ => {
                let (variant, curve_name) = if let Some(rest) = name.strip_prefix("easeInOut") {
                    (Easing::InOut as fn(Curve) -> Easing, rest)
                } else if let Some(rest) = name.strip_prefix("easeOutIn") {
                    (Easing::OutIn as fn(Curve) -> Easing, rest)
                } else if let Some(rest) = name.strip_prefix("easeIn") {
                    (Easing::In as fn(Curve) -> Easing, rest)
                } else if let Some(rest) = name.strip_prefix("easeOut") {
                    (Easing::Out as fn(Curve) -> Easing, rest)
                } else {
                    return Err(EasingError::UnknownName(name.to_string()));
                };
                Curve::from_name(curve_name, &args)
                    .map(variant)
                    .ok_or_else(|| EasingError::UnknownName(name.to_string()))
            }
        }
    }
}

/// Whether an easing expression names a spring
pub fn is_spring_expression(expr: &str) -> bool {
    expr.trim_start().starts_with("spring")
}

/// Extract the comma-separated numbers inside the first parenthesized group
fn parse_easing_parameters(expr: &str) -> Result<Vec<f64>, String> {
    let Some(open) = expr.find('(') else {
        return Ok(Vec::new());
    };
    let Some(close) = expr[open..].find(')') else {
        return Err("missing closing parenthesis".to_string());
    };
    let inner = &expr[open + 1..open + close];
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|p| {
            let p = p.trim();
            p.parse::<f64>()
                .map_err(|_| format!("'{p}' is not a number"))
        })
        .collect()
}

/// Polynomial form of one axis of a cubic bezier anchored at 0 and 1
#[derive(Clone, Copy)]
struct BezierAxis {
    a: f64,
    b: f64,
    c: f64,
}

impl BezierAxis {
    fn new(p1: f64, p2: f64) -> Self {
        Self {
            a: 1.0 - 3.0 * p2 + 3.0 * p1,
            b: 3.0 * p2 - 6.0 * p1,
            c: 3.0 * p1,
        }
    }

    fn at(&self, p: f64) -> f64 {
        ((self.a * p + self.b) * p + self.c) * p
    }

    fn slope(&self, p: f64) -> f64 {
        (3.0 * self.a * p + 2.0 * self.b) * p + self.c
    }
}

const NEWTON_ITERATIONS: usize = 4;
const NEWTON_MIN_SLOPE: f64 = 1e-3;
const SUBDIVISION_PRECISION: f64 = 1e-7;
const SUBDIVISION_MAX_ITERATIONS: usize = 20;

/// Cubic bezier easing, solved the way CSS `cubic-bezier()` is.
fn cubic_bezier_ease(t: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let x_axis = BezierAxis::new(x1, x2);
    let y_axis = BezierAxis::new(y1, y2);
    y_axis.at(solve_parameter(&x_axis, t))
}

/// Curve parameter whose x equals `x`. Newton steps first; a flat slope
/// switches to bisection.
fn solve_parameter(axis: &BezierAxis, x: f64) -> f64 {
    let mut guess = x;
    for _ in 0..NEWTON_ITERATIONS {
        let slope = axis.slope(guess);
        if slope.abs() < NEWTON_MIN_SLOPE {
            return bisect(axis, x);
        }
        let offset = axis.at(guess) - x;
        if offset.abs() < SUBDIVISION_PRECISION {
            return guess;
        }
        guess -= offset / slope;
    }
    if (axis.at(guess) - x).abs() < SUBDIVISION_PRECISION {
        guess
    } else {
        bisect(axis, x)
    }
}

fn bisect(axis: &BezierAxis, x: f64) -> f64 {
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    let mut mid = x;
    for _ in 0..SUBDIVISION_MAX_ITERATIONS {
        let offset = axis.at(mid) - x;
        if offset.abs() < SUBDIVISION_PRECISION {
            break;
        }
        if offset < 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = (lo + hi) / 2.0;
    }
    mid
}
