//! Staggering
//!
//! A [`Stagger`] fans a value out across targets: each target's value grows
//! with its distance from a reference index, or from a reference cell when the
//! targets are laid out on a grid.
//!
//! ```rust
//! use cadence_animation::{AnimationParams, Stagger, StaggerFrom};
//!
//! let params = AnimationParams::new()
//!     .targets(".dot")
//!     .prop("translateX", Stagger::range("-10px", "10px"))
//!     .delay(Stagger::new(50).from(StaggerFrom::Center));
//! ```

use crate::easing::Easing;
use crate::keyframe::{KeyValue, Param, PropertyValue};
use crate::value::{parse_float, unit_of, Value};
use cadence_core::{format_number, TargetId};
use std::cell::RefCell;
use std::rc::Rc;

/// Reference point distances are measured from
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum StaggerFrom {
    #[default]
    First,
    Center,
    Last,
    Index(usize),
}

/// Restrict grid distances to one axis
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// A number, or text with a unit such as `"10px"`
#[derive(Clone, Debug, PartialEq)]
pub struct StaggerValue {
    number: f64,
    unit: Option<String>,
}

impl From<f64> for StaggerValue {
    fn from(number: f64) -> Self {
        Self { number, unit: None }
    }
}

impl From<i32> for StaggerValue {
    fn from(number: i32) -> Self {
        Self::from(number as f64)
    }
}

impl From<&str> for StaggerValue {
    fn from(text: &str) -> Self {
        Self {
            number: parse_float(text).unwrap_or(0.0),
            unit: unit_of(text),
        }
    }
}

/// Per-target value generator
#[derive(Clone, Debug)]
pub struct Stagger {
    value: StaggerValue,
    range_end: Option<StaggerValue>,
    from: StaggerFrom,
    reverse: bool,
    easing: Option<Easing>,
    grid: Option<(usize, usize)>,
    axis: Option<Axis>,
    start: f64,
}

impl Stagger {
    /// Step of `value` per unit of distance
    pub fn new(value: impl Into<StaggerValue>) -> Self {
        Self {
            value: value.into(),
            range_end: None,
            from: StaggerFrom::First,
            reverse: false,
            easing: None,
            grid: None,
            axis: None,
            start: 0.0,
        }
    }

    /// Spread values from `first` to `last` over the distance range
    pub fn range(first: impl Into<StaggerValue>, last: impl Into<StaggerValue>) -> Self {
        Self {
            range_end: Some(last.into()),
            ..Self::new(first)
        }
    }

    pub fn from(mut self, from: StaggerFrom) -> Self {
        self.from = from;
        self
    }

    /// Hand out the largest values first
    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Reshape distances through an easing. Unparseable expressions are
    /// logged and ignored.
    pub fn easing(mut self, easing: &str) -> Self {
        match Easing::parse(easing) {
            Ok(easing) => self.easing = Some(easing),
            Err(err) => tracing::warn!(%err, "ignoring stagger easing"),
        }
        self
    }

    /// Lay targets out row by row on a `columns` x `rows` grid
    pub fn grid(mut self, columns: usize, rows: usize) -> Self {
        self.grid = Some((columns.max(1), rows));
        self
    }

    pub fn axis(mut self, axis: Axis) -> Self {
        self.axis = Some(axis);
        self
    }

    /// Value of the reference target; defaults to the range start
    pub fn start(mut self, start: f64) -> Self {
        self.start = start;
        self
    }

    fn unit(&self) -> Option<&str> {
        match &self.range_end {
            Some(end) => end.unit.as_deref(),
            None => self.value.unit.as_deref(),
        }
    }

    fn from_index(&self, total: usize) -> f64 {
        match self.from {
            StaggerFrom::First => 0.0,
            StaggerFrom::Center => (total as f64 - 1.0) / 2.0,
            StaggerFrom::Last => total as f64 - 1.0,
            StaggerFrom::Index(i) => i as f64,
        }
    }

    /// Distance of every index from the reference, shaped and normalized
    fn distances(&self, total: usize) -> (Vec<f64>, f64) {
        let from = self.from_index(total);
        let center = self.from == StaggerFrom::Center;
        let mut values: Vec<f64> = (0..total)
            .map(|index| match self.grid {
                None => (from - index as f64).abs(),
                Some((columns, rows)) => {
                    let (from_x, from_y) = if center {
                        ((columns as f64 - 1.0) / 2.0, (rows as f64 - 1.0) / 2.0)
                    } else {
                        (from % columns as f64, (from / columns as f64).floor())
                    };
                    let dx = from_x - (index % columns) as f64;
                    let dy = from_y - (index / columns) as f64;
                    match self.axis {
                        Some(Axis::X) => -dx,
                        Some(Axis::Y) => -dy,
                        None => (dx * dx + dy * dy).sqrt(),
                    }
                }
            })
            .collect();
        let max = values.iter().copied().fold(0.0, f64::max);

        if let (Some(easing), true) = (&self.easing, max != 0.0) {
            for v in &mut values {
                *v = easing.apply(*v / max) * max;
            }
        }
        if self.reverse {
            for v in &mut values {
                *v = if self.axis.is_some() { -*v } else { (max - *v).abs() };
            }
        }
        (values, max)
    }

    /// Numeric value for target `index` of `total`, given memoized distances
    fn value_at(&self, distances: &[f64], max: f64, index: usize) -> f64 {
        let first = self.value.number;
        let start = if self.start != 0.0 {
            self.start
        } else if self.range_end.is_some() {
            first
        } else {
            0.0
        };
        let spacing = match &self.range_end {
            Some(_) if max == 0.0 => 0.0,
            Some(end) => (end.number - first) / max,
            None => first,
        };
        let distance = distances.get(index).copied().unwrap_or(0.0);
        start + spacing * ((distance * 100.0).round() / 100.0)
    }

    /// Generator returning the number for `(target, index, total)`. Distances
    /// are computed on the first call and reused afterwards.
    pub fn numbers(self) -> impl Fn(TargetId, usize, usize) -> f64 {
        let memo: RefCell<Option<(Vec<f64>, f64)>> = RefCell::new(None);
        move |_target, index, total| {
            let mut memo = memo.borrow_mut();
            let (distances, max) = memo.get_or_insert_with(|| self.distances(total));
            self.value_at(distances, *max, index)
        }
    }

    /// Generator returning a property value, carrying the unit if any
    pub fn values(self) -> impl Fn(TargetId, usize, usize) -> Value {
        let unit = self.unit().map(str::to_string);
        let numbers = self.numbers();
        move |target, index, total| {
            let number = numbers(target, index, total);
            match &unit {
                Some(unit) => Value::Text(format!("{}{}", format_number(number), unit)),
                None => Value::Number(number),
            }
        }
    }
}

impl From<Stagger> for Param {
    fn from(stagger: Stagger) -> Self {
        Param::PerTarget(Rc::new(stagger.numbers()))
    }
}

impl From<Stagger> for KeyValue {
    fn from(stagger: Stagger) -> Self {
        KeyValue::PerTarget(Rc::new(stagger.values()))
    }
}

impl From<Stagger> for PropertyValue {
    fn from(stagger: Stagger) -> Self {
        PropertyValue::from(KeyValue::from(stagger))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(stagger: Stagger, total: usize) -> Vec<f64> {
        let f = stagger.numbers();
        (0..total).map(|i| f(TargetId(i as u64), i, total)).collect()
    }

    #[test]
    fn test_linear() {
        assert_eq!(numbers(Stagger::new(10), 4), vec![0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_from_center_and_last() {
        assert_eq!(
            numbers(Stagger::new(10).from(StaggerFrom::Center), 5),
            vec![20.0, 10.0, 0.0, 10.0, 20.0]
        );
        assert_eq!(
            numbers(Stagger::new(10).from(StaggerFrom::Last), 3),
            vec![20.0, 10.0, 0.0]
        );
        assert_eq!(
            numbers(Stagger::new(10).from(StaggerFrom::Index(1)), 3),
            vec![10.0, 0.0, 10.0]
        );
    }

    #[test]
    fn test_range() {
        assert_eq!(
            numbers(Stagger::range(-360, 360), 5),
            vec![-360.0, -180.0, 0.0, 180.0, 360.0]
        );
    }

    #[test]
    fn test_start_and_reverse() {
        assert_eq!(
            numbers(Stagger::new(10).start(100.0), 3),
            vec![100.0, 110.0, 120.0]
        );
        assert_eq!(numbers(Stagger::new(10).reversed(), 3), vec![20.0, 10.0, 0.0]);
    }

    #[test]
    fn test_grid() {
        let values = numbers(Stagger::new(10).grid(2, 2), 4);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[1], 10.0);
        assert_eq!(values[2], 10.0);
        // sqrt(2) rounded to two decimals
        assert!((values[3] - 14.1).abs() < 1e-9);

        let x_axis = numbers(Stagger::new(10).grid(3, 1).axis(Axis::X), 3);
        assert_eq!(x_axis, vec![0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_units_carry_through() {
        let f = Stagger::new("10px").values();
        assert_eq!(f(TargetId(1), 2, 3), Value::Text("20px".to_string()));
        let f = Stagger::new(1.5).values();
        assert_eq!(f(TargetId(1), 2, 3), Value::Number(3.0));
    }

    #[test]
    fn test_single_target_range() {
        assert_eq!(numbers(Stagger::range(5, 50), 1), vec![5.0]);
    }
}
