//! Timing aggregation
//!
//! Reduces a set of animations, or the children of a timeline, to the single
//! delay/duration/end-delay envelope of the instance that owns them.

/// Anything with a position on an instance's local time axis
pub trait Timed {
    /// Offset of this item inside its parent timeline
    fn timeline_offset(&self) -> f64 {
        0.0
    }

    fn delay(&self) -> f64;

    fn duration(&self) -> f64;

    fn end_delay(&self) -> f64;
}

/// Aggregate timing envelope
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Timings {
    /// Earliest point at which any item starts changing
    pub delay: f64,
    /// Latest end of any item
    pub duration: f64,
    /// Hold between the last change and `duration`
    pub end_delay: f64,
}

impl Timings {
    /// Envelope of `items`, or `None` when there are none
    pub fn aggregate<'a, T, I>(items: I) -> Option<Self>
    where
        T: Timed + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut delay = f64::INFINITY;
        let mut duration = f64::NEG_INFINITY;
        let mut change_end = f64::NEG_INFINITY;
        let mut any = false;

        for item in items {
            let offset = item.timeline_offset();
            let end = offset + item.duration();
            delay = delay.min(offset + item.delay());
            duration = duration.max(end);
            change_end = change_end.max(end - item.end_delay());
            any = true;
        }

        any.then(|| Timings {
            delay,
            duration,
            end_delay: duration - change_end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item(f64, f64, f64, f64);

    impl Timed for Item {
        fn timeline_offset(&self) -> f64 {
            self.0
        }
        fn delay(&self) -> f64 {
            self.1
        }
        fn duration(&self) -> f64 {
            self.2
        }
        fn end_delay(&self) -> f64 {
            self.3
        }
    }

    #[test]
    fn test_empty() {
        assert_eq!(Timings::aggregate::<Item, _>(&[]), None);
    }

    #[test]
    fn test_min_delay_max_duration() {
        let items = [Item(0.0, 100.0, 500.0, 0.0), Item(200.0, 50.0, 400.0, 0.0)];
        let timings = Timings::aggregate(&items).unwrap();
        assert_eq!(timings.delay, 100.0);
        assert_eq!(timings.duration, 600.0);
        assert_eq!(timings.end_delay, 0.0);
    }

    #[test]
    fn test_end_delay_is_shortest_hold() {
        let items = [Item(0.0, 0.0, 1000.0, 300.0), Item(0.0, 0.0, 900.0, 100.0)];
        let timings = Timings::aggregate(&items).unwrap();
        assert_eq!(timings.duration, 1000.0);
        assert_eq!(timings.end_delay, 200.0);
    }
}
