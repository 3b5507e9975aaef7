//! Clock and random implementations.

use crate::infrastructure::ports::{ClockPort, RandomPort};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// System clock - uses real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// System random - uses the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRandom;

impl RandomPort for SystemRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        use rand::Rng;
        if min >= max {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }

    fn gen_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Adapts a `RandomPort` to the range closure the domain expects.
pub fn range_fn(random: &dyn RandomPort) -> impl FnMut(i32, i32) -> i32 + '_ {
    move |min, max| random.gen_range(min, max)
}

/// Fixed clock for testing.
#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Plays back a fixed sequence of rolls, repeating the last one.
///
/// Each roll is clamped into the requested range.
#[cfg(test)]
pub struct ScriptedRandom {
    rolls: std::sync::Mutex<std::collections::VecDeque<i32>>,
    last: std::sync::Mutex<i32>,
}

#[cfg(test)]
impl ScriptedRandom {
    pub fn new(rolls: impl IntoIterator<Item = i32>) -> Self {
        Self {
            rolls: std::sync::Mutex::new(rolls.into_iter().collect()),
            last: std::sync::Mutex::new(1),
        }
    }
}

#[cfg(test)]
impl RandomPort for ScriptedRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.rolls.lock().unwrap().pop_front() {
            *last = next;
        }
        (*last).clamp(min, max.max(min))
    }

    fn gen_uuid(&self) -> Uuid {
        Uuid::nil()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_random_stays_in_range() {
        let random = SystemRandom;
        for _ in 0..200 {
            let roll = random.gen_range(1, 6);
            assert!((1..=6).contains(&roll));
        }
        assert_eq!(random.gen_range(4, 4), 4);
    }

    #[test]
    fn scripted_random_repeats_last_roll() {
        let random = ScriptedRandom::new([3, 5]);
        let mut roll = range_fn(&random);
        assert_eq!(roll(1, 6), 3);
        assert_eq!(roll(1, 6), 5);
        assert_eq!(roll(1, 6), 5);
        assert_eq!(roll(1, 4), 4);
    }
}
