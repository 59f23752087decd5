//! Source of "today" for the generator.
//!
//! The occurrence calculator never reads the clock; only
//! [`Engine::generate_recurring`](crate::Engine::generate_recurring) does, through
//! the [`Clock`] the engine was built with.

use chrono::{Local, NaiveDate};

pub trait Clock: Send + Sync + std::fmt::Debug {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock date in the local timezone.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to a single date.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
