//! Test utilities for the backend crate.
//!
//! Shared fixtures for unit tests in `src/`. Only compiled for tests.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::document::{FieldValue, Fields};
use crate::domain::{Codename, HEIST_DURATION, Heist, HeistId, User, UserId};

/// Clock whose reading only moves when a test advances it.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => panic!("failed to convert Duration to TimeDelta: {error}"),
        };
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Monday 5 January 2026, 09:30 UTC.
pub fn fixed_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 1, 5, 9, 30, 0) {
        chrono::LocalResult::Single(now) => now,
        _ => panic!("fixture timestamp is unambiguous"),
    }
}

/// Member `id` with a codename derived from the id.
pub fn user(id: &str) -> User {
    User {
        id: UserId::new(id).expect("fixture user id"),
        email: format!("{id}@example.com"),
        display_name: Some(Codename::new(format!("Agent{id}")).expect("fixture codename")),
    }
}

/// Stored heist fields as the document store returns them.
pub fn heist_fields(created_by: &str, assigned_to: &str, created_at: DateTime<Utc>) -> Fields {
    Fields::from([
        ("title".to_owned(), FieldValue::from("Stapler")),
        (
            "description".to_owned(),
            FieldValue::from("Liberate the red stapler"),
        ),
        ("createdBy".to_owned(), FieldValue::from(created_by)),
        ("createdByCodename".to_owned(), FieldValue::from("SlyFoxDances")),
        ("assignedTo".to_owned(), FieldValue::from(assigned_to)),
        ("assignedToCodename".to_owned(), FieldValue::from("BoldOwlLeaps")),
        ("createdAt".to_owned(), FieldValue::from(created_at)),
        (
            "deadline".to_owned(),
            FieldValue::from(created_at + HEIST_DURATION),
        ),
        ("finalStatus".to_owned(), FieldValue::Null),
    ])
}

/// Decoded heist created at `created_at`.
pub fn sample_heist(id: &str, created_at: DateTime<Utc>) -> Heist {
    Heist {
        id: HeistId::new(id),
        title: "Stapler".to_owned(),
        description: "Liberate the red stapler".to_owned(),
        created_by: UserId::new("owner").expect("fixture user id"),
        created_by_codename: "SlyFoxDances".to_owned(),
        assigned_to: UserId::new("crew").expect("fixture user id"),
        assigned_to_codename: "BoldOwlLeaps".to_owned(),
        created_at,
        deadline: created_at + HEIST_DURATION,
        final_status: None,
    }
}
