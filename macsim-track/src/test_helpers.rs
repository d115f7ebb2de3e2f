// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Capture and check the events emitted by a model under test.

use std::cell::{Cell, RefCell};

use regex::Regex;

use crate::entity::toplevel;
use crate::event::Event;
use crate::{Id, Track, Tracker};

/// Keeps every event as a line of text. All entities are enabled.
pub struct TestTracker {
    events: RefCell<Vec<String>>,

    unique_id: Cell<u64>,
}

impl TestTracker {
    /// IDs are allocated from `initial_id`.
    #[must_use]
    pub fn new(initial_id: u64) -> Self {
        Self {
            events: RefCell::new(Vec::new()),
            unique_id: Cell::new(initial_id),
        }
    }

    /// Return the number of events recorded since the last clear.
    #[must_use]
    pub fn num_events(&self) -> usize {
        self.events.borrow().len()
    }
}

impl Track for TestTracker {
    fn unique_id(&self) -> Id {
        let id = self.unique_id.get();
        self.unique_id.set(id + 1);
        Id(id)
    }

    fn add_entity(&self, _id: Id, _full_name: &str) {}

    fn is_entity_enabled(&self, _id: Id, _level: log::Level) -> bool {
        true
    }

    fn record(&self, id: Id, event: &Event) {
        let line = event.line(id);
        println!("{line}");
        self.events.borrow_mut().push(line);
    }

    fn shutdown(&self) {}
}

/// Create a [`TestTracker`] starting at the given ID.
///
/// Evaluates to the [`TestTracker`], for checking, and the same object as a
/// [`Tracker`](crate::Tracker), for the model.
///
/// # Examples
///
/// ```
/// use macsim_track::test_helpers;
///
/// let (test_tracker, tracker) = macsim_track::test_init!(10);
/// let top = macsim_track::entity::toplevel(&tracker, "top");
/// test_helpers::check_and_clear(&test_tracker, &["0: created 10, top"]);
/// ```
#[macro_export]
macro_rules! test_init {
    ($start_id:expr) => {{
        let test_tracker = std::rc::Rc::new($crate::test_helpers::TestTracker::new($start_id));
        let tracker: $crate::Tracker = test_tracker.clone();
        (test_tracker, tracker)
    }};
}

/// Assert that the lines recorded since the last check match the `expected`
/// regular expressions one for one, then forget them.
pub fn check_and_clear(tracker: &TestTracker, expected: &[&str]) {
    let lines: Vec<String> = tracker.events.borrow_mut().drain(..).collect();
    assert_eq!(
        lines.len(),
        expected.len(),
        "expected {expected:#?}\ngot {lines:#?}"
    );
    for (pattern, line) in expected.iter().zip(&lines) {
        let re = Regex::new(pattern).unwrap();
        assert!(re.is_match(line), "'{line}' does not match '{pattern}'");
    }
}

/// Create a stdout tracker for a test named after its source file.
///
/// The level can be raised with the `MACSIM_TEST_LOG` environment variable.
#[must_use]
pub fn create_tracker(test_file: &str) -> Tracker {
    let level = std::env::var("MACSIM_TEST_LOG")
        .ok()
        .and_then(|lvl| crate::str_to_level(&lvl))
        .unwrap_or(log::Level::Warn);
    let tracker = crate::tracker::stdout_tracker(level);
    let top = toplevel(&tracker, "test");
    crate::info!(top ; "Running {test_file}");
    tracker
}
