// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::cell::Cell;

use crate::event::Event;
use crate::tracker::{Track, Tracker};
use crate::{Id, ROOT};

/// Sends every event to several trackers, each with its own levels.
///
/// IDs are allocated here so that all trackers agree on them.
pub struct MultiTracker {
    next_id: Cell<u64>,
    trackers: Vec<Tracker>,
}

impl MultiTracker {
    pub fn add_tracker(&mut self, tracker: Tracker) {
        self.trackers.push(tracker);
    }
}

impl Default for MultiTracker {
    fn default() -> Self {
        Self {
            next_id: Cell::new(ROOT.0),
            trackers: Vec::new(),
        }
    }
}

impl Track for MultiTracker {
    fn unique_id(&self) -> Id {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Id(id)
    }

    fn add_entity(&self, id: Id, full_name: &str) {
        for tracker in &self.trackers {
            tracker.add_entity(id, full_name);
        }
    }

    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool {
        self.trackers
            .iter()
            .any(|tracker| tracker.is_entity_enabled(id, level))
    }

    fn record(&self, id: Id, event: &Event) {
        let level = event.level();
        for tracker in &self.trackers {
            if tracker.is_entity_enabled(id, level) {
                tracker.record(id, event);
            }
        }
    }

    fn shutdown(&self) {
        for tracker in &self.trackers {
            tracker.shutdown();
        }
    }
}
