// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::cell::RefCell;
use std::io::Write;

use crate::event::Event;
use crate::tracker::{EntityLevels, Track};
use crate::{Id, Writer};

/// Writes one line per event.
pub struct TextTracker {
    levels: EntityLevels,
    writer: RefCell<Writer>,
}

impl TextTracker {
    #[must_use]
    pub fn new(levels: EntityLevels, writer: Writer) -> Self {
        Self {
            levels,
            writer: RefCell::new(writer),
        }
    }
}

impl Track for TextTracker {
    fn unique_id(&self) -> Id {
        self.levels.unique_id()
    }

    fn add_entity(&self, id: Id, full_name: &str) {
        self.levels.add_entity(id, full_name);
    }

    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool {
        self.levels.is_enabled(id, level)
    }

    fn record(&self, id: Id, event: &Event) {
        // Output is best effort
        let _ = writeln!(self.writer.borrow_mut(), "{}", event.line(id));
    }

    fn shutdown(&self) {
        let _ = self.writer.borrow_mut().flush();
    }
}
