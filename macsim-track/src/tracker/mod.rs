// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The [`Track`] interface and its implementations.

pub mod multi_tracker;
pub mod text;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::rc::Rc;

pub use multi_tracker::MultiTracker;
use regex::Regex;
pub use text::TextTracker;

use crate::event::Event;
use crate::{Id, ROOT};

/// A tracker could not be configured.
#[derive(Debug)]
pub struct TrackConfigError(pub String);

impl fmt::Display for TrackConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Track config error: {}", self.0)
    }
}

impl std::error::Error for TrackConfigError {}

/// Receives the events of every entity.
pub trait Track {
    /// Allocate the ID of a new entity.
    fn unique_id(&self) -> Id;

    /// Register an entity so that its level can be chosen from its name.
    fn add_entity(&self, id: Id, full_name: &str);

    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool;

    /// Record an event. Callers check [`Track::is_entity_enabled`] first.
    fn record(&self, id: Id, event: &Event);

    /// Flush any buffered output.
    fn shutdown(&self);
}

/// A [`Track`] shared by all entities of a model.
pub type Tracker = Rc<dyn Track>;

/// Create a [`Tracker`] that writes every event at or above `level` to
/// `stdout`.
#[must_use]
pub fn stdout_tracker(level: log::Level) -> Tracker {
    let writer = Box::new(io::BufWriter::new(io::stdout()));
    Rc::new(TextTracker::new(EntityLevels::new(level), writer))
}

/// Chooses the level of each entity and allocates IDs.
pub struct EntityLevels {
    default_level: log::Level,

    /// Checked in order, the first match wins.
    filters: Vec<(Regex, log::Level)>,

    next_id: Cell<u64>,

    /// Entities whose level differs from the default.
    overrides: RefCell<HashMap<Id, log::Level>>,
}

impl EntityLevels {
    #[must_use]
    pub fn new(default_level: log::Level) -> Self {
        Self {
            default_level,
            filters: Vec::new(),
            next_id: Cell::new(ROOT.0),
            overrides: RefCell::new(HashMap::new()),
        }
    }

    /// Give entities whose full name matches `regex` the level `level`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use macsim_track::tracker::EntityLevels;
    /// let mut levels = EntityLevels::new(log::Level::Warn);
    /// levels.add_filter(".*stage1.*", log::Level::Trace).unwrap();
    /// ```
    pub fn add_filter(&mut self, regex: &str, level: log::Level) -> Result<(), TrackConfigError> {
        let re = Regex::new(regex)
            .map_err(|e| TrackConfigError(format!("Failed to parse regex {regex}:\n{e}\n")))?;
        self.filters.push((re, level));
        Ok(())
    }

    pub(crate) fn unique_id(&self) -> Id {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Id(id)
    }

    pub(crate) fn add_entity(&self, id: Id, full_name: &str) {
        let level = self.level_for(full_name);
        if level != self.default_level {
            self.overrides.borrow_mut().insert(id, level);
        }
    }

    pub(crate) fn is_enabled(&self, id: Id, level: log::Level) -> bool {
        let entity_level = self
            .overrides
            .borrow()
            .get(&id)
            .copied()
            .unwrap_or(self.default_level);
        level <= entity_level
    }

    fn level_for(&self, full_name: &str) -> log::Level {
        self.filters
            .iter()
            .find(|(re, _)| re.is_match(full_name))
            .map_or(self.default_level, |(_, level)| *level)
    }
}

#[cfg(test)]
mod tests {
    use log::Level;

    use super::*;

    const NAMES: [&str; 4] = ["top", "top::pipe", "top::pipe::stage0", "top::pipe::stage1"];

    fn levels_of(levels: &EntityLevels) -> Vec<Level> {
        NAMES.iter().map(|n| levels.level_for(n)).collect()
    }

    #[test]
    fn default_only() {
        let levels = EntityLevels::new(Level::Error);
        assert_eq!(levels_of(&levels), vec![Level::Error; 4]);
    }

    #[test]
    fn one_stage() {
        let mut levels = EntityLevels::new(Level::Error);
        levels.add_filter(r".*stage0", Level::Warn).unwrap();
        assert_eq!(
            levels_of(&levels),
            vec![Level::Error, Level::Error, Level::Warn, Level::Error]
        );
    }

    #[test]
    fn first_filter_wins() {
        let mut levels = EntityLevels::new(Level::Error);
        levels.add_filter(r".*stage0", Level::Info).unwrap();
        levels.add_filter(r".*pipe.*", Level::Trace).unwrap();
        levels.add_filter(r"top.*", Level::Warn).unwrap();
        assert_eq!(
            levels_of(&levels),
            vec![Level::Warn, Level::Trace, Level::Info, Level::Trace]
        );
    }

    #[test]
    fn enabled_by_id() {
        let mut levels = EntityLevels::new(Level::Warn);
        levels.add_filter(r".*stage1", Level::Debug).unwrap();
        let ids: Vec<Id> = NAMES
            .iter()
            .map(|n| {
                let id = levels.unique_id();
                levels.add_entity(id, n);
                id
            })
            .collect();
        assert_eq!(ids[0], ROOT);
        assert!(levels.is_enabled(ids[3], Level::Debug));
        assert!(!levels.is_enabled(ids[3], Level::Trace));
        assert!(!levels.is_enabled(ids[2], Level::Info));
        assert!(levels.is_enabled(ids[2], Level::Warn));
    }

    #[test]
    fn bad_regex() {
        let mut levels = EntityLevels::new(Level::Error);
        assert!(levels.add_filter(r"(", Level::Info).is_err());
    }
}
