// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Entity-scoped logging for MACSIM models.
//!
//! Every part of a model owns an [`Entity`](crate::entity::Entity) with a
//! hierarchical name such as `top::pipe::stage2`. Entities emit
//! [`Event`](crate::event::Event)s through a shared [`Tracker`]: text
//! messages at the usual `log` levels plus a few modelling events (creation,
//! the wiring of one stage to the next and the clock advancing).
//!
//! The level at which each entity is enabled is chosen from regular
//! expressions over the entity names, so the detail of one stage can be
//! raised without flooding the output with the rest of the pipeline.

use std::str::FromStr;

pub use log;

pub mod builder;
pub mod entity;
pub mod event;
pub mod test_helpers;
pub mod tracker;

pub use tracker::{Track, Tracker};

/// A sink for text output.
pub type Writer = Box<dyn std::io::Write>;

/// Identifies an entity in the output.
///
/// IDs are allocated by the [`Tracker`] starting at [`ROOT`]. [`NO_ID`] is the
/// parent of the top-level entity.
#[derive(Copy, Clone, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Id(pub u64);

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Parent of the top-level entity.
pub const NO_ID: Id = Id(0);

/// First ID handed out.
pub const ROOT: Id = Id(1);

/// Parse a level name such as `Info` or `trace`.
#[must_use]
pub fn str_to_level(lvl: &str) -> Option<log::Level> {
    log::Level::from_str(lvl).ok()
}

/// Emit an event from an entity if it is enabled at the event's level.
#[macro_export]
macro_rules! emit {
    ($entity:expr ; $event:expr) => {{
        let event = $event;
        if $entity
            .tracker
            .is_entity_enabled($entity.id, event.level())
        {
            $entity.tracker.record($entity.id, &event);
        }
    }};
}

/// Record that `$from` feeds `$to`.
#[macro_export]
macro_rules! connect {
    ($from:expr ; $to:expr) => {
        $crate::emit!($from ; $crate::event::Event::Connected { to: $to.id })
    };
}

/// Record the clock of an entity advancing.
#[macro_export]
macro_rules! set_tick {
    ($entity:expr ; $tick:expr) => {
        $crate::emit!($entity ; $crate::event::Event::Tick($tick))
    };
}

/// Base macro for text messages.
///
/// The message is only formatted if the entity is enabled at the given level.
#[macro_export]
macro_rules! log_base {
    ($entity:expr ; $lvl:expr, $($arg:tt)+) => (
        if $entity.tracker.is_entity_enabled($entity.id, $lvl) {
            $entity.tracker.record(
                $entity.id,
                &$crate::event::Event::Log { level: $lvl, msg: format_args!($($arg)+) },
            );
        }
    );
}

/// Log at `log::Level::Trace`.
#[macro_export]
macro_rules! trace {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Trace, $($arg)+);
    );
}

/// Log at `log::Level::Debug`.
#[macro_export]
macro_rules! debug {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Debug, $($arg)+);
    );
}

/// Log at `log::Level::Info`.
#[macro_export]
macro_rules! info {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Info, $($arg)+);
    );
}

/// Log at `log::Level::Warn`.
#[macro_export]
macro_rules! warn {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Warn, $($arg)+);
    );
}

/// Log at `log::Level::Error`.
#[macro_export]
macro_rules! error {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Error, $($arg)+);
    );
}
