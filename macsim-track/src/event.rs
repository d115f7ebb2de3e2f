// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The events an [`Entity`](crate::entity::Entity) can emit.

use std::fmt;

use crate::Id;

#[derive(Clone, Copy, Debug)]
pub enum Event<'a> {
    /// The entity was created as a child of `parent`.
    Created { parent: Id, full_name: &'a str },

    /// The entity's output was wired to entity `to`.
    Connected { to: Id },

    /// The clock of the entity advanced to `tick`.
    Tick(u64),

    /// A text message.
    Log {
        level: log::Level,
        msg: fmt::Arguments<'a>,
    },
}

impl Event<'_> {
    /// The level at which this event is emitted.
    #[must_use]
    pub fn level(&self) -> log::Level {
        match self {
            Event::Log { level, .. } => *level,
            _ => log::Level::Trace,
        }
    }

    /// Format the event emitted by entity `id` as a single line.
    #[must_use]
    pub fn line(&self, id: Id) -> String {
        match self {
            Event::Created { parent, full_name } => format!("{parent}: created {id}, {full_name}"),
            Event::Connected { to } => format!("{id}: connect to {to}"),
            Event::Tick(tick) => format!("{id}: tick {tick}"),
            Event::Log { level, msg } => format!("{id}:{level}: {msg}"),
        }
    }
}
