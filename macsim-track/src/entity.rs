// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Named parts of a model.

use std::fmt;
use std::rc::Rc;

use crate::event::Event;
use crate::{Id, NO_ID, Tracker, emit};

const SEPARATOR: &str = "::";

/// A named node in the model hierarchy.
///
/// Only the entity returned by [`toplevel`] has no parent.
pub struct Entity {
    /// Local name, unique among siblings.
    pub name: String,

    pub parent: Option<Rc<Entity>>,

    /// Allocated by the tracker when the entity is created.
    pub id: Id,

    pub tracker: Tracker,

    full_name: String,
}

impl Entity {
    /// Create a child of `parent`.
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        let full_name = format!("{}{SEPARATOR}{name}", parent.full_name);
        Entity::register(Some(parent.clone()), name, full_name, parent.tracker.clone())
    }

    fn register(parent: Option<Rc<Entity>>, name: &str, full_name: String, tracker: Tracker) -> Self {
        let id = tracker.unique_id();
        tracker.add_entity(id, &full_name);
        let entity = Self {
            name: name.to_string(),
            parent,
            id,
            tracker,
            full_name,
        };

        let parent_id = entity.parent.as_ref().map_or(NO_ID, |p| p.id);
        emit!(entity ; Event::Created {
            parent: parent_id,
            full_name: &entity.full_name,
        });
        entity
    }

    /// The names of all ancestors and this entity joined by `::`.
    #[must_use]
    pub fn full_name(&self) -> String {
        self.full_name.clone()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({:?} {})", self.id, self.full_name)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// Implemented by anything that owns an [`Entity`].
pub trait GetEntity {
    fn entity(&self) -> &Rc<Entity>;
}

/// Create the root of an entity hierarchy.
pub fn toplevel(tracker: &Tracker, name: &str) -> Rc<Entity> {
    Rc::new(Entity::register(
        None,
        name,
        name.to_string(),
        tracker.clone(),
    ))
}
