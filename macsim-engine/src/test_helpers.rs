// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::rc::Rc;

use macsim_track::entity::{Entity, toplevel};
use macsim_track::test_helpers::create_tracker;

/// Create the top-level entity for a test.
#[must_use]
pub fn start_test(full_filepath: &str) -> Rc<Entity> {
    toplevel(&create_tracker(full_filepath), "top")
}
