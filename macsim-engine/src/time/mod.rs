// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

pub mod clock;
