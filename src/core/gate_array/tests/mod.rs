// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Gate Array tests
//!
//! - `registers`: field table, busreq latch, timer, stopwatch, font
//! - `comm`: mailbox ownership and spin-poll detection

use super::*;
use crate::core::config::SyncConfig;

mod comm;

fn gate() -> GateArray {
    GateArray::new(&SyncConfig::default())
}
