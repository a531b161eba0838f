// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Word RAM tests
//!
//! - `handshake`: DMNA/RET transitions, delayed grant, ownership
//! - `access`: 2M/1M addressing, cell map, nibble writes

use super::*;

mod access;

/// Word RAM switched to 1M mode by the sub CPU
fn one_meg(ret: bool) -> WordRam {
    let mut word_ram = WordRam::new();
    word_ram.write_sub(0x04 | ret as u8);
    word_ram
}
