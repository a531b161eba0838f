// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! System module tests
//!
//! - `gate`: Gate Array routing from both windows
//! - `bus`: address decoding, ownership and protection
//! - `peripherals`: CDC, CDD, timer and graphics through the register file
//! - `scheduler`: processor contract, reset release, spin-poll syncs

use super::*;
use crate::core::cdrom::{DiscImage, TrackType, SECTOR_SIZE};
use crate::core::gate_array::fields;

mod peripherals;

/// Main CPU Gate Array base
const MAIN_GATE: u32 = 0xA12000;

/// Sub CPU Gate Array base
const SUB_GATE: u32 = 0xFF8000;

fn system() -> SegaCd {
    SegaCd::new(Config::default()).unwrap()
}

/// Let the sub CPU run (SRES=1, SBRQ=0)
fn release_sub(cd: &mut SegaCd) {
    cd.main_write8(MAIN_GATE + 1, 0x01);
}

/// Enable sub interrupt levels
fn enable_levels(cd: &mut SegaCd, levels: &[u8]) {
    let mask = levels.iter().fold(0u8, |mask, level| mask | (1 << level));
    cd.sub_write8(SUB_GATE + 0x33, mask);
}

/// One data track of 150 sectors and one audio track of 75
fn test_disc() -> Box<DiscImage> {
    Box::new(
        DiscImage::from_tracks(
            vec![0x5A; 225 * SECTOR_SIZE],
            &[(TrackType::Data, 150), (TrackType::Audio, 75)],
        )
        .unwrap(),
    )
}
