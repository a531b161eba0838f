// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Test fixtures for common test scenarios

use mcdrx::core::cdd::{checksum, BLOCK_LEN};
use mcdrx::core::cdrom::{DiscImage, TrackType, SECTOR_SIZE};
use mcdrx::core::config::Config;
use mcdrx::core::system::SegaCd;

/// Sub CPU Gate Array base
#[allow(dead_code)]
pub const SUB_GATE: u32 = 0xFF8000;

/// Main CPU Gate Array base
#[allow(dead_code)]
pub const MAIN_GATE: u32 = 0xA12000;

/// Sectors in the data track of the test disc
#[allow(dead_code)]
pub const DATA_SECTORS: u32 = 150;

/// Sectors in the audio track of the test disc
#[allow(dead_code)]
pub const AUDIO_SECTORS: u32 = 75;

/// Create a system with the default configuration
#[allow(dead_code)]
pub fn create_test_system() -> SegaCd {
    SegaCd::new(Config::default()).expect("default configuration is valid")
}

/// Raw image bytes where every sector holds `offset % 251`
#[allow(dead_code)]
pub fn patterned_sectors(count: u32) -> Vec<u8> {
    (0..count as usize * SECTOR_SIZE)
        .map(|i| ((i % SECTOR_SIZE) % 251) as u8)
        .collect()
}

/// Data track followed by an audio track
#[allow(dead_code)]
pub fn create_test_disc() -> DiscImage {
    DiscImage::from_tracks(
        patterned_sectors(DATA_SECTORS + AUDIO_SECTORS),
        &[(TrackType::Data, DATA_SECTORS), (TrackType::Audio, AUDIO_SECTORS)],
    )
    .expect("layout covers the image")
}

/// Write a CDD command block through the sub CPU window
#[allow(dead_code)]
pub fn send_cdd_command(cd: &mut SegaCd, opcode: u8, params: [u8; 6]) {
    let mut block = [0u8; BLOCK_LEN];
    block[0] = opcode;
    block[2..8].copy_from_slice(&params);
    block[BLOCK_LEN - 1] = checksum(&block);
    for (i, &nibble) in block.iter().enumerate() {
        cd.sub_write8(SUB_GATE + 0x42 + i as u32, nibble);
    }
}

/// Select a CDC register and write consecutive values
#[allow(dead_code)]
pub fn write_cdc_registers(cd: &mut SegaCd, first: u8, values: &[u8]) {
    cd.sub_write8(SUB_GATE + 0x05, first);
    for &value in values {
        cd.sub_write8(SUB_GATE + 0x07, value);
    }
}

/// Select a CDC register and read `count` consecutive values
#[allow(dead_code)]
pub fn read_cdc_registers(cd: &mut SegaCd, first: u8, count: usize) -> Vec<u8> {
    cd.sub_write8(SUB_GATE + 0x05, first);
    (0..count).map(|_| cd.sub_read8(SUB_GATE + 0x07)).collect()
}

/// Tick until `done` holds, panicking after `limit` ticks
#[allow(dead_code)]
pub fn tick_until(cd: &mut SegaCd, limit: u32, mut done: impl FnMut(&mut SegaCd) -> bool) -> u32 {
    for ticks in 0..limit {
        if done(cd) {
            return ticks;
        }
        cd.tick();
    }
    panic!("condition not reached within {} ticks", limit);
}
