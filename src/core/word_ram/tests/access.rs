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

use super::*;
use std::collections::HashSet;

#[test]
fn test_2m_owner_writes_only() {
    let mut word_ram = WordRam::new();
    word_ram.write16(Side::Main, 0x100, 0xBEEF);
    word_ram.write8(Side::Sub, 0x100, 0x00);
    assert_eq!(word_ram.read16(0x100), 0xBEEF);
    assert_eq!(word_ram.read8(0x101), 0xEF);
}

#[test]
fn test_1m_banks_interleave_words() {
    let mut word_ram = one_meg(false);
    word_ram.write8_bank(0, 0, 0x11);
    word_ram.write8_bank(0, 1, 0x22);
    word_ram.write8_bank(1, 0, 0x33);
    word_ram.write8_bank(1, 1, 0x44);
    word_ram.write8_bank(0, 2, 0x55);

    assert_eq!(&word_ram.contents()[..5], &[0x11, 0x22, 0x33, 0x44, 0x55]);
}

#[test]
fn test_bank_offset_covers_ram_exactly() {
    let mut seen = vec![false; WORD_RAM_SIZE];
    for bank in 0..2 {
        for offset in 0..BANK_SIZE as u32 {
            let physical = WordRam::bank_offset(bank, offset);
            assert!(!seen[physical]);
            seen[physical] = true;
        }
    }
    assert!(seen.iter().all(|&s| s));
}

#[test]
fn test_cell_map_is_bijection() {
    let mapped: HashSet<u32> = (0..CELL_UNITS).map(cell_map).collect();
    assert_eq!(mapped.len(), CELL_UNITS as usize);
    assert!(mapped.iter().all(|&unit| unit < CELL_UNITS));
}

#[test]
fn test_cell_map_screen_boundaries() {
    // Second screen starts at row 256
    assert_eq!(cell_map(0x4000), 0x100 * 64);
    // Third at row 384, fourth at row 448
    assert_eq!(cell_map(0x6000), 0x180 * 64);
    assert_eq!(cell_map(0x7000), 0x1C0 * 64);
    assert_eq!(cell_map(0x7FFF), CELL_UNITS - 1);
}

#[test]
fn test_cell_window_targets_main_bank() {
    let mut word_ram = one_meg(false);
    word_ram.write8_cell(4, 0xAB); // unit 1 -> linear unit 64
    assert_eq!(word_ram.read8_bank(0, 64 * 4), 0xAB);
    assert_eq!(word_ram.read8_cell(4), 0xAB);
    assert_eq!(word_ram.read8_bank(1, 64 * 4), 0x00);
}

#[test]
fn test_nibble_window() {
    let mut word_ram = one_meg(false);
    word_ram.write8_nibble(0, 0x0A);
    word_ram.write8_nibble(1, 0xF5);
    assert_eq!(word_ram.read8_bank(1, 0), 0xA5);
    assert_eq!(word_ram.read8_nibble(0), 0x0A);
    assert_eq!(word_ram.read8_nibble(1), 0x05);
}

#[test]
fn test_nibble_underwrite() {
    let mut word_ram = one_meg(false);
    word_ram.write8_nibble(0, 0x3);
    word_ram.write_sub(0x04 | 0x08);

    word_ram.write8_nibble(0, 0x7); // occupied: kept
    word_ram.write8_nibble(1, 0x7); // empty: written
    assert_eq!(word_ram.read8_bank(1, 0), 0x37);
}

#[test]
fn test_nibble_overwrite() {
    let mut word_ram = one_meg(false);
    word_ram.write8_nibble(0, 0x3);
    word_ram.write_sub(0x04 | 0x10);

    word_ram.write8_nibble(0, 0x0); // transparent: kept
    assert_eq!(word_ram.read8_nibble(0), 0x3);
    word_ram.write8_nibble(0, 0x9);
    assert_eq!(word_ram.read8_nibble(0), 0x9);
}

#[test]
fn test_pixel_access_2m() {
    let mut word_ram = WordRam::new();
    word_ram.write_pixel(0, 0xC);
    word_ram.write_pixel(1, 0x4);
    assert_eq!(word_ram.read8(0), 0xC4);
    assert_eq!(word_ram.pixel(1), 0x4);
}

#[test]
fn test_dma_write_follows_mode() {
    let mut word_ram = WordRam::new();
    word_ram.dma_write(0x10, &[1, 2, 3, 4]);
    assert_eq!(word_ram.read8(0x12), 3);

    let mut word_ram = one_meg(false);
    word_ram.dma_write(0, &[9, 8, 7, 6]);
    assert_eq!(word_ram.read8_bank(1, 0), 9);
    assert_eq!(word_ram.read8_bank(1, 3), 6);
    assert_eq!(word_ram.read8_bank(0, 0), 0);
}
