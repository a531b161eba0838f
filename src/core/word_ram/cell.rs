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

//! Cell-arranged address transform
//!
//! In 1M mode the main CPU can see its bank through a second window where
//! consecutive 4-byte units walk down 8-pixel-wide cell columns instead of
//! along rows. The window is split into four screens of decreasing height
//! (256, 128, 64 and 32 rows of 64 columns).

/// Number of 4-byte units in one bank
pub const CELL_UNITS: u32 = 0x8000;

/// Map a unit index of the cell-arranged window to a linear unit index
///
/// # Arguments
///
/// * `unit` - Index of the 4-byte unit in the cell-arranged window (0-0x7FFF)
///
/// # Returns
///
/// Index of the 4-byte unit inside the bank
///
/// # Example
///
/// ```
/// use mcdrx::core::word_ram::cell_map;
///
/// // The first column runs down 256 rows of 64 units
/// assert_eq!(cell_map(0), 0);
/// assert_eq!(cell_map(1), 64);
/// assert_eq!(cell_map(0x100), 1);
/// ```
#[inline]
pub fn cell_map(unit: u32) -> u32 {
    let unit = unit & (CELL_UNITS - 1);
    let (col, row) = match unit >> 12 {
        0..=3 => (unit >> 8, unit & 0xFF),
        4 | 5 => (unit >> 7, (unit & 0x7F) | 0x100),
        6 => (unit >> 6, (unit & 0x3F) | 0x180),
        _ => (unit >> 5, (unit & 0x1F) | ((unit & 0x7800) >> 6)),
    };
    (col & 0x3F) + row * 64
}

/// Byte offset in the bank for a byte offset in the cell-arranged window
#[inline]
pub fn cell_byte_offset(offset: u32) -> u32 {
    (offset & 3) | (cell_map(offset >> 2) << 2)
}
