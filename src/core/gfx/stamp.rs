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

//! Stamp geometry helpers

/// Stamp map / stamp size combination (register 0x58 bits 1-2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampLayout {
    /// Stamp edge in dots (16 or 32)
    pub stamp_size: u32,

    /// Mask applied to the 13.11-scaled trace position
    pub dot_mask: u32,

    /// Right shift turning a scaled position into a stamp column/row
    pub stamp_shift: u32,

    /// Left shift of the stamp row in the map index
    pub map_shift: u32,

    /// Mask applied to the stamp map base byte address
    pub map_base_mask: u32,
}

impl StampLayout {
    /// Decode from the stamp data size register
    ///
    /// | SMS | STS | Screen         | Stamp   |
    /// |-----|-----|----------------|---------|
    /// | 0   | 0   | 16x16 stamps   | 16 dots |
    /// | 0   | 1   | 8x8 stamps     | 32 dots |
    /// | 1   | 0   | 256x256 stamps | 16 dots |
    /// | 1   | 1   | 128x128 stamps | 32 dots |
    pub fn from_register(value: u16) -> Self {
        let (stamp_size, dot_mask, map_shift, map_base_mask) = match (value >> 1) & 0x03 {
            0 => (16, 0x07FFFF, 4, 0x3FE00),
            1 => (32, 0x07FFFF, 3, 0x3FF80),
            2 => (16, 0x7FFFFF, 8, 0x20000),
            _ => (32, 0x7FFFFF, 7, 0x38000),
        };
        Self {
            stamp_size,
            dot_mask,
            stamp_shift: 11 + stamp_size.trailing_zeros(),
            map_shift,
            map_base_mask,
        }
    }

    /// Stamp number mask (32-dot stamps use four consecutive 16-dot slots)
    pub fn number_mask(&self) -> u16 {
        if self.stamp_size == 32 {
            0x7FC
        } else {
            0x7FF
        }
    }
}

/// Source dot inside a stamp for an output dot, given the 3-bit stamp code
///
/// Bit 2 of `code` is HFLIP, bits 0-1 the counter-clockwise rotation in
/// 90 degree steps. The flip is applied to the stamp before it is rotated.
///
/// # Example
///
/// ```
/// use mcdrx::core::gfx::transform_dot;
///
/// assert_eq!(transform_dot(3, 5, 0, 16), (3, 5));
/// assert_eq!(transform_dot(3, 5, 0b100, 16), (12, 5));
/// assert_eq!(transform_dot(0, 0, 0b001, 16), (15, 0));
/// ```
#[inline]
pub fn transform_dot(x: u32, y: u32, code: u16, size: u32) -> (u32, u32) {
    let last = size - 1;
    let (x, y) = match code & 0x03 {
        0 => (x, y),
        1 => (last - y, x),
        2 => (last - x, last - y),
        _ => (y, last - x),
    };
    if code & 0x04 != 0 {
        (last - x, y)
    } else {
        (x, y)
    }
}

/// Nibble index of dot (x, y) of a stamp
///
/// Stamps are stored as 8x8 cells in column-major order, each cell as eight
/// rows of eight 4-bit dots.
#[inline]
pub fn stamp_pixel_index(number: u16, x: u32, y: u32, size: u32) -> u32 {
    let cell = (y >> 3) + (x >> 3) * (size >> 3);
    (number as u32) * 256 + cell * 64 + (y & 7) * 8 + (x & 7)
}

/// Draw speed table, 16.16 lines per tick, indexed by `H dots >> 3`
pub fn draw_speed_table() -> [u32; 64] {
    let mut table = [0u32; 64];
    for (i, entry) in table.iter_mut().enumerate() {
        *entry = 0x200000 / (i as u32 + 1);
    }
    table
}
