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

//! Graphics co-processor (stamp rotation / scaling engine)
//!
//! Renders a rotated, scaled view of a stamp map into an image buffer, both
//! held in 2M Word RAM. The sub CPU programs the registers at Gate Array
//! 0x58-0x66; writing the trace vector base (0x66) starts an operation.
//!
//! For each image buffer line the engine fetches a trace vector (start X,
//! Y in 13.3 and per-dot deltas in 5.11) and walks H dots across the stamp
//! map. Lines are rendered in batches, one batch per scheduler tick, at a
//! rate that depends on the line width. When the last line is drawn GRON
//! clears and the level 1 interrupt fires.
//!
//! # Registers
//!
//! | Offset | Register              | Bits                        |
//! |--------|-----------------------|-----------------------------|
//! | 0x58   | Stamp data size       | 15 GRON, 2 SMS, 1 STS, 0 RPT|
//! | 0x5A   | Stamp map base        | 15-5                        |
//! | 0x5C   | Image buffer V cells  | 4-0                         |
//! | 0x5E   | Image buffer start    | 15-3                        |
//! | 0x60   | Image buffer offset   | 5-3 V dots, 2-0 H dots      |
//! | 0x62   | Image buffer H dots   | 8-0                         |
//! | 0x64   | Image buffer V dots   | 7-0                         |
//! | 0x66   | Trace vector base     | 15-1                        |

mod stamp;
#[cfg(test)]
mod tests;

pub use stamp::{draw_speed_table, stamp_pixel_index, transform_dot, StampLayout};

use crate::core::word_ram::{WordRam, WordRamMode};

/// First Gate Array offset of the graphics block
pub const GFX_REGISTER_BASE: u8 = 0x58;

/// Number of 16-bit registers
pub const GFX_REGISTER_COUNT: usize = 8;

/// GRON: operation in progress (register 0x58 bit 15)
pub const GRON: u16 = 0x8000;

/// RPT: stamp map repeats
pub const REPEAT: u16 = 0x0001;

/// Writable bits per register
const REGISTER_MASKS: [u16; GFX_REGISTER_COUNT] = [
    0x0007, 0xFFE0, 0x001F, 0xFFF8, 0x003F, 0x01FF, 0x00FF, 0xFFFE,
];

/// Register indices
pub mod reg {
    pub const STAMP_SIZE: usize = 0;
    pub const MAP_BASE: usize = 1;
    pub const V_CELLS: usize = 2;
    pub const BUFFER_START: usize = 3;
    pub const BUFFER_OFFSET: usize = 4;
    pub const H_DOTS: usize = 5;
    pub const V_DOTS: usize = 6;
    pub const TRACE_BASE: usize = 7;
}

/// Stamp engine state
pub struct Graphics {
    /// Registers 0x58-0x66
    pub(super) regs: [u16; GFX_REGISTER_COUNT],

    /// Byte address of the next trace vector
    pub(super) trace_address: u32,

    /// Nibble index of the next image buffer line
    pub(super) buffer_start: u32,

    /// Draw-speed accumulator, 16.16 lines
    pub(super) accumulator: u32,

    speed_table: [u32; 64],
}

impl Graphics {
    pub fn new() -> Self {
        Self {
            regs: [0; GFX_REGISTER_COUNT],
            trace_address: 0,
            buffer_start: 0,
            accumulator: 0,
            speed_table: draw_speed_table(),
        }
    }

    /// Abort any operation and clear the registers
    pub fn reset(&mut self) {
        self.regs = [0; GFX_REGISTER_COUNT];
        self.trace_address = 0;
        self.buffer_start = 0;
        self.accumulator = 0;
    }

    /// Whether an operation is in progress
    pub fn busy(&self) -> bool {
        self.regs[reg::STAMP_SIZE] & GRON != 0
    }

    pub fn register(&self, index: usize) -> u16 {
        self.regs[index % GFX_REGISTER_COUNT]
    }

    /// Gate Array byte read (0x58-0x67)
    pub fn read8(&self, offset: u8) -> u8 {
        let value = self.regs[Self::index_of(offset)];
        if offset & 1 == 0 {
            (value >> 8) as u8
        } else {
            value as u8
        }
    }

    /// Gate Array word read (0x58-0x66)
    pub fn read16(&self, offset: u8) -> u16 {
        self.regs[Self::index_of(offset)]
    }

    /// Gate Array byte write, merged into the 16-bit register
    ///
    /// # Returns
    ///
    /// `true` if the write completes the trace vector base (byte 0x67),
    /// which starts an operation
    pub fn write8(&mut self, offset: u8, value: u8) -> bool {
        let index = Self::index_of(offset);
        let current = self.regs[index];
        let merged = if offset & 1 == 0 {
            (current & 0x00FF) | ((value as u16) << 8)
        } else {
            (current & 0xFF00) | value as u16
        };
        self.store(index, merged);
        index == reg::TRACE_BASE && offset & 1 == 1
    }

    /// Gate Array word write
    ///
    /// # Returns
    ///
    /// `true` for the trace vector base, which starts an operation
    pub fn write16(&mut self, offset: u8, value: u16) -> bool {
        let index = Self::index_of(offset);
        self.store(index, value);
        index == reg::TRACE_BASE
    }

    fn index_of(offset: u8) -> usize {
        debug_assert!((GFX_REGISTER_BASE..GFX_REGISTER_BASE + 0x10).contains(&offset));
        ((offset.wrapping_sub(GFX_REGISTER_BASE) >> 1) as usize) % GFX_REGISTER_COUNT
    }

    fn store(&mut self, index: usize, value: u16) {
        let mask = REGISTER_MASKS[index];
        if index == reg::STAMP_SIZE {
            // GRON is read only
            self.regs[index] = (self.regs[index] & GRON) | (value & mask);
        } else {
            self.regs[index] = value & mask;
        }
    }

    fn layout(&self) -> StampLayout {
        StampLayout::from_register(self.regs[reg::STAMP_SIZE])
    }

    /// Start an operation from the current registers
    ///
    /// Ignored in 1M mode.
    pub fn start(&mut self, word_ram: &WordRam) {
        if word_ram.mode() != WordRamMode::TwoMeg {
            log::debug!("GFX: start ignored in 1M mode");
            return;
        }
        self.trace_address = ((self.regs[reg::TRACE_BASE] as u32) << 2) & 0x3FFF8;
        self.buffer_start = (((self.regs[reg::BUFFER_START] as u32) << 3) & 0x7FFC0)
            + (self.regs[reg::BUFFER_OFFSET] as u32 & 0x3F);
        self.accumulator = 0;
        self.regs[reg::STAMP_SIZE] |= GRON;
        log::debug!(
            "GFX: start {}x{} dots, trace 0x{:05X}, buffer 0x{:05X}",
            self.regs[reg::H_DOTS],
            self.regs[reg::V_DOTS],
            self.trace_address,
            self.buffer_start >> 1
        );
    }

    /// Advance the engine by one scheduler tick
    ///
    /// # Returns
    ///
    /// `true` when the operation finished during this tick (level 1
    /// interrupt)
    pub fn update(&mut self, word_ram: &mut WordRam) -> bool {
        if !self.busy() {
            return false;
        }

        let h_dots = self.regs[reg::H_DOTS] as u32;
        self.accumulator += self.speed_table[((h_dots >> 3) & 0x3F) as usize];
        let mut lines = self.accumulator >> 16;
        self.accumulator &= 0xFFFF;

        let remaining = self.regs[reg::V_DOTS] as u32;
        let finished = lines >= remaining;
        if finished {
            lines = remaining;
        }

        for _ in 0..lines {
            self.render_line(word_ram, h_dots);
            self.buffer_start = self.buffer_start.wrapping_add(8);
        }
        self.regs[reg::V_DOTS] = (remaining - lines) as u16;

        if finished {
            self.regs[reg::STAMP_SIZE] &= !GRON;
            log::debug!("GFX: operation complete");
        }
        finished
    }

    /// Run the current operation to completion
    ///
    /// # Returns
    ///
    /// Number of ticks taken
    pub fn run_to_completion(&mut self, word_ram: &mut WordRam) -> u32 {
        let mut ticks = 0;
        while self.busy() {
            self.update(word_ram);
            ticks += 1;
        }
        ticks
    }

    /// Render one image buffer line
    fn render_line(&mut self, word_ram: &mut WordRam, width: u32) {
        let layout = self.layout();
        let repeat = self.regs[reg::STAMP_SIZE] & REPEAT != 0;
        let map_base = ((self.regs[reg::MAP_BASE] as u32) << 2) & layout.map_base_mask;
        let v_cells = (self.regs[reg::V_CELLS] as u32 & 0x1F) + 1;
        let next_cell = (v_cells << 6) - 7;

        let mut x = (word_ram.read16(self.trace_address) as u32) << 8;
        let mut y = (word_ram.read16(self.trace_address + 2) as u32) << 8;
        let dx = word_ram.read16(self.trace_address + 4) as i16 as i32 as u32;
        let dy = word_ram.read16(self.trace_address + 6) as i16 as i32 as u32;
        self.trace_address = (self.trace_address + 8) & 0x3FFFF;

        let mut buffer_index = self.buffer_start;
        for _ in 0..width {
            let range = if repeat { layout.dot_mask } else { 0xFFFFFF };
            x &= range;
            y &= range;

            let dot = if (x | y) & !layout.dot_mask != 0 {
                0
            } else {
                self.fetch_dot(word_ram, &layout, map_base, x, y)
            };
            word_ram.write_pixel(buffer_index, dot);

            buffer_index = if buffer_index & 7 != 7 {
                buffer_index + 1
            } else {
                buffer_index.wrapping_add(next_cell)
            };
            x = x.wrapping_add(dx);
            y = y.wrapping_add(dy);
        }
    }

    /// Dot at scaled position (x, y) of the stamp map
    fn fetch_dot(
        &self,
        word_ram: &WordRam,
        layout: &StampLayout,
        map_base: u32,
        x: u32,
        y: u32,
    ) -> u8 {
        let column = x >> layout.stamp_shift;
        let row = y >> layout.stamp_shift;
        let entry = column | (row << layout.map_shift);
        let data = word_ram.read16(map_base + entry * 2);

        let number = data & layout.number_mask();
        if number == 0 {
            return 0;
        }

        let mask = layout.stamp_size - 1;
        let (sx, sy) = transform_dot((x >> 11) & mask, (y >> 11) & mask, data >> 13, layout.stamp_size);
        word_ram.pixel(stamp_pixel_index(number, sx, sy, layout.stamp_size))
    }
}

impl Default for Graphics {
    fn default() -> Self {
        Self::new()
    }
}
