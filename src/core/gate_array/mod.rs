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

//! Gate Array register file
//!
//! The Gate Array is the register block shared by the main and sub CPUs.
//! This module holds the plain storage: a byte-addressed register file,
//! the main-only reset/bus request latch, the communication mailbox with its
//! spin-poll detector, and the timer/stopwatch counters.
//!
//! Registers whose state belongs to a peripheral (CDC mode and index, Word
//! RAM mode bits, CDD status/command, graphics) are not stored here; the
//! system context routes those offsets to the owning component.
//!
//! # Register Map (sub CPU view, 0xFF8000 + offset)
//!
//! | Offset    | Register                     |
//! |-----------|------------------------------|
//! | 0x00-0x01 | LED / reset                  |
//! | 0x02      | PRG RAM write protect        |
//! | 0x03      | Memory mode                  |
//! | 0x04-0x05 | CDC mode / register index    |
//! | 0x06-0x07 | CDC register data            |
//! | 0x08-0x09 | CDC host data                |
//! | 0x0A-0x0B | CDC DMA address              |
//! | 0x0C-0x0D | Stopwatch                    |
//! | 0x0E-0x0F | Communication flags          |
//! | 0x10-0x1F | Communication command (main) |
//! | 0x20-0x2F | Communication status (sub)   |
//! | 0x30-0x31 | Timer                        |
//! | 0x32-0x33 | Interrupt mask               |
//! | 0x34-0x35 | CDD fader                    |
//! | 0x36-0x37 | CDD control                  |
//! | 0x38-0x41 | CDD status                   |
//! | 0x42-0x4B | CDD command                  |
//! | 0x4C-0x4F | Font color / font bits       |
//! | 0x50-0x57 | Font data                    |
//! | 0x58-0x67 | Graphics                     |

pub mod fields;
mod sync;
#[cfg(test)]
mod tests;

pub use fields::Field;
pub use sync::CommSync;

use crate::core::config::SyncConfig;

/// Size of the register block (sub window is mirrored every 0x200)
pub const GATE_REGISTER_COUNT: usize = 0x80;

/// Main CPU window mirror mask
pub const MAIN_WINDOW_MASK: u32 = 0x3F;

/// Sub CPU window mirror mask
pub const SUB_WINDOW_MASK: u32 = 0x1FF;

/// Which processor performs an access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Console (main) CPU
    Main,
    /// Expansion unit (sub) CPU
    Sub,
}

/// Effect of a main CPU write to the reset/bus request register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusreqEffect {
    /// The latched sub CPU reset was released
    pub reset_sub: bool,
    /// PRG RAM visibility through the main window changed
    pub prg_mapping_changed: bool,
}

/// Gate Array register file
#[derive(Debug, Clone)]
pub struct GateArray {
    /// Register bytes (sub CPU view)
    pub(super) regs: [u8; GATE_REGISTER_COUNT],

    /// Main 0x01: bit 0 SRES (1 = sub running), bit 1 SBRQ (1 = bus requested)
    pub(super) busreq: u8,

    /// SRES went low; reset is released on the next `SRES=1, SBRQ=0`
    pub(super) reset_pending: bool,

    /// Main 0x06-0x07: HINT vector override
    pub(super) hint_vector: u16,

    /// Timer countdown (reloaded from reg 0x31)
    pub(super) timer_counter: u8,

    /// Stopwatch, 12 bits
    pub(super) stopwatch: u16,

    /// Spin-poll detector
    pub(super) sync: CommSync,
}

impl GateArray {
    /// Create a register file with power-on values
    pub fn new(config: &SyncConfig) -> Self {
        let mut gate = Self {
            regs: [0; GATE_REGISTER_COUNT],
            busreq: 0,
            reset_pending: false,
            hint_vector: 0,
            timer_counter: 0,
            stopwatch: 0,
            sync: CommSync::new(config),
        };
        gate.reset();
        gate
    }

    /// Power-on / reset values
    ///
    /// The sub CPU starts held in reset with the bus requested.
    pub fn reset(&mut self) {
        self.regs = [0; GATE_REGISTER_COUNT];
        self.set(fields::RES0, 1);
        self.busreq = fields::SBRQ.bits();
        self.reset_pending = true;
        self.hint_vector = 0;
        self.timer_counter = 0;
        self.stopwatch = 0;
        self.sync.reset();
    }

    /// Read a field
    #[inline(always)]
    pub fn get(&self, field: Field) -> u8 {
        field.extract(self.regs[field.offset as usize])
    }

    /// Write a field
    #[inline(always)]
    pub fn set(&mut self, field: Field, value: u8) {
        let byte = &mut self.regs[field.offset as usize];
        *byte = field.insert(*byte, value);
    }

    /// Raw register byte
    pub fn byte(&self, offset: u8) -> u8 {
        debug_assert!((offset as usize) < GATE_REGISTER_COUNT);
        self.regs[offset as usize & (GATE_REGISTER_COUNT - 1)]
    }

    /// Store a raw register byte
    pub fn set_byte(&mut self, offset: u8, value: u8) {
        debug_assert!((offset as usize) < GATE_REGISTER_COUNT);
        self.regs[offset as usize & (GATE_REGISTER_COUNT - 1)] = value;
    }

    // ------------------------------------------------------------------
    // Reset / bus request (main 0x01)
    // ------------------------------------------------------------------

    /// Main view of reset/bus request
    pub fn busreq(&self) -> u8 {
        self.busreq
    }

    /// Main CPU write to 0x01
    ///
    /// A reset is latched when SRES goes low and released once the
    /// register becomes `SRES=1, SBRQ=0`.
    pub fn write_busreq(&mut self, value: u8) -> BusreqEffect {
        let old = self.busreq;
        let value = value & 0x03;
        let mut effect = BusreqEffect::default();

        if fields::SRES.extract(value) == 0 {
            self.reset_pending = true;
        }
        if self.reset_pending && value == fields::SRES.bits() {
            self.reset_pending = false;
            effect.reset_sub = true;
            log::debug!("Gate: sub CPU reset released");
        }

        self.busreq = value;
        effect.prg_mapping_changed = Self::prg_visible(old) != Self::prg_visible(value);
        effect
    }

    /// Whether the sub CPU is executing (SRES=1, SBRQ=0)
    pub fn sub_running(&self) -> bool {
        self.busreq & 0x03 == fields::SRES.bits()
    }

    /// Whether the main CPU may access PRG RAM through its window
    pub fn main_prg_access(&self) -> bool {
        Self::prg_visible(self.busreq)
    }

    fn prg_visible(busreq: u8) -> bool {
        busreq & 0x03 != fields::SRES.bits()
    }

    // ------------------------------------------------------------------
    // HINT vector (main 0x06-0x07)
    // ------------------------------------------------------------------

    pub fn hint_vector(&self) -> u16 {
        self.hint_vector
    }

    pub fn write_hint_vector(&mut self, high: bool, value: u8) {
        self.hint_vector = if high {
            (self.hint_vector & 0x00FF) | ((value as u16) << 8)
        } else {
            (self.hint_vector & 0xFF00) | value as u16
        };
    }

    // ------------------------------------------------------------------
    // Communication flags and mailbox
    // ------------------------------------------------------------------

    /// Read the flag byte at 0x0E (main) or 0x0F (sub)
    ///
    /// Reading the other side's flag feeds the spin-poll detector.
    pub fn read_flag(&mut self, reader: Side, offset: u8) -> u8 {
        let owner = if offset & 1 == 0 { Side::Main } else { Side::Sub };
        if owner != reader {
            self.sync.flag_read(reader);
        }
        self.regs[0x0E | (offset as usize & 1)]
    }

    /// Store `side`'s flag byte
    ///
    /// Rewriting the current value is a no-op.
    pub fn write_flag(&mut self, side: Side, value: u8) {
        let field = match side {
            Side::Main => fields::MAIN_FLAG,
            Side::Sub => fields::SUB_FLAG,
        };
        if self.get(field) == value {
            return;
        }
        self.set(field, value);
        self.sync.flag_written(side);
        log::trace!("Gate: {:?} flag = 0x{:02X}", side, value);
    }

    /// Read a mailbox byte (0x10-0x2F)
    pub fn read_comm(&mut self, reader: Side, offset: u8) -> u8 {
        let owner = Self::comm_owner(offset);
        if owner != reader {
            self.sync.comm_read(reader, offset);
        }
        self.regs[offset as usize]
    }

    /// Write a mailbox byte (0x10-0x2F)
    ///
    /// Only the owning side's half is writable: main owns 0x10-0x1F
    /// (command), sub owns 0x20-0x2F (status). Other writes are dropped.
    pub fn write_comm(&mut self, writer: Side, offset: u8, value: u8) {
        if Self::comm_owner(offset) != writer {
            log::trace!(
                "Gate: {:?} write to read-only comm 0x{:02X} dropped",
                writer,
                offset
            );
            return;
        }
        self.regs[offset as usize] = value;
        self.sync.comm_written(writer, offset);
    }

    fn comm_owner(offset: u8) -> Side {
        debug_assert!((0x10..0x30).contains(&offset));
        if offset < 0x20 {
            Side::Main
        } else {
            Side::Sub
        }
    }

    /// Take the pending spin-poll sync request
    pub fn take_sync_request(&mut self) -> Option<Side> {
        self.sync.take_request()
    }

    /// Peek at the pending spin-poll sync request
    pub fn sync_requested(&self) -> Option<Side> {
        self.sync.pending_request()
    }

    // ------------------------------------------------------------------
    // Timer and stopwatch
    // ------------------------------------------------------------------

    /// Sub write to 0x31: set the interval and restart the countdown
    pub fn write_timer(&mut self, value: u8) {
        self.set(fields::TIMER, value);
        self.timer_counter = value;
    }

    /// One 30.72 µs timer step
    ///
    /// # Returns
    ///
    /// `true` when the countdown expired (level 3 interrupt)
    pub fn tick_timer(&mut self) -> bool {
        let interval = self.get(fields::TIMER);
        if interval == 0 {
            return false;
        }
        if self.timer_counter == 0 {
            self.timer_counter = interval;
            true
        } else {
            self.timer_counter -= 1;
            false
        }
    }

    /// Stopwatch value (12 bits)
    pub fn stopwatch(&self) -> u16 {
        self.stopwatch
    }

    /// Sub write to 0x0C: clear the stopwatch
    pub fn reset_stopwatch(&mut self) {
        self.stopwatch = 0;
    }

    /// One 30.72 µs stopwatch step
    pub fn tick_stopwatch(&mut self) {
        self.stopwatch = (self.stopwatch + 1) & 0x0FFF;
    }

    // ------------------------------------------------------------------
    // Font renderer
    // ------------------------------------------------------------------

    /// Font data byte (0x50-0x57)
    ///
    /// Each font bit (0x4E-0x4F, MSB first) expands to one 4-bit pixel in the
    /// 1-bit or 0-bit color from 0x4D.
    pub fn font_data(&self, offset: u8) -> u8 {
        debug_assert!((0x50..0x58).contains(&offset));
        let bits = u16::from_be_bytes([self.regs[0x4E], self.regs[0x4F]]);
        let color = |bit: u32| {
            if bits & (1 << bit) != 0 {
                self.get(fields::FONT_COLOR_1)
            } else {
                self.get(fields::FONT_COLOR_0)
            }
        };
        let index = (offset - 0x50) as u32;
        let high_bit = 15 - index * 2;
        (color(high_bit) << 4) | color(high_bit - 1)
    }
}
