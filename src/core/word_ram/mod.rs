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

//! Word RAM bank controller
//!
//! 256 KiB of RAM shared by both CPUs, in one of two modes:
//!
//! - **2M mode**: one linear 256 KiB buffer owned by one CPU at a time. The
//!   owner is the main CPU while RET=1 and the sub CPU otherwise. Only the
//!   owner's writes land; reads are always served.
//! - **1M mode**: two 128 KiB banks, interleaved at 16-bit word granularity
//!   in the physical array. The main CPU uses bank `RET`, the sub CPU uses
//!   bank `RET ^ 1`; writing RET swaps them.
//!
//! # Handshake (memory mode register, offset 0x03)
//!
//! ```text
//! Bit | Name | Meaning
//! ----|------|-------------------------------------------
//! 0   | RET  | 2M: return to main / 1M: bank select
//! 1   | DMNA | 2M: main grants to sub / 1M: swap request
//! 2   | MODE | 0 = 2M, 1 = 1M
//! 3-4 | PM   | Priority mode for nibble writes
//! 6-7 | BK   | PRG RAM bank (main only, held by the Gate Array)
//! ```
//!
//! When the main CPU grants Word RAM to the sub CPU in 2M mode the grant is
//! not applied immediately: it is latched as a delayed DMNA and committed at
//! the start of the next scheduler tick. Until then the main CPU already
//! reads back `DMNA=1, RET=0` while the sub CPU still sees the old bits and
//! the main CPU still owns the RAM.

mod cell;
#[cfg(test)]
mod tests;

pub use cell::{cell_byte_offset, cell_map, CELL_UNITS};

use crate::core::gate_array::{fields, Side};

/// Word RAM size
pub const WORD_RAM_SIZE: usize = 0x40000;

/// 1M bank size
pub const BANK_SIZE: usize = 0x20000;

/// Word RAM layout mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordRamMode {
    /// One 256 KiB buffer
    TwoMeg,
    /// Two 128 KiB banks
    OneMeg,
}

/// Priority mode for 4-bit pixel writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityMode {
    /// Always write
    Off,
    /// Write only over a zero pixel
    Underwrite,
    /// Write only non-zero pixels
    Overwrite,
}

impl PriorityMode {
    fn from_bits(bits: u8) -> Self {
        match bits & 3 {
            1 => PriorityMode::Underwrite,
            2 => PriorityMode::Overwrite,
            _ => PriorityMode::Off,
        }
    }

    /// Whether `new` may replace `old`
    #[inline(always)]
    pub fn allows(self, old: u8, new: u8) -> bool {
        match self {
            PriorityMode::Off => true,
            PriorityMode::Underwrite => old == 0,
            PriorityMode::Overwrite => new != 0,
        }
    }
}

/// Word RAM and its handshake bits
pub struct WordRam {
    /// Physical RAM
    pub(super) ram: Vec<u8>,

    /// RET, DMNA, MODE, PM (sub view of offset 0x03)
    pub(super) mode_bits: u8,

    /// Main CPU granted 2M Word RAM; committed on the next tick
    pub(super) delayed_dmna: bool,
}

impl WordRam {
    /// Create Word RAM with power-on contents and 2M mode owned by main
    pub fn new() -> Self {
        let mut word_ram = Self {
            ram: vec![0; WORD_RAM_SIZE],
            mode_bits: 0,
            delayed_dmna: false,
        };
        word_ram.reset();
        word_ram
    }

    /// Reset handshake state (contents are kept)
    pub fn reset(&mut self) {
        self.mode_bits = fields::RET.bits();
        self.delayed_dmna = false;
    }

    /// Current layout mode
    pub fn mode(&self) -> WordRamMode {
        if fields::MODE.extract(self.mode_bits) != 0 {
            WordRamMode::OneMeg
        } else {
            WordRamMode::TwoMeg
        }
    }

    /// Current priority mode
    pub fn priority_mode(&self) -> PriorityMode {
        PriorityMode::from_bits(fields::PRIORITY_MODE.extract(self.mode_bits))
    }

    pub fn ret(&self) -> bool {
        fields::RET.extract(self.mode_bits) != 0
    }

    pub fn dmna(&self) -> bool {
        fields::DMNA.extract(self.mode_bits) != 0
    }

    /// Whether a 2M grant is waiting for the next tick
    pub fn delayed_dmna(&self) -> bool {
        self.delayed_dmna
    }

    /// Memory mode bits as the main CPU reads them (without PM and bank)
    pub fn main_view(&self) -> u8 {
        let bits = self.mode_bits & (fields::RET.bits() | fields::DMNA.bits() | fields::MODE.bits());
        if self.delayed_dmna {
            (bits | fields::DMNA.bits()) & !fields::RET.bits()
        } else {
            bits
        }
    }

    /// Memory mode bits as the sub CPU reads them
    pub fn sub_view(&self) -> u8 {
        self.mode_bits & 0x1F
    }

    /// Main CPU write to offset 0x03 (PRG bank bits are handled by the caller)
    ///
    /// # Returns
    ///
    /// `true` if the bank layout seen by either CPU changed
    pub fn write_main(&mut self, value: u8) -> bool {
        let old = self.mode_bits;
        let dmna = fields::DMNA.extract(value);

        match self.mode() {
            WordRamMode::OneMeg => {
                // Writing 0 requests a swap, writing 1 has no effect
                if dmna == 0 {
                    self.mode_bits = fields::DMNA.insert(self.mode_bits, 1);
                    log::trace!("WordRAM: 1M swap requested");
                }
            }
            WordRamMode::TwoMeg => {
                if dmna != 0 && !self.dmna() {
                    self.delayed_dmna = true;
                    log::trace!("WordRAM: 2M grant to sub latched");
                }
            }
        }
        self.layout_changed(old)
    }

    /// Sub CPU write to offset 0x03
    ///
    /// # Returns
    ///
    /// `true` if the bank layout seen by either CPU changed
    pub fn write_sub(&mut self, value: u8) -> bool {
        let old = self.mode_bits;
        let mut new = (value & 0x1D) | (old & fields::DMNA.bits());

        if fields::MODE.extract(new) != 0 {
            // Any mode, bank or priority change acknowledges the request
            if (new ^ old) & 0x1D != 0 {
                new = fields::DMNA.insert(new, 0);
            }
            if fields::MODE.extract(old) == 0 {
                log::debug!("WordRAM: 2M -> 1M");
            }
        } else {
            if fields::MODE.extract(old) != 0 {
                log::debug!("WordRAM: 1M -> 2M");
                if fields::RET.extract(new) == 0 {
                    // Hand the RAM to whichever side held bank 0
                    new &= !(fields::RET.bits() | fields::DMNA.bits());
                    new |= if fields::RET.extract(old) != 0 {
                        fields::DMNA.bits()
                    } else {
                        fields::RET.bits()
                    };
                }
            } else {
                // The sub CPU cannot take RET away from the main CPU
                new |= old & fields::RET.bits();
            }
            if fields::RET.extract(new) != 0 {
                new = fields::DMNA.insert(new, 0);
            }
        }

        self.mode_bits = new;
        if self.mode() == WordRamMode::OneMeg {
            self.delayed_dmna = false;
        }
        self.layout_changed(old)
    }

    /// Commit a pending 2M grant
    ///
    /// Called once at the start of every scheduler tick.
    ///
    /// # Returns
    ///
    /// `true` if ownership moved to the sub CPU
    pub fn commit_delayed_dmna(&mut self) -> bool {
        if !self.delayed_dmna {
            return false;
        }
        self.delayed_dmna = false;
        if self.mode() != WordRamMode::TwoMeg {
            return false;
        }
        self.mode_bits = fields::DMNA.insert(self.mode_bits, 1);
        self.mode_bits = fields::RET.insert(self.mode_bits, 0);
        log::trace!("WordRAM: 2M granted to sub");
        true
    }

    fn layout_changed(&self, old: u8) -> bool {
        (old ^ self.mode_bits) & (fields::RET.bits() | fields::MODE.bits()) != 0
    }

    /// 2M mode owner
    pub fn owner(&self) -> Side {
        if self.ret() {
            Side::Main
        } else {
            Side::Sub
        }
    }

    /// Whether `side` may write the 2M buffer
    pub fn can_write_2m(&self, side: Side) -> bool {
        self.mode() == WordRamMode::TwoMeg && self.owner() == side
    }

    /// 1M bank used by `side`
    pub fn bank_of(&self, side: Side) -> usize {
        let ret = self.ret() as usize;
        match side {
            Side::Main => ret,
            Side::Sub => ret ^ 1,
        }
    }

    // ------------------------------------------------------------------
    // 2M linear access
    // ------------------------------------------------------------------

    /// Read a byte of the 2M buffer
    #[inline(always)]
    pub fn read8(&self, offset: u32) -> u8 {
        self.ram[offset as usize & (WORD_RAM_SIZE - 1)]
    }

    /// Read a big-endian word of the 2M buffer
    #[inline(always)]
    pub fn read16(&self, offset: u32) -> u16 {
        let offset = offset & !1;
        u16::from_be_bytes([self.read8(offset), self.read8(offset + 1)])
    }

    /// CPU write to the 2M buffer; dropped unless `side` owns it
    pub fn write8(&mut self, side: Side, offset: u32, value: u8) {
        if !self.can_write_2m(side) {
            log::trace!(
                "WordRAM: {:?} write to 0x{:05X} without ownership dropped",
                side,
                offset
            );
            return;
        }
        self.ram[offset as usize & (WORD_RAM_SIZE - 1)] = value;
    }

    /// Word write to the 2M buffer; dropped unless `side` owns it
    pub fn write16(&mut self, side: Side, offset: u32, value: u16) {
        let [high, low] = value.to_be_bytes();
        let offset = offset & !1;
        self.write8(side, offset, high);
        self.write8(side, offset + 1, low);
    }

    // ------------------------------------------------------------------
    // 1M bank access
    // ------------------------------------------------------------------

    /// Physical offset of byte `offset` in 1M bank `bank`
    #[inline(always)]
    pub fn bank_offset(bank: usize, offset: u32) -> usize {
        let offset = offset as usize & (BANK_SIZE - 1);
        ((offset >> 1) << 2) | ((bank & 1) << 1) | (offset & 1)
    }

    pub fn read8_bank(&self, bank: usize, offset: u32) -> u8 {
        self.ram[Self::bank_offset(bank, offset)]
    }

    pub fn write8_bank(&mut self, bank: usize, offset: u32, value: u8) {
        self.ram[Self::bank_offset(bank, offset)] = value;
    }

    /// Byte read through the main CPU's cell-arranged window
    pub fn read8_cell(&self, offset: u32) -> u8 {
        self.read8_bank(self.bank_of(Side::Main), cell_byte_offset(offset))
    }

    /// Byte write through the main CPU's cell-arranged window
    pub fn write8_cell(&mut self, offset: u32, value: u8) {
        let bank = self.bank_of(Side::Main);
        self.write8_bank(bank, cell_byte_offset(offset), value);
    }

    /// Pixel read through the sub CPU's nibble window
    ///
    /// Each byte address is one 4-bit pixel: even addresses select the high
    /// nibble of bank byte `offset >> 1`, odd addresses the low nibble.
    pub fn read8_nibble(&self, offset: u32) -> u8 {
        let byte = self.read8_bank(self.bank_of(Side::Sub), offset >> 1);
        if offset & 1 == 0 {
            byte >> 4
        } else {
            byte & 0x0F
        }
    }

    /// Pixel write through the sub CPU's nibble window, honoring PM
    pub fn write8_nibble(&mut self, offset: u32, value: u8) {
        let bank = self.bank_of(Side::Sub);
        let byte_offset = offset >> 1;
        let byte = self.read8_bank(bank, byte_offset);
        let shift = if offset & 1 == 0 { 4 } else { 0 };
        let old = (byte >> shift) & 0x0F;
        let new = value & 0x0F;
        if self.priority_mode().allows(old, new) {
            let byte = (byte & !(0x0F << shift)) | (new << shift);
            self.write8_bank(bank, byte_offset, byte);
        }
    }

    // ------------------------------------------------------------------
    // Graphics co-processor and CDC DMA
    // ------------------------------------------------------------------

    /// 4-bit pixel at nibble index `index` of the 2M buffer (high nibble first)
    #[inline(always)]
    pub fn pixel(&self, index: u32) -> u8 {
        let byte = self.read8(index >> 1);
        if index & 1 == 0 {
            byte >> 4
        } else {
            byte & 0x0F
        }
    }

    /// Write a 4-bit pixel of the 2M buffer through the priority mode
    #[inline(always)]
    pub fn write_pixel(&mut self, index: u32, value: u8) {
        let offset = (index >> 1) as usize & (WORD_RAM_SIZE - 1);
        let shift = if index & 1 == 0 { 4 } else { 0 };
        let byte = self.ram[offset];
        let old = (byte >> shift) & 0x0F;
        let new = value & 0x0F;
        if self.priority_mode().allows(old, new) {
            self.ram[offset] = (byte & !(0x0F << shift)) | (new << shift);
        }
    }

    /// CDC DMA into Word RAM
    ///
    /// 2M mode writes the linear buffer, 1M mode the sub CPU's bank.
    pub fn dma_write(&mut self, offset: u32, data: &[u8]) {
        match self.mode() {
            WordRamMode::TwoMeg => {
                for (i, &byte) in data.iter().enumerate() {
                    self.ram[(offset as usize + i) & (WORD_RAM_SIZE - 1)] = byte;
                }
            }
            WordRamMode::OneMeg => {
                let bank = self.bank_of(Side::Sub);
                for (i, &byte) in data.iter().enumerate() {
                    self.write8_bank(bank, offset + i as u32, byte);
                }
            }
        }
    }

    /// Raw physical contents
    pub fn contents(&self) -> &[u8] {
        &self.ram
    }

    pub(crate) fn restore(&mut self, contents: &[u8], mode_bits: u8, delayed_dmna: bool) {
        let len = contents.len().min(WORD_RAM_SIZE);
        self.ram[..len].copy_from_slice(&contents[..len]);
        self.mode_bits = mode_bits & 0x1F;
        self.delayed_dmna = delayed_dmna;
    }

    pub(crate) fn mode_bits(&self) -> u8 {
        self.mode_bits
    }
}

impl Default for WordRam {
    fn default() -> Self {
        Self::new()
    }
}
