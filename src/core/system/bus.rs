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

//! Per-side bus views
//!
//! The instruction-set interpreters are external collaborators. They see the
//! expansion unit only through [`CpuBus`], implemented by [`MainBus`] and
//! [`SubBus`] over a borrowed [`SegaCd`]. Addresses are resolved through the
//! side's [`AddressMap`](crate::core::memory::AddressMap); unclaimed
//! addresses read 0 and ignore writes.

use super::SegaCd;
use crate::core::gate_array::{fields, Side};
use crate::core::memory::{RegionKind, HINT_VECTOR_OFFSET, PRG_WINDOW_SIZE, RAM_CART_SIZE_CODE};

/// Bus contract offered to a processor collaborator
///
/// Word accesses are big-endian.
pub trait CpuBus {
    fn read8(&mut self, address: u32) -> u8;
    fn read16(&mut self, address: u32) -> u16;
    fn write8(&mut self, address: u32, value: u8);
    fn write16(&mut self, address: u32, value: u16);

    /// Highest pending interrupt level, 0 when none
    fn interrupt_level(&self) -> u8;

    /// The processor took the interrupt at `level`
    fn acknowledge_interrupt(&mut self, level: u8);

    /// The processor should return from `run_until` early so the scheduler
    /// can synchronize the other side
    fn yield_requested(&self) -> bool;
}

/// Main CPU view of the expansion unit
pub struct MainBus<'a> {
    cd: &'a mut SegaCd,
}

impl<'a> MainBus<'a> {
    pub fn new(cd: &'a mut SegaCd) -> Self {
        Self { cd }
    }
}

impl CpuBus for MainBus<'_> {
    fn read8(&mut self, address: u32) -> u8 {
        self.cd.main_read8(address)
    }

    fn read16(&mut self, address: u32) -> u16 {
        self.cd.main_read16(address)
    }

    fn write8(&mut self, address: u32, value: u8) {
        self.cd.main_write8(address, value);
    }

    fn write16(&mut self, address: u32, value: u16) {
        self.cd.main_write16(address, value);
    }

    // Main CPU interrupts come from the console, not from this unit
    fn interrupt_level(&self) -> u8 {
        0
    }

    fn acknowledge_interrupt(&mut self, _level: u8) {}

    fn yield_requested(&self) -> bool {
        self.cd.gate.sync_requested() == Some(Side::Sub)
    }
}

/// Sub CPU view of the expansion unit
pub struct SubBus<'a> {
    cd: &'a mut SegaCd,
}

impl<'a> SubBus<'a> {
    pub fn new(cd: &'a mut SegaCd) -> Self {
        Self { cd }
    }
}

impl CpuBus for SubBus<'_> {
    fn read8(&mut self, address: u32) -> u8 {
        self.cd.sub_read8(address)
    }

    fn read16(&mut self, address: u32) -> u16 {
        self.cd.sub_read16(address)
    }

    fn write8(&mut self, address: u32, value: u8) {
        self.cd.sub_write8(address, value);
    }

    fn write16(&mut self, address: u32, value: u16) {
        self.cd.sub_write16(address, value);
    }

    fn interrupt_level(&self) -> u8 {
        self.cd.interrupts.highest_pending()
    }

    fn acknowledge_interrupt(&mut self, level: u8) {
        self.cd.interrupts.acknowledge(level);
    }

    fn yield_requested(&self) -> bool {
        false
    }
}

impl SegaCd {
    /// Whether the main CPU map has a handler at `address`
    pub fn main_claims(&self, address: u32) -> bool {
        self.main_map.claims(address)
    }

    /// Whether the sub CPU map has a handler at `address`
    pub fn sub_claims(&self, address: u32) -> bool {
        self.sub_map.claims(address)
    }

    // ------------------------------------------------------------------
    // Main CPU
    // ------------------------------------------------------------------

    /// Main CPU byte read
    pub fn main_read8(&mut self, address: u32) -> u8 {
        let Some(region) = self.main_map.lookup(address).copied() else {
            log::trace!("Main: read of unmapped 0x{:06X}", address);
            return 0;
        };
        let offset = region.offset(address);
        let odd = address & 1 != 0;

        match region.kind {
            RegionKind::BootRom => {
                if offset & !1 == HINT_VECTOR_OFFSET {
                    let [high, low] = self.gate.hint_vector().to_be_bytes();
                    if odd {
                        low
                    } else {
                        high
                    }
                } else {
                    self.memory.boot_rom_byte(offset)
                }
            }
            RegionKind::PrgWindow => match self.prg_window_offset(offset) {
                Some(prg) => self.memory.prg_byte(prg),
                None => 0,
            },
            RegionKind::WordRam2M => self.word_ram.read8(offset),
            RegionKind::WordRamBank => self
                .word_ram
                .read8_bank(self.word_ram.bank_of(Side::Main), offset),
            RegionKind::WordRamCell => self.word_ram.read8_cell(offset),
            RegionKind::RamCartSize => {
                if odd {
                    RAM_CART_SIZE_CODE
                } else {
                    0
                }
            }
            RegionKind::RamCart => {
                if odd {
                    self.memory.cart_read(address)
                } else {
                    0
                }
            }
            RegionKind::RamCartControl => {
                if odd {
                    self.memory.cart_write_enable() as u8
                } else {
                    0
                }
            }
            RegionKind::GateArray => self.main_gate_read8(offset),
            _ => 0,
        }
    }

    /// Main CPU word read
    pub fn main_read16(&mut self, address: u32) -> u16 {
        let address = address & !1;
        if let Some(region) = self.main_map.lookup(address).copied() {
            if region.kind == RegionKind::GateArray {
                return self.main_gate_read16(region.offset(address));
            }
        }
        u16::from_be_bytes([self.main_read8(address), self.main_read8(address + 1)])
    }

    /// Main CPU byte write
    pub fn main_write8(&mut self, address: u32, value: u8) {
        let Some(region) = self.main_map.lookup(address).copied() else {
            log::trace!("Main: write 0x{:02X} to unmapped 0x{:06X}", value, address);
            return;
        };
        let offset = region.offset(address);
        let odd = address & 1 != 0;

        match region.kind {
            RegionKind::PrgWindow => {
                if let Some(prg) = self.prg_window_offset(offset) {
                    self.memory.set_prg_byte(prg, value);
                }
            }
            RegionKind::WordRam2M => self.word_ram.write8(Side::Main, offset, value),
            RegionKind::WordRamBank => {
                let bank = self.word_ram.bank_of(Side::Main);
                self.word_ram.write8_bank(bank, offset, value);
            }
            RegionKind::WordRamCell => self.word_ram.write8_cell(offset, value),
            RegionKind::RamCart if odd => self.memory.cart_write(address, value),
            RegionKind::RamCartControl if odd => {
                self.memory.set_cart_write_enable(value & 1 != 0);
                log::debug!("RAM cart: writes {}", if value & 1 != 0 { "enabled" } else { "disabled" });
            }
            RegionKind::GateArray => self.main_gate_write8(offset, value),
            _ => log::trace!("Main: write 0x{:02X} to read-only 0x{:06X}", value, address),
        }
    }

    /// Main CPU word write
    pub fn main_write16(&mut self, address: u32, value: u16) {
        let address = address & !1;
        if let Some(region) = self.main_map.lookup(address).copied() {
            if region.kind == RegionKind::GateArray {
                self.main_gate_write16(region.offset(address), value);
                return;
            }
        }
        let [high, low] = value.to_be_bytes();
        self.main_write8(address, high);
        self.main_write8(address + 1, low);
    }

    /// PRG RAM offset behind the main window, if it is mapped
    ///
    /// The window only reaches PRG RAM while the sub CPU is in reset or its
    /// bus is requested.
    fn prg_window_offset(&self, offset: u32) -> Option<u32> {
        if !self.gate.main_prg_access() {
            return None;
        }
        let bank = self.gate.get(fields::PRG_BANK) as u32;
        Some(bank * PRG_WINDOW_SIZE as u32 + offset)
    }

    // ------------------------------------------------------------------
    // Sub CPU
    // ------------------------------------------------------------------

    /// Sub CPU byte read
    pub fn sub_read8(&mut self, address: u32) -> u8 {
        let Some(region) = self.sub_map.lookup(address).copied() else {
            log::trace!("Sub: read of unmapped 0x{:06X}", address);
            return 0;
        };
        let offset = region.offset(address);
        let odd = address & 1 != 0;

        match region.kind {
            RegionKind::PrgRam => self.memory.prg_byte(offset),
            RegionKind::WordRam2M => self.word_ram.read8(offset),
            RegionKind::WordRamNibble => self.word_ram.read8_nibble(offset),
            RegionKind::WordRamBank => self
                .word_ram
                .read8_bank(self.word_ram.bank_of(Side::Sub), offset),
            RegionKind::BackupRam if odd => self.memory.backup_read(address),
            RegionKind::Pcm if odd => self.pcm.read(pcm_index(address)),
            RegionKind::GateArray => self.sub_gate_read8(offset),
            _ => 0,
        }
    }

    /// Sub CPU word read
    pub fn sub_read16(&mut self, address: u32) -> u16 {
        let address = address & !1;
        if let Some(region) = self.sub_map.lookup(address).copied() {
            if region.kind == RegionKind::GateArray {
                return self.sub_gate_read16(region.offset(address));
            }
        }
        u16::from_be_bytes([self.sub_read8(address), self.sub_read8(address + 1)])
    }

    /// Sub CPU byte write
    pub fn sub_write8(&mut self, address: u32, value: u8) {
        let Some(region) = self.sub_map.lookup(address).copied() else {
            log::trace!("Sub: write 0x{:02X} to unmapped 0x{:06X}", value, address);
            return;
        };
        let offset = region.offset(address);
        let odd = address & 1 != 0;

        match region.kind {
            RegionKind::PrgRam => {
                let protected = self.gate.get(fields::WRITE_PROTECT) as u32 * 0x200;
                if offset < protected {
                    log::trace!("Sub: write to protected PRG 0x{:05X} dropped", offset);
                } else {
                    self.memory.set_prg_byte(offset, value);
                }
            }
            RegionKind::WordRam2M => self.word_ram.write8(Side::Sub, offset, value),
            RegionKind::WordRamNibble => self.word_ram.write8_nibble(offset, value),
            RegionKind::WordRamBank => {
                let bank = self.word_ram.bank_of(Side::Sub);
                self.word_ram.write8_bank(bank, offset, value);
            }
            RegionKind::BackupRam if odd => self.memory.backup_write(address, value),
            RegionKind::Pcm if odd => self.pcm.write(pcm_index(address), value),
            RegionKind::GateArray => self.sub_gate_write8(offset, value),
            _ => log::trace!("Sub: write 0x{:02X} to 0x{:06X} dropped", value, address),
        }
    }

    /// Sub CPU word write
    pub fn sub_write16(&mut self, address: u32, value: u16) {
        let address = address & !1;
        if let Some(region) = self.sub_map.lookup(address).copied() {
            if region.kind == RegionKind::GateArray {
                self.sub_gate_write16(region.offset(address), value);
                return;
            }
        }
        let [high, low] = value.to_be_bytes();
        self.sub_write8(address, high);
        self.sub_write8(address + 1, low);
    }
}

/// PCM register index for a sub CPU address (odd bytes, mirrored every 0x4000)
#[inline(always)]
fn pcm_index(address: u32) -> u16 {
    ((address >> 1) & 0x1FFF) as u16
}
