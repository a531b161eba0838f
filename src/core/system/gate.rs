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

//! Gate Array register routing
//!
//! Each side's register window is described by a handler table: one
//! [`GateRegister`] per byte offset, built from a list of ranges and
//! checked for gaps and overlaps when the system is constructed. Accesses
//! are dispatched on the table entry; registers backed by a peripheral are
//! forwarded to it.

use super::SegaCd;
use crate::core::cdd::BLOCK_LEN;
use crate::core::error::{EmulatorError, Result};
use crate::core::gate_array::{fields, Side, MAIN_WINDOW_MASK, SUB_WINDOW_MASK};
use crate::core::interrupt::levels;

/// Main window size in bytes
pub const MAIN_TABLE_SIZE: usize = 0x40;

/// Sub window register bytes (offsets above read as unused)
pub const SUB_TABLE_SIZE: usize = 0x80;

/// Handler kind for one register byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRegister {
    /// Main 0x00: IEN2 readback, IFL2 request
    MainInterrupt,
    /// Main 0x01: sub CPU reset / bus request
    BusRequest,
    /// Sub 0x00-0x01: LED control, peripheral ready
    SubReset,
    /// 0x02: PRG RAM write protect (main writes)
    WriteProtect,
    /// 0x03: memory mode / Word RAM handshake
    MemoryMode,
    /// 0x04: CDC mode (sub writes)
    CdcMode,
    /// Sub 0x05: CDC register index
    CdcIndex,
    /// Sub 0x06-0x07: CDC register data
    CdcData,
    /// 0x08-0x09: CDC host data
    HostData,
    /// Sub 0x0A-0x0B: CDC DMA address
    DmaAddress,
    /// Main 0x06-0x07: HINT vector
    HintVector,
    /// 0x0C-0x0D: stopwatch (sub write clears)
    Stopwatch,
    /// 0x0E-0x0F: communication flags
    Flag,
    /// 0x10-0x2F: communication mailbox
    Comm,
    /// Sub 0x30-0x31: timer interval
    Timer,
    /// Sub 0x32-0x33: interrupt mask
    InterruptMask,
    /// Sub 0x34-0x35: CDD fader
    Fader,
    /// Sub 0x36-0x37: CDD control (DM, HOCK, DRS, DTS)
    CddControl,
    /// Sub 0x38-0x41: CDD status block
    CddStatus,
    /// Sub 0x42-0x4B: CDD command block
    CddCommand,
    /// Sub 0x4C-0x4F: font color and font bits
    Font,
    /// Sub 0x50-0x57: font data
    FontData,
    /// Sub 0x58-0x67: graphics co-processor
    Graphics,
    /// Reads 0, writes dropped
    Unused,
}

/// Main window layout (offset = address & 0x3F)
pub const MAIN_LAYOUT: &[(u8, u8, GateRegister)] = &[
    (0x00, 0x00, GateRegister::MainInterrupt),
    (0x01, 0x01, GateRegister::BusRequest),
    (0x02, 0x02, GateRegister::WriteProtect),
    (0x03, 0x03, GateRegister::MemoryMode),
    (0x04, 0x04, GateRegister::CdcMode),
    (0x05, 0x05, GateRegister::Unused),
    (0x06, 0x07, GateRegister::HintVector),
    (0x08, 0x09, GateRegister::HostData),
    (0x0A, 0x0B, GateRegister::Unused),
    (0x0C, 0x0D, GateRegister::Stopwatch),
    (0x0E, 0x0F, GateRegister::Flag),
    (0x10, 0x2F, GateRegister::Comm),
    (0x30, 0x3F, GateRegister::Unused),
];

/// Sub window layout (offset = address & 0x1FF)
pub const SUB_LAYOUT: &[(u8, u8, GateRegister)] = &[
    (0x00, 0x01, GateRegister::SubReset),
    (0x02, 0x02, GateRegister::WriteProtect),
    (0x03, 0x03, GateRegister::MemoryMode),
    (0x04, 0x04, GateRegister::CdcMode),
    (0x05, 0x05, GateRegister::CdcIndex),
    (0x06, 0x07, GateRegister::CdcData),
    (0x08, 0x09, GateRegister::HostData),
    (0x0A, 0x0B, GateRegister::DmaAddress),
    (0x0C, 0x0D, GateRegister::Stopwatch),
    (0x0E, 0x0F, GateRegister::Flag),
    (0x10, 0x2F, GateRegister::Comm),
    (0x30, 0x31, GateRegister::Timer),
    (0x32, 0x33, GateRegister::InterruptMask),
    (0x34, 0x35, GateRegister::Fader),
    (0x36, 0x37, GateRegister::CddControl),
    (0x38, 0x41, GateRegister::CddStatus),
    (0x42, 0x4B, GateRegister::CddCommand),
    (0x4C, 0x4F, GateRegister::Font),
    (0x50, 0x57, GateRegister::FontData),
    (0x58, 0x67, GateRegister::Graphics),
    (0x68, 0x7F, GateRegister::Unused),
];

/// Expand a range list into a per-byte handler table
///
/// # Errors
///
/// `EmulatorError::InvalidHandlerTable` if a range runs past the table,
/// an offset is claimed twice, or an offset is left without a handler.
///
/// # Example
///
/// ```
/// use mcdrx::core::system::{build_gate_table, GateRegister, MAIN_LAYOUT, MAIN_TABLE_SIZE};
///
/// let table = build_gate_table::<MAIN_TABLE_SIZE>("main", MAIN_LAYOUT).unwrap();
/// assert_eq!(table[0x01], GateRegister::BusRequest);
///
/// // A gap is rejected
/// assert!(build_gate_table::<4>("broken", &[(0, 2, GateRegister::Unused)]).is_err());
/// ```
pub fn build_gate_table<const N: usize>(
    table: &'static str,
    ranges: &[(u8, u8, GateRegister)],
) -> Result<[GateRegister; N]> {
    let mut slots: [Option<GateRegister>; N] = [None; N];
    for &(start, end, register) in ranges {
        for index in start as usize..=end as usize {
            let slot = slots
                .get_mut(index)
                .ok_or_else(|| EmulatorError::InvalidHandlerTable {
                    table,
                    index: index as u32,
                    reason: "is outside the window",
                })?;
            if slot.is_some() {
                return Err(EmulatorError::InvalidHandlerTable {
                    table,
                    index: index as u32,
                    reason: "is claimed twice",
                });
            }
            *slot = Some(register);
        }
    }

    let mut out = [GateRegister::Unused; N];
    for (index, (slot, entry)) in slots.iter().zip(out.iter_mut()).enumerate() {
        *entry = slot.ok_or_else(|| EmulatorError::InvalidHandlerTable {
            table,
            index: index as u32,
            reason: "has no handler",
        })?;
    }
    Ok(out)
}

/// Validated handler tables for both windows
#[derive(Debug, Clone)]
pub struct GateTables {
    pub(super) main: [GateRegister; MAIN_TABLE_SIZE],
    pub(super) sub: [GateRegister; SUB_TABLE_SIZE],
}

impl GateTables {
    pub fn new() -> Result<Self> {
        Ok(Self {
            main: build_gate_table("main", MAIN_LAYOUT)?,
            sub: build_gate_table("sub", SUB_LAYOUT)?,
        })
    }

    /// Handler for a byte offset of `side`'s window
    pub fn lookup(&self, side: Side, offset: u32) -> GateRegister {
        match side {
            Side::Main => self.main[(offset & MAIN_WINDOW_MASK) as usize],
            Side::Sub => self
                .sub
                .get((offset & SUB_WINDOW_MASK) as usize)
                .copied()
                .unwrap_or(GateRegister::Unused),
        }
    }
}

/// Rotate left by one, the flag register's cross-byte write quirk
#[inline(always)]
fn rol8(value: u8) -> u8 {
    value.rotate_left(1)
}

impl SegaCd {
    /// Byte read from the main CPU's Gate Array window
    pub fn main_gate_read8(&mut self, offset: u32) -> u8 {
        self.gate_read8(Side::Main, offset & MAIN_WINDOW_MASK)
    }

    /// Word read from the main CPU's Gate Array window
    pub fn main_gate_read16(&mut self, offset: u32) -> u16 {
        self.gate_read16(Side::Main, offset & MAIN_WINDOW_MASK & !1)
    }

    /// Byte write to the main CPU's Gate Array window
    pub fn main_gate_write8(&mut self, offset: u32, value: u8) {
        self.gate_write8(Side::Main, offset & MAIN_WINDOW_MASK, value);
    }

    /// Word write to the main CPU's Gate Array window
    pub fn main_gate_write16(&mut self, offset: u32, value: u16) {
        self.gate_write16(Side::Main, offset & MAIN_WINDOW_MASK & !1, value);
    }

    /// Byte read from the sub CPU's Gate Array window
    pub fn sub_gate_read8(&mut self, offset: u32) -> u8 {
        self.gate_read8(Side::Sub, offset & SUB_WINDOW_MASK)
    }

    /// Word read from the sub CPU's Gate Array window
    pub fn sub_gate_read16(&mut self, offset: u32) -> u16 {
        self.gate_read16(Side::Sub, offset & SUB_WINDOW_MASK & !1)
    }

    /// Byte write to the sub CPU's Gate Array window
    pub fn sub_gate_write8(&mut self, offset: u32, value: u8) {
        self.gate_write8(Side::Sub, offset & SUB_WINDOW_MASK, value);
    }

    /// Word write to the sub CPU's Gate Array window
    pub fn sub_gate_write16(&mut self, offset: u32, value: u16) {
        self.gate_write16(Side::Sub, offset & SUB_WINDOW_MASK & !1, value);
    }

    fn gate_read8(&mut self, side: Side, offset: u32) -> u8 {
        let register = self.gate_tables.lookup(side, offset);
        let offset = offset as u8;
        let odd = offset & 1 != 0;

        match register {
            GateRegister::MainInterrupt => self.gate.get(fields::IEN2) << 7,
            GateRegister::BusRequest => self.gate.busreq(),
            GateRegister::SubReset => self.gate.byte(offset),
            GateRegister::WriteProtect => self.gate.get(fields::WRITE_PROTECT),
            GateRegister::MemoryMode => match side {
                Side::Main => {
                    self.word_ram.main_view() | (self.gate.get(fields::PRG_BANK) << fields::PRG_BANK.shift)
                }
                Side::Sub => self.word_ram.sub_view(),
            },
            GateRegister::CdcMode => self.cdc.mode(),
            GateRegister::CdcIndex => self.cdc.index(),
            GateRegister::CdcData => {
                if odd {
                    let value = self.cdc.read_register();
                    self.poll_cdc_irq();
                    value
                } else {
                    0
                }
            }
            GateRegister::HostData => {
                if odd {
                    self.host_latch[side as usize]
                } else {
                    let [high, low] = self.cdc_host_read(side).to_be_bytes();
                    self.host_latch[side as usize] = low;
                    high
                }
            }
            GateRegister::DmaAddress => {
                let [high, low] = self.cdc.dma_address().to_be_bytes();
                if odd {
                    low
                } else {
                    high
                }
            }
            GateRegister::HintVector => {
                let [high, low] = self.gate.hint_vector().to_be_bytes();
                if odd {
                    low
                } else {
                    high
                }
            }
            GateRegister::Stopwatch => {
                let [high, low] = self.gate.stopwatch().to_be_bytes();
                if odd {
                    low
                } else {
                    high
                }
            }
            GateRegister::Flag => self.gate.read_flag(side, offset),
            GateRegister::Comm => self.gate.read_comm(side, offset),
            GateRegister::Timer => {
                if odd {
                    self.gate.get(fields::TIMER)
                } else {
                    0
                }
            }
            GateRegister::InterruptMask => {
                if odd {
                    self.interrupts.read_mask()
                } else {
                    0
                }
            }
            GateRegister::Fader => {
                let [high, low] = self.cdd.fader().to_be_bytes();
                if odd {
                    low
                } else {
                    high
                }
            }
            GateRegister::CddControl => {
                if odd {
                    self.gate.byte(fields::HOCK.offset)
                } else {
                    self.cdd.data_mode() as u8
                }
            }
            GateRegister::CddStatus => {
                let index = (offset - 0x38) as usize;
                if index == BLOCK_LEN - 1 {
                    // Reading the checksum nibble acknowledges the block
                    self.gate.set(fields::DRS, 0);
                }
                self.cdd.status_nibble(index)
            }
            GateRegister::CddCommand => self.cdd.command_nibble((offset - 0x42) as usize),
            GateRegister::Font => self.gate.byte(offset),
            GateRegister::FontData => self.gate.font_data(offset),
            GateRegister::Graphics => self.gfx.read8(offset),
            GateRegister::Unused => {
                log::trace!("Gate: {:?} read of unused 0x{:02X}", side, offset);
                0
            }
        }
    }

    fn gate_read16(&mut self, side: Side, offset: u32) -> u16 {
        match self.gate_tables.lookup(side, offset) {
            // One register access, not two
            GateRegister::CdcData => {
                let value = self.cdc.read_register();
                self.poll_cdc_irq();
                value as u16
            }
            GateRegister::HostData => self.cdc_host_read(side),
            GateRegister::Graphics => self.gfx.read16(offset as u8),
            _ => {
                let high = self.gate_read8(side, offset);
                let low = self.gate_read8(side, offset + 1);
                u16::from_be_bytes([high, low])
            }
        }
    }

    fn gate_write8(&mut self, side: Side, offset: u32, value: u8) {
        let register = self.gate_tables.lookup(side, offset);
        let offset = offset as u8;
        let odd = offset & 1 != 0;

        match (register, side) {
            (GateRegister::MainInterrupt, _) => {
                if value & fields::IFL2.bits() != 0 {
                    self.interrupts.request(levels::MAIN_REQUEST);
                }
            }
            (GateRegister::BusRequest, _) => {
                let effect = self.gate.write_busreq(value);
                if effect.reset_sub {
                    self.sub_reset_pending = true;
                }
                if effect.prg_mapping_changed {
                    log::debug!(
                        "Gate: PRG window {}",
                        if self.gate.main_prg_access() { "mapped" } else { "unmapped" }
                    );
                }
            }
            (GateRegister::SubReset, _) => {
                if !odd {
                    self.gate.set(fields::LED, value);
                }
            }
            (GateRegister::WriteProtect, Side::Main) => {
                if value != self.gate.get(fields::WRITE_PROTECT) {
                    log::debug!("Gate: PRG write protect 0x{:02X}", value);
                }
                self.gate.set(fields::WRITE_PROTECT, value);
            }
            (GateRegister::MemoryMode, Side::Main) => {
                let bank = fields::PRG_BANK.extract(value);
                if bank != self.gate.get(fields::PRG_BANK) {
                    log::debug!("Gate: PRG bank {} -> {}", self.gate.get(fields::PRG_BANK), bank);
                    self.gate.set(fields::PRG_BANK, bank);
                }
                if self.word_ram.write_main(value) {
                    self.remap_word_ram();
                }
            }
            (GateRegister::MemoryMode, Side::Sub) => {
                if self.word_ram.write_sub(value) {
                    self.remap_word_ram();
                }
            }
            (GateRegister::CdcMode, Side::Sub) => self.cdc.write_mode(value),
            (GateRegister::CdcIndex, _) => self.cdc.write_index(value),
            (GateRegister::CdcData, _) => {
                if odd {
                    self.cdc.write_register(value);
                    self.poll_cdc_irq();
                }
            }
            (GateRegister::DmaAddress, _) => self.cdc.write_dma_address(!odd, value),
            (GateRegister::HintVector, _) => self.gate.write_hint_vector(!odd, value),
            (GateRegister::Stopwatch, Side::Sub) => self.gate.reset_stopwatch(),
            (GateRegister::Flag, _) => {
                // A side always writes its own flag; the other byte rotates
                let own = match side {
                    Side::Main => 0x0E,
                    Side::Sub => 0x0F,
                };
                let value = if offset == own { value } else { rol8(value) };
                self.gate.write_flag(side, value);
            }
            (GateRegister::Comm, _) => self.gate.write_comm(side, offset, value),
            (GateRegister::Timer, _) => {
                if odd {
                    self.gate.write_timer(value);
                }
            }
            (GateRegister::InterruptMask, _) => {
                if odd {
                    self.write_interrupt_mask(value);
                }
            }
            (GateRegister::Fader, _) => self.cdd.write_fader(!odd, value),
            (GateRegister::CddControl, _) => {
                if odd {
                    self.write_cdd_control(value);
                }
            }
            (GateRegister::CddCommand, _) => {
                let index = (offset - 0x42) as usize;
                self.cdd.write_command(index, value);
                if index == BLOCK_LEN - 1 {
                    self.cdd.execute();
                }
            }
            (GateRegister::Font, _) => self.gate.set_byte(offset, value),
            (GateRegister::Graphics, _) => {
                if self.gfx.write8(offset, value) {
                    self.gfx.start(&self.word_ram);
                }
            }
            _ => {
                log::trace!(
                    "Gate: {:?} write 0x{:02X} to 0x{:02X} ({:?}) dropped",
                    side,
                    value,
                    offset,
                    register
                );
            }
        }
    }

    fn gate_write16(&mut self, side: Side, offset: u32, value: u16) {
        let [high, low] = value.to_be_bytes();
        match self.gate_tables.lookup(side, offset) {
            GateRegister::CdcData if side == Side::Sub => {
                self.cdc.write_register(low);
                self.poll_cdc_irq();
            }
            GateRegister::Flag => match side {
                Side::Main => self.gate.write_flag(Side::Main, high),
                Side::Sub => self.gate.write_flag(Side::Sub, low),
            },
            GateRegister::Graphics if side == Side::Sub => {
                if self.gfx.write16(offset as u8, value) {
                    self.gfx.start(&self.word_ram);
                }
            }
            _ => {
                self.gate_write8(side, offset, high);
                self.gate_write8(side, offset + 1, low);
            }
        }
    }

    fn write_interrupt_mask(&mut self, value: u8) {
        let was_enabled = self.gate.get(fields::IEN4) != 0;
        self.gate.set(fields::INTERRUPT_MASK, value);
        self.interrupts.write_mask(value);
        if !was_enabled && self.gate.get(fields::IEN4) != 0 && self.gate.get(fields::HOCK) != 0 {
            self.export_cdd_status();
        }
    }

    fn write_cdd_control(&mut self, value: u8) {
        let was_clocked = self.gate.get(fields::HOCK) != 0;
        self.gate.set(fields::HOCK, fields::HOCK.extract(value));
        if !was_clocked && self.gate.get(fields::HOCK) != 0 {
            log::debug!("CDD: host clock enabled");
            self.export_cdd_status();
        }
    }

    /// Make the current CDD status block visible to the sub CPU
    ///
    /// Sets DRS and raises level 4 while the host clock is on.
    pub(super) fn export_cdd_status(&mut self) {
        self.gate.set(fields::DRS, 1);
        if self.gate.get(fields::HOCK) != 0 {
            self.interrupts.request(levels::CDD);
        }
    }

    fn cdc_host_read(&mut self, side: Side) -> u16 {
        let value = self.cdc.host_read(side);
        self.poll_cdc_irq();
        value
    }

    pub(super) fn poll_cdc_irq(&mut self) {
        if self.cdc.take_irq() {
            self.interrupts.request(levels::CDC);
        }
    }
}
