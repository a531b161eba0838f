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

//! CD controller (CDC)
//!
//! Emulates the LC8951-compatible block decoder of the expansion unit:
//! - Index + data register front end (Gate Array 0x05 / 0x07)
//! - 16 KiB decode ring receiving one raw sector per disc tick
//! - Host data port (Gate Array 0x08) for CPU-driven transfers
//! - DMA engine moving a bounded burst per scheduler tick to PCM RAM,
//!   PRG RAM or Word RAM
//!
//! # Transfer States
//!
//! ```text
//! IDLE --DTTRG (DOUTEN)--> ARMED/TRANSFERRING --DBC exhausted--> COMPLETE
//! ```
//!
//! On completion DTBSY is cleared, EDT is set, DSR is cleared and, if
//! DTEIEN is set, the data-end interrupt is raised.
//!
//! # Example
//!
//! ```
//! use mcdrx::core::cdc::{Cdc, Destination};
//! use mcdrx::core::gate_array::Side;
//!
//! let mut cdc = Cdc::new();
//! cdc.write_mode(Destination::SubHost.bits());
//!
//! // Nothing armed: host reads return 0 with no effect
//! assert_eq!(cdc.host_read(Side::Sub), 0);
//! assert!(!cdc.is_busy());
//! ```

pub mod registers;
#[cfg(test)]
mod tests;

use crate::core::cdrom::{CDPosition, SECTOR_SIZE};
use crate::core::gate_array::{fields, Side};
use crate::core::word_ram::WordRam;
use registers::{Ctrl0, IfCtrl, IfStat};

/// Decode ring size
pub const RING_SIZE: usize = 0x4000;

/// Offset of the sector header inside a raw sector
const HEADER_OFFSET: usize = 12;

/// Transfer destination (Gate Array 0x04 bits 0-2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Main CPU host data port
    MainHost,
    /// Sub CPU host data port
    SubHost,
    /// PCM wave RAM (DMA)
    PcmRam,
    /// PRG RAM (DMA)
    PrgRam,
    /// Word RAM (DMA)
    WordRam,
    /// Unassigned selector value
    None(u8),
}

impl Destination {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 7 {
            2 => Destination::MainHost,
            3 => Destination::SubHost,
            4 => Destination::PcmRam,
            5 => Destination::PrgRam,
            7 => Destination::WordRam,
            other => Destination::None(other),
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Destination::MainHost => 2,
            Destination::SubHost => 3,
            Destination::PcmRam => 4,
            Destination::PrgRam => 5,
            Destination::WordRam => 7,
            Destination::None(bits) => bits & 7,
        }
    }

    /// Whether the destination is served by the DMA engine
    pub fn is_dma(self) -> bool {
        matches!(
            self,
            Destination::PcmRam | Destination::PrgRam | Destination::WordRam
        )
    }

    fn host_side(self) -> Option<Side> {
        match self {
            Destination::MainHost => Some(Side::Main),
            Destination::SubHost => Some(Side::Sub),
            _ => None,
        }
    }
}

/// Memory that can receive CDC DMA bursts
pub trait DmaTarget {
    /// Store `data` starting at destination byte offset `offset`
    fn dma_write(&mut self, offset: u32, data: &[u8]);
}

impl DmaTarget for Vec<u8> {
    fn dma_write(&mut self, offset: u32, data: &[u8]) {
        let len = self.len();
        if len == 0 {
            return;
        }
        for (i, &byte) in data.iter().enumerate() {
            self[(offset as usize + i) % len] = byte;
        }
    }
}

impl DmaTarget for WordRam {
    fn dma_write(&mut self, offset: u32, data: &[u8]) {
        WordRam::dma_write(self, offset, data);
    }
}

/// CD controller state
pub struct Cdc {
    /// Gate Array 0x04: destination, DSR, EDT
    pub(super) mode: u8,

    /// Register index (Gate Array 0x05)
    pub(super) index: u8,

    /// DMA address register (Gate Array 0x0A)
    pub(super) dma_address: u16,

    pub(super) ifstat: IfStat,
    pub(super) ifctrl: IfCtrl,
    pub(super) ctrl0: Ctrl0,
    pub(super) ctrl1: u8,
    pub(super) sbout: u8,

    /// Data byte counter (count - 1); negative once exhausted
    pub(super) dbc: i32,

    /// Data address counter (ring read pointer)
    pub(super) dac: u16,

    /// Write address (ring write pointer)
    pub(super) wa: u16,

    /// Block pointer (header of the last decoded sector)
    pub(super) pt: u16,

    /// HEAD0-3: minute, second, frame (BCD), mode
    pub(super) header: [u8; 4],

    /// STAT0-3
    pub(super) stat: [u8; 4],

    /// Decode ring
    pub(super) ring: Vec<u8>,

    /// Interrupt edge for the level 5 line
    pub(super) irq_pending: bool,

    /// Sectors ingested since reset
    pub(super) sectors_decoded: u64,
}

impl Cdc {
    /// Create a CDC with power-on state
    pub fn new() -> Self {
        let mut cdc = Self {
            mode: 0,
            index: 0,
            dma_address: 0,
            ifstat: IfStat::from_bits_retain(0xFF),
            ifctrl: IfCtrl::empty(),
            ctrl0: Ctrl0::empty(),
            ctrl1: 0,
            sbout: 0,
            dbc: 0,
            dac: 0,
            wa: 0,
            pt: 0,
            header: [0; 4],
            stat: [0; 4],
            ring: vec![0; RING_SIZE],
            irq_pending: false,
            sectors_decoded: 0,
        };
        cdc.reset();
        cdc
    }

    /// Chip reset
    ///
    /// Aborts any transfer without raising an interrupt: the transfer reads
    /// as not busy and complete (EDT set, DSR clear).
    pub fn reset(&mut self) {
        self.ifstat = IfStat::from_bits_retain(0xFF);
        self.ifctrl = IfCtrl::empty();
        self.ctrl0 = Ctrl0::empty();
        self.ctrl1 = 0;
        self.sbout = 0;
        self.dbc = 0;
        self.dac = 0;
        self.wa = 0;
        self.pt = 0;
        self.header = [0; 4];
        self.stat = [0, 0, 0, registers::STAT3_VALST];
        self.mode = fields::CDC_EDT.insert(self.mode, 1);
        self.mode = fields::CDC_DSR.insert(self.mode, 0);
        self.irq_pending = false;
        log::debug!("CDC: reset");
    }

    // ------------------------------------------------------------------
    // Gate Array facing registers (0x04, 0x05, 0x0A)
    // ------------------------------------------------------------------

    /// Gate Array 0x04: EDT, DSR, destination
    pub fn mode(&self) -> u8 {
        self.mode
    }

    /// Sub CPU write to Gate Array 0x04
    ///
    /// Selects the destination and clears EDT. DSR is kept while a transfer
    /// is in progress.
    pub fn write_mode(&mut self, value: u8) {
        let dsr = if self.is_busy() {
            fields::CDC_DSR.extract(self.mode)
        } else {
            0
        };
        self.mode = fields::CDC_DESTINATION.extract(value);
        self.mode = fields::CDC_DSR.insert(self.mode, dsr);
        log::trace!("CDC: destination {:?}", self.destination());
    }

    pub fn destination(&self) -> Destination {
        Destination::from_bits(fields::CDC_DESTINATION.extract(self.mode))
    }

    /// End of data transfer flag
    pub fn transfer_complete(&self) -> bool {
        fields::CDC_EDT.extract(self.mode) != 0
    }

    /// Data set ready flag
    pub fn data_ready(&self) -> bool {
        fields::CDC_DSR.extract(self.mode) != 0
    }

    /// Register index (Gate Array 0x05)
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Sub CPU write to Gate Array 0x05
    pub fn write_index(&mut self, value: u8) {
        self.index = fields::CDC_INDEX.extract(value);
    }

    pub fn dma_address(&self) -> u16 {
        self.dma_address
    }

    /// Sub CPU write to one byte of Gate Array 0x0A-0x0B
    pub fn write_dma_address(&mut self, high: bool, value: u8) {
        self.dma_address = if high {
            (self.dma_address & 0x00FF) | ((value as u16) << 8)
        } else {
            (self.dma_address & 0xFF00) | value as u16
        };
    }

    // ------------------------------------------------------------------
    // Index + data register front end
    // ------------------------------------------------------------------

    fn advance_index(&mut self) {
        self.index = (self.index + 1) & 0x0F;
    }

    /// Read the register selected by the index, then advance the index
    pub fn read_register(&mut self) -> u8 {
        debug_assert!(self.index < 16);
        let value = match self.index {
            registers::read::COMIN => 0,
            registers::read::IFSTAT => self.ifstat.bits(),
            registers::read::DBCL => self.dbc as u8,
            registers::read::DBCH => (self.dbc >> 8) as u8,
            registers::read::HEAD0..=registers::read::HEAD3 => {
                self.header[(self.index - registers::read::HEAD0) as usize]
            }
            registers::read::PTL => self.pt as u8,
            registers::read::PTH => (self.pt >> 8) as u8,
            registers::read::WAL => self.wa as u8,
            registers::read::WAH => (self.wa >> 8) as u8,
            registers::read::STAT0..=registers::read::STAT2 => {
                self.stat[(self.index - registers::read::STAT0) as usize]
            }
            _ => {
                // STAT3: reading it acknowledges the decoder interrupt
                let value = self.stat[3];
                self.ifstat.insert(IfStat::DECI);
                self.stat[3] |= registers::STAT3_VALST;
                value
            }
        };
        log::trace!("CDC: read reg {:X} = 0x{:02X}", self.index, value);
        self.advance_index();
        value
    }

    /// Write the register selected by the index, then advance the index
    pub fn write_register(&mut self, value: u8) {
        debug_assert!(self.index < 16);
        log::trace!("CDC: write reg {:X} = 0x{:02X}", self.index, value);
        match self.index {
            registers::write::SBOUT => self.sbout = value,
            registers::write::IFCTRL => self.write_ifctrl(value),
            registers::write::DBCL => self.dbc = (self.dbc & 0x0F00) | value as i32,
            registers::write::DBCH => self.dbc = (self.dbc & 0x00FF) | ((value as i32 & 0x0F) << 8),
            registers::write::DACL => self.dac = (self.dac & 0xFF00) | value as u16,
            registers::write::DACH => self.dac = (self.dac & 0x00FF) | ((value as u16) << 8),
            registers::write::DTTRG => self.trigger_transfer(),
            registers::write::DTACK => self.ifstat.insert(IfStat::DTEI),
            registers::write::WAL => self.wa = (self.wa & 0xFF00) | value as u16,
            registers::write::WAH => self.wa = (self.wa & 0x00FF) | ((value as u16) << 8),
            registers::write::CTRL0 => self.ctrl0 = Ctrl0::from_bits_truncate(value),
            registers::write::CTRL1 => {
                self.ctrl1 = value;
                self.stat[2] = value & registers::CTRL1_MODE_BITS;
            }
            registers::write::PTL => self.pt = (self.pt & 0xFF00) | value as u16,
            registers::write::PTH => self.pt = (self.pt & 0x00FF) | ((value as u16) << 8),
            registers::write::RESET => {
                let mode = self.mode;
                self.reset();
                // Chip reset leaves the Gate Array destination alone
                self.mode = fields::CDC_DESTINATION.insert(self.mode, mode);
            }
            _ => {}
        }
        self.advance_index();
    }

    fn write_ifctrl(&mut self, value: u8) {
        let was_active = self.interrupt_line();
        self.ifctrl = IfCtrl::from_bits_truncate(value);

        if !self.ifctrl.contains(IfCtrl::DOUTEN) {
            // Data output disabled: any transfer stops
            self.ifstat.insert(IfStat::DTBSY | IfStat::DTEN);
        }
        if !was_active && self.interrupt_line() {
            self.irq_pending = true;
        }
    }

    /// Active (low) status bits enabled in IFCTRL
    fn interrupt_line(&self) -> bool {
        !self.ifstat.bits() & self.ifctrl.bits() & registers::INTERRUPT_SOURCES != 0
    }

    fn trigger_transfer(&mut self) {
        if !self.ifctrl.contains(IfCtrl::DOUTEN) {
            log::trace!("CDC: DTTRG ignored, DOUTEN clear");
            return;
        }
        self.ifstat.remove(IfStat::DTBSY | IfStat::DTEN);
        self.mode = fields::CDC_EDT.insert(self.mode, 0);
        self.mode = fields::CDC_DSR.insert(self.mode, 1);
        log::debug!(
            "CDC: transfer armed, {} bytes from 0x{:04X} to {:?}",
            self.dbc + 1,
            self.dac,
            self.destination()
        );
    }

    // ------------------------------------------------------------------
    // Transfers
    // ------------------------------------------------------------------

    /// Whether a transfer is in progress
    pub fn is_busy(&self) -> bool {
        !self.ifstat.contains(IfStat::DTBSY)
    }

    /// Bytes left in the current transfer
    pub fn remaining(&self) -> u32 {
        if self.is_busy() {
            (self.dbc + 1).max(0) as u32
        } else {
            0
        }
    }

    fn finish_transfer(&mut self) {
        self.dbc = 0;
        self.ifstat.insert(IfStat::DTBSY | IfStat::DTEN);
        self.ifstat.remove(IfStat::DTEI);
        self.mode = fields::CDC_EDT.insert(self.mode, 1);
        self.mode = fields::CDC_DSR.insert(self.mode, 0);
        if self.ifctrl.contains(IfCtrl::DTEIEN) {
            self.irq_pending = true;
        }
        log::debug!("CDC: transfer complete");
    }

    #[inline(always)]
    fn ring_byte(&self, address: u16) -> u8 {
        self.ring[address as usize & (RING_SIZE - 1)]
    }

    /// Host data port read (Gate Array 0x08)
    ///
    /// # Returns
    ///
    /// The next big-endian word of the ring, or 0 with no side effect when
    /// no transfer is active or the destination is not `side`'s host port
    pub fn host_read(&mut self, side: Side) -> u16 {
        if !self.is_busy() || self.destination().host_side() != Some(side) {
            return 0;
        }
        let value = u16::from_be_bytes([self.ring_byte(self.dac), self.ring_byte(self.dac.wrapping_add(1))]);
        self.dac = self.dac.wrapping_add(2);
        self.dbc -= 2;
        if self.dbc <= 0 {
            self.finish_transfer();
        }
        value
    }

    /// Move one DMA burst
    ///
    /// # Arguments
    ///
    /// * `target` - Memory selected by the destination register
    /// * `quantum` - Maximum bytes per call
    ///
    /// # Returns
    ///
    /// Number of bytes copied
    pub fn dma_tick(&mut self, target: &mut dyn DmaTarget, quantum: u32) -> usize {
        let destination = self.destination();
        if !self.is_busy() || !destination.is_dma() {
            return 0;
        }
        let count = self.remaining().min(quantum) as usize;
        let (offset, step) = match destination {
            Destination::PcmRam => (((self.dma_address & 0x03FF) as u32) << 2, count >> 2),
            _ => ((self.dma_address as u32) << 3, count >> 3),
        };

        // Copy straight out of the ring, in two pieces when the burst wraps
        let mut copied = 0;
        while copied < count {
            let start = (self.dac as usize + copied) & (RING_SIZE - 1);
            let len = (count - copied).min(RING_SIZE - start);
            target.dma_write(offset + copied as u32, &self.ring[start..start + len]);
            copied += len;
        }
        log::trace!(
            "CDC: DMA {} bytes to {:?} @0x{:05X}",
            count,
            destination,
            offset
        );

        self.dma_address = self.dma_address.wrapping_add(step as u16);
        self.dac = self.dac.wrapping_add(count as u16);
        self.dbc -= count as i32;
        if self.dbc < 0 {
            self.finish_transfer();
        }
        count
    }

    /// Ingest one sector from the drive
    ///
    /// # Arguments
    ///
    /// * `lba` - Position the sector was read from
    /// * `sector` - Raw sector, `None` when unreadable
    pub fn decode_sector(&mut self, lba: i32, sector: Option<&[u8; SECTOR_SIZE]>) {
        let [minute, second, frame] = CDPosition::from_lba(lba).to_bcd();
        self.header = [minute, second, frame, 0x01];

        if !self.ctrl0.contains(Ctrl0::DECEN) {
            return;
        }

        match sector {
            Some(raw) => {
                self.stat[0] = registers::STAT0_CRCOK;
                if self.ctrl0.contains(Ctrl0::WRRQ) {
                    self.pt = self.wa.wrapping_add(HEADER_OFFSET as u16);
                    let base = self.wa as usize;
                    for (i, &byte) in raw.iter().enumerate() {
                        let value = match i.checked_sub(HEADER_OFFSET) {
                            Some(h) if h < 4 => self.header[h],
                            _ => byte,
                        };
                        self.ring[(base + i) & (RING_SIZE - 1)] = value;
                    }
                    self.wa = self.wa.wrapping_add(SECTOR_SIZE as u16);
                }
            }
            None => {
                log::warn!("CDC: unreadable sector at LBA {}", lba);
                self.stat[0] = 0;
            }
        }

        self.sectors_decoded += 1;
        self.stat[3] &= !registers::STAT3_VALST;
        self.ifstat.remove(IfStat::DECI);
        if self.ifctrl.contains(IfCtrl::DECIEN) {
            self.irq_pending = true;
        }
        log::trace!("CDC: decoded LBA {} (WA=0x{:04X})", lba, self.wa);
    }

    /// Take the level 5 interrupt edge
    pub fn take_irq(&mut self) -> bool {
        std::mem::take(&mut self.irq_pending)
    }

    /// Sectors decoded since power-on
    pub fn sectors_decoded(&self) -> u64 {
        self.sectors_decoded
    }

    /// Decode ring contents
    pub fn ring(&self) -> &[u8] {
        &self.ring
    }
}

impl Default for Cdc {
    fn default() -> Self {
        Self::new()
    }
}
