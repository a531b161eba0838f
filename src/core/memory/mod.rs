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

//! Address decoding and plain memories
//!
//! This module owns the memories that have no behavior of their own (boot
//! ROM, PRG RAM, backup RAM, RAM cart) and the per-side region tables the
//! bus views dispatch through. Peripheral-backed regions (Word RAM, PCM,
//! Gate Array) are routed by [`RegionKind`] to their owners in
//! `core::system`.
//!
//! # Example
//!
//! ```
//! use mcdrx::core::memory::{main_map, sub_map, RegionKind};
//! use mcdrx::core::word_ram::WordRamMode;
//!
//! let main = main_map(WordRamMode::OneMeg).unwrap();
//! assert_eq!(main.lookup(0x220000).unwrap().kind, RegionKind::WordRamCell);
//!
//! let sub = sub_map(WordRamMode::TwoMeg).unwrap();
//! assert_eq!(sub.lookup(0xFF8003).unwrap().kind, RegionKind::GateArray);
//! assert!(sub.lookup(0x0C0000).is_none());
//! ```

mod region;
#[cfg(test)]
mod tests;

pub use region::{main_map, sub_map, AddressMap, Region, RegionKind};

use crate::core::error::{EmulatorError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Boot ROM size
pub const BOOT_ROM_SIZE: usize = 0x20000;

/// PRG RAM size
pub const PRG_RAM_SIZE: usize = 0x80000;

/// Size of the main CPU's PRG RAM window
pub const PRG_WINDOW_SIZE: usize = 0x20000;

/// Backup RAM size
pub const BACKUP_RAM_SIZE: usize = 0x2000;

/// RAM cart size
pub const RAM_CART_SIZE: usize = 0x10000;

/// RAM cart size register value (8 KiB << n)
pub const RAM_CART_SIZE_CODE: u8 = 3;

/// Boot ROM bytes replaced by the HINT vector register
pub const HINT_VECTOR_OFFSET: u32 = 0x72;

/// Memories without side effects
pub struct Memory {
    /// Boot ROM (main CPU 0x000000)
    boot_rom: Vec<u8>,

    /// PRG RAM (sub CPU 0x000000, main window 0x020000)
    pub(super) prg_ram: Vec<u8>,

    /// Backup RAM (sub CPU 0xFE0000, odd bytes)
    pub(super) backup_ram: Vec<u8>,

    /// RAM cart (main CPU 0x600000, odd bytes)
    pub(super) cart_ram: Vec<u8>,

    /// RAM cart write enable (main 0x7FFFFF bit 0)
    pub(super) cart_write_enable: bool,
}

impl Memory {
    /// Create memories filled with zeros
    pub fn new() -> Self {
        Self {
            boot_rom: vec![0; BOOT_ROM_SIZE],
            prg_ram: vec![0; PRG_RAM_SIZE],
            backup_ram: vec![0; BACKUP_RAM_SIZE],
            cart_ram: vec![0; RAM_CART_SIZE],
            cart_write_enable: false,
        }
    }

    /// Clear volatile memory
    ///
    /// Boot ROM, backup RAM and the RAM cart keep their contents.
    pub fn reset(&mut self) {
        self.prg_ram.fill(0);
        self.cart_write_enable = false;
    }

    /// Load a boot ROM image from file
    ///
    /// Images shorter than 128 KiB are zero padded.
    ///
    /// # Errors
    ///
    /// - `EmulatorError::BootRomNotFound` if the file cannot be opened
    /// - `EmulatorError::InvalidBootRomSize` if it is larger than 128 KiB
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mcdrx::core::memory::Memory;
    ///
    /// let mut memory = Memory::new();
    /// memory.load_boot_rom("us_scd1_9210.bin").unwrap();
    /// ```
    pub fn load_boot_rom<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .map_err(|_| EmulatorError::BootRomNotFound(path.display().to_string()))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        self.load_boot_rom_bytes(&data)?;
        log::info!("Boot ROM loaded from {} ({} bytes)", path.display(), data.len());
        Ok(())
    }

    /// Install a boot ROM image
    pub fn load_boot_rom_bytes(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > BOOT_ROM_SIZE {
            return Err(EmulatorError::InvalidBootRomSize {
                max: BOOT_ROM_SIZE,
                got: data.len(),
            });
        }
        self.boot_rom.fill(0);
        self.boot_rom[..data.len()].copy_from_slice(data);
        Ok(())
    }

    #[inline(always)]
    pub fn boot_rom_byte(&self, offset: u32) -> u8 {
        self.boot_rom[offset as usize & (BOOT_ROM_SIZE - 1)]
    }

    #[inline(always)]
    pub fn prg_byte(&self, offset: u32) -> u8 {
        self.prg_ram[offset as usize & (PRG_RAM_SIZE - 1)]
    }

    #[inline(always)]
    pub fn set_prg_byte(&mut self, offset: u32, value: u8) {
        self.prg_ram[offset as usize & (PRG_RAM_SIZE - 1)] = value;
    }

    pub fn prg_ram(&self) -> &[u8] {
        &self.prg_ram
    }

    /// PRG RAM as a CDC DMA destination
    pub fn prg_ram_mut(&mut self) -> &mut Vec<u8> {
        &mut self.prg_ram
    }

    /// Backup RAM byte for a sub CPU address (odd bytes carry data)
    pub fn backup_read(&self, address: u32) -> u8 {
        self.backup_ram[Self::backup_index(address)]
    }

    pub fn backup_write(&mut self, address: u32, value: u8) {
        self.backup_ram[Self::backup_index(address)] = value;
    }

    fn backup_index(address: u32) -> usize {
        ((address & 0x3FFF) >> 1) as usize
    }

    pub fn backup_ram(&self) -> &[u8] {
        &self.backup_ram
    }

    /// Restore backup RAM from a saved image (truncated or zero padded)
    pub fn load_backup_ram(&mut self, data: &[u8]) {
        let len = data.len().min(BACKUP_RAM_SIZE);
        self.backup_ram.fill(0);
        self.backup_ram[..len].copy_from_slice(&data[..len]);
    }

    /// RAM cart byte for a main CPU address
    pub fn cart_read(&self, address: u32) -> u8 {
        self.cart_ram[Self::cart_index(address)]
    }

    /// RAM cart write; dropped unless writes are enabled
    pub fn cart_write(&mut self, address: u32, value: u8) {
        if !self.cart_write_enable {
            log::trace!("RAM cart: write to 0x{:06X} while protected", address);
            return;
        }
        self.cart_ram[Self::cart_index(address)] = value;
    }

    fn cart_index(address: u32) -> usize {
        ((address & 0x1FFFF) >> 1) as usize
    }

    pub fn cart_write_enable(&self) -> bool {
        self.cart_write_enable
    }

    pub fn set_cart_write_enable(&mut self, enable: bool) {
        self.cart_write_enable = enable;
    }

    pub fn cart_ram(&self) -> &[u8] {
        &self.cart_ram
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
