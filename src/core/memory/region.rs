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

//! Address map region tables
//!
//! Each CPU side has its own ordered table of `(start, end, kind)` regions.
//! Tables are validated once when built; lookups are a binary search.

use crate::core::error::{EmulatorError, Result};
use crate::core::word_ram::WordRamMode;

/// Which handler serves a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    // Main CPU
    /// Boot ROM with the HINT vector override
    BootRom,
    /// 128 KiB window into PRG RAM (bank select in the memory mode register)
    PrgWindow,
    /// RAM cart size register
    RamCartSize,
    /// RAM cart data (odd bytes)
    RamCart,
    /// RAM cart write enable register
    RamCartControl,

    // Sub CPU
    /// 512 KiB PRG RAM
    PrgRam,
    /// Backup RAM (odd bytes)
    BackupRam,
    /// PCM registers and wave RAM window (odd bytes)
    Pcm,

    // Both
    /// 2M mode linear Word RAM
    WordRam2M,
    /// 1M mode: the accessing side's own bank, linear
    WordRamBank,
    /// 1M mode main window: cell-arranged view of the main bank
    WordRamCell,
    /// 1M mode sub window: one 4-bit pixel per byte of the sub bank
    WordRamNibble,
    /// Gate Array registers
    GateArray,
}

/// One address range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// First address (inclusive)
    pub start: u32,
    /// Last address (inclusive)
    pub end: u32,
    pub kind: RegionKind,
}

impl Region {
    pub const fn new(start: u32, end: u32, kind: RegionKind) -> Self {
        Self { start, end, kind }
    }

    #[inline(always)]
    pub fn contains(&self, address: u32) -> bool {
        (self.start..=self.end).contains(&address)
    }

    /// Offset of `address` (24-bit) from the region start
    #[inline(always)]
    pub fn offset(&self, address: u32) -> u32 {
        (address & AddressMap::ADDRESS_MASK).wrapping_sub(self.start)
    }
}

/// Ordered, non-overlapping region table over a 24-bit address space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressMap {
    regions: Vec<Region>,
}

impl AddressMap {
    /// Highest decodable address
    pub const ADDRESS_MASK: u32 = 0xFF_FFFF;

    /// Build and validate a table
    ///
    /// # Errors
    ///
    /// Returns `EmulatorError::InvalidAddressMap` when a region is empty,
    /// lies outside the 24-bit space, or overlaps / precedes the previous one.
    ///
    /// # Example
    ///
    /// ```
    /// use mcdrx::core::memory::{AddressMap, Region, RegionKind};
    ///
    /// let map = AddressMap::new(vec![
    ///     Region::new(0x000000, 0x07FFFF, RegionKind::PrgRam),
    ///     Region::new(0xFF8000, 0xFFFFFF, RegionKind::GateArray),
    /// ])
    /// .unwrap();
    /// assert!(map.claims(0x001000));
    /// assert!(!map.claims(0x100000));
    ///
    /// assert!(AddressMap::new(vec![
    ///     Region::new(0x000000, 0x07FFFF, RegionKind::PrgRam),
    ///     Region::new(0x070000, 0x0BFFFF, RegionKind::WordRam2M),
    /// ])
    /// .is_err());
    /// ```
    pub fn new(regions: Vec<Region>) -> Result<Self> {
        let mut previous_end: Option<u32> = None;
        for region in &regions {
            if region.start > region.end {
                return Err(Self::invalid(region, "ends before it starts"));
            }
            if region.end > Self::ADDRESS_MASK {
                return Err(Self::invalid(region, "is outside the 24-bit address space"));
            }
            if previous_end.is_some_and(|end| region.start <= end) {
                return Err(Self::invalid(
                    region,
                    "overlaps or precedes the previous region",
                ));
            }
            previous_end = Some(region.end);
        }
        Ok(Self { regions })
    }

    fn invalid(region: &Region, reason: &'static str) -> EmulatorError {
        EmulatorError::InvalidAddressMap {
            start: region.start,
            end: region.end,
            reason,
        }
    }

    /// Region serving `address`
    #[inline]
    pub fn lookup(&self, address: u32) -> Option<&Region> {
        let address = address & Self::ADDRESS_MASK;
        let index = self.regions.partition_point(|r| r.end < address);
        self.regions.get(index).filter(|r| r.contains(address))
    }

    /// Whether any region serves `address`
    pub fn claims(&self, address: u32) -> bool {
        self.lookup(address).is_some()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }
}

/// Main CPU address map for a Word RAM mode
///
/// | Range               | 2M mode     | 1M mode            |
/// |---------------------|-------------|--------------------|
/// | 0x000000-0x01FFFF   | Boot ROM    | Boot ROM           |
/// | 0x020000-0x03FFFF   | PRG window  | PRG window         |
/// | 0x200000-0x21FFFF   | Word RAM    | Main bank          |
/// | 0x220000-0x23FFFF   | Word RAM    | Cell-arranged bank |
/// | 0x400000-0x400001   | Cart size   | Cart size          |
/// | 0x600000-0x61FFFF   | RAM cart    | RAM cart           |
/// | 0x7FFFFE-0x7FFFFF   | Cart enable | Cart enable        |
/// | 0xA12000-0xA120FF   | Gate Array  | Gate Array         |
pub fn main_map(mode: WordRamMode) -> Result<AddressMap> {
    let mut regions = vec![
        Region::new(0x000000, 0x01FFFF, RegionKind::BootRom),
        Region::new(0x020000, 0x03FFFF, RegionKind::PrgWindow),
    ];
    match mode {
        WordRamMode::TwoMeg => {
            regions.push(Region::new(0x200000, 0x23FFFF, RegionKind::WordRam2M));
        }
        WordRamMode::OneMeg => {
            regions.push(Region::new(0x200000, 0x21FFFF, RegionKind::WordRamBank));
            regions.push(Region::new(0x220000, 0x23FFFF, RegionKind::WordRamCell));
        }
    }
    regions.extend([
        Region::new(0x400000, 0x400001, RegionKind::RamCartSize),
        Region::new(0x600000, 0x61FFFF, RegionKind::RamCart),
        Region::new(0x7FFFFE, 0x7FFFFF, RegionKind::RamCartControl),
        Region::new(0xA12000, 0xA120FF, RegionKind::GateArray),
    ]);
    AddressMap::new(regions)
}

/// Sub CPU address map for a Word RAM mode
///
/// | Range               | 2M mode     | 1M mode       |
/// |---------------------|-------------|---------------|
/// | 0x000000-0x07FFFF   | PRG RAM     | PRG RAM       |
/// | 0x080000-0x0BFFFF   | Word RAM    | Nibble window |
/// | 0x0C0000-0x0DFFFF   | -           | Sub bank      |
/// | 0xFE0000-0xFEFFFF   | Backup RAM  | Backup RAM    |
/// | 0xFF0000-0xFF7FFF   | PCM         | PCM           |
/// | 0xFF8000-0xFFFFFF   | Gate Array  | Gate Array    |
pub fn sub_map(mode: WordRamMode) -> Result<AddressMap> {
    let mut regions = vec![Region::new(0x000000, 0x07FFFF, RegionKind::PrgRam)];
    match mode {
        WordRamMode::TwoMeg => {
            regions.push(Region::new(0x080000, 0x0BFFFF, RegionKind::WordRam2M));
        }
        WordRamMode::OneMeg => {
            regions.push(Region::new(0x080000, 0x0BFFFF, RegionKind::WordRamNibble));
            regions.push(Region::new(0x0C0000, 0x0DFFFF, RegionKind::WordRamBank));
        }
    }
    regions.extend([
        Region::new(0xFE0000, 0xFEFFFF, RegionKind::BackupRam),
        Region::new(0xFF0000, 0xFF7FFF, RegionKind::Pcm),
        Region::new(0xFF8000, 0xFFFFFF, RegionKind::GateArray),
    ]);
    AddressMap::new(regions)
}
