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

//! Sub-byte register fields
//!
//! Every bit field of the Gate Array is described here as an
//! `(offset, shift, mask)` triple. Offsets are in the sub CPU's view of the
//! register block.

/// A bit field inside one register byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Byte offset inside the register block
    pub offset: u8,
    /// Bit position of the field's LSB
    pub shift: u8,
    /// Field mask (right-aligned)
    pub mask: u8,
}

impl Field {
    pub const fn new(offset: u8, shift: u8, mask: u8) -> Self {
        Self {
            offset,
            shift,
            mask,
        }
    }

    /// Extract the field from a register byte
    #[inline(always)]
    pub const fn extract(&self, byte: u8) -> u8 {
        (byte >> self.shift) & self.mask
    }

    /// Replace the field inside a register byte
    #[inline(always)]
    pub const fn insert(&self, byte: u8, value: u8) -> u8 {
        (byte & !(self.mask << self.shift)) | ((value & self.mask) << self.shift)
    }

    /// Field bits in place
    #[inline(always)]
    pub const fn bits(&self) -> u8 {
        self.mask << self.shift
    }
}

/// LED control (sub 0x00): green, red
pub const LED: Field = Field::new(0x00, 0, 0x03);

/// Peripheral ready flag (sub 0x01)
pub const RES0: Field = Field::new(0x01, 0, 0x01);

/// PRG RAM write protect, in 512-byte units (0x02)
pub const WRITE_PROTECT: Field = Field::new(0x02, 0, 0xFF);

/// Word RAM return: 2M mode owner / 1M mode bank swap (0x03)
pub const RET: Field = Field::new(0x03, 0, 0x01);

/// Word RAM DMNA handshake (0x03)
pub const DMNA: Field = Field::new(0x03, 1, 0x01);

/// Word RAM mode: 0 = 2M, 1 = 1M (0x03)
pub const MODE: Field = Field::new(0x03, 2, 0x01);

/// Word RAM priority mode (0x03)
pub const PRIORITY_MODE: Field = Field::new(0x03, 3, 0x03);

/// PRG RAM bank seen through the main CPU window (main 0x03)
pub const PRG_BANK: Field = Field::new(0x03, 6, 0x03);

/// CDC transfer destination (0x04)
pub const CDC_DESTINATION: Field = Field::new(0x04, 0, 0x07);

/// CDC data set ready (0x04)
pub const CDC_DSR: Field = Field::new(0x04, 6, 0x01);

/// CDC end of data transfer (0x04)
pub const CDC_EDT: Field = Field::new(0x04, 7, 0x01);

/// CDC register index (0x05)
pub const CDC_INDEX: Field = Field::new(0x05, 0, 0x0F);

/// Main CPU communication flag (0x0E)
pub const MAIN_FLAG: Field = Field::new(0x0E, 0, 0xFF);

/// Sub CPU communication flag (0x0F)
pub const SUB_FLAG: Field = Field::new(0x0F, 0, 0xFF);

/// Timer interval (0x31)
pub const TIMER: Field = Field::new(0x31, 0, 0xFF);

/// Interrupt mask (0x33)
pub const INTERRUPT_MASK: Field = Field::new(0x33, 0, 0x7E);

/// Level 2 interrupt enable, mirrored to main 0x00 bit 7
pub const IEN2: Field = Field::new(0x33, 2, 0x01);

/// Level 4 interrupt enable (CDD)
pub const IEN4: Field = Field::new(0x33, 4, 0x01);

/// CDD data/music flag (0x36)
pub const CDD_DATA_MODE: Field = Field::new(0x36, 0, 0x01);

/// CDD host clock enable (0x37)
pub const HOCK: Field = Field::new(0x37, 2, 0x01);

/// CDD status block ready (0x37)
pub const DRS: Field = Field::new(0x37, 1, 0x01);

/// CDD command send (0x37)
pub const DTS: Field = Field::new(0x37, 0, 0x01);

/// Font color for 0 bits (0x4D)
pub const FONT_COLOR_0: Field = Field::new(0x4D, 0, 0x0F);

/// Font color for 1 bits (0x4D)
pub const FONT_COLOR_1: Field = Field::new(0x4D, 4, 0x0F);

/// Main CPU reset/bus request (main 0x01): SRES
pub const SRES: Field = Field::new(0x01, 0, 0x01);

/// Main CPU reset/bus request (main 0x01): SBRQ
pub const SBRQ: Field = Field::new(0x01, 1, 0x01);

/// Main CPU level 2 interrupt request (main 0x00)
pub const IFL2: Field = Field::new(0x00, 0, 0x01);

/// Fields stored in the register block, checked for overlap by tests
pub const ALL: &[Field] = &[
    LED,
    RES0,
    WRITE_PROTECT,
    RET,
    DMNA,
    MODE,
    PRIORITY_MODE,
    PRG_BANK,
    CDC_DESTINATION,
    CDC_DSR,
    CDC_EDT,
    CDC_INDEX,
    MAIN_FLAG,
    SUB_FLAG,
    TIMER,
    INTERRUPT_MASK,
    CDD_DATA_MODE,
    HOCK,
    DRS,
    DTS,
    FONT_COLOR_0,
    FONT_COLOR_1,
];
