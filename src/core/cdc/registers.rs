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

//! CDC register indices and bit definitions

use bitflags::bitflags;

/// Read register indices
pub mod read {
    pub const COMIN: u8 = 0x0;
    pub const IFSTAT: u8 = 0x1;
    pub const DBCL: u8 = 0x2;
    pub const DBCH: u8 = 0x3;
    pub const HEAD0: u8 = 0x4;
    pub const HEAD1: u8 = 0x5;
    pub const HEAD2: u8 = 0x6;
    pub const HEAD3: u8 = 0x7;
    pub const PTL: u8 = 0x8;
    pub const PTH: u8 = 0x9;
    pub const WAL: u8 = 0xA;
    pub const WAH: u8 = 0xB;
    pub const STAT0: u8 = 0xC;
    pub const STAT1: u8 = 0xD;
    pub const STAT2: u8 = 0xE;
    pub const STAT3: u8 = 0xF;
}

/// Write register indices
pub mod write {
    pub const SBOUT: u8 = 0x0;
    pub const IFCTRL: u8 = 0x1;
    pub const DBCL: u8 = 0x2;
    pub const DBCH: u8 = 0x3;
    pub const DACL: u8 = 0x4;
    pub const DACH: u8 = 0x5;
    pub const DTTRG: u8 = 0x6;
    pub const DTACK: u8 = 0x7;
    pub const WAL: u8 = 0x8;
    pub const WAH: u8 = 0x9;
    pub const CTRL0: u8 = 0xA;
    pub const CTRL1: u8 = 0xB;
    pub const PTL: u8 = 0xC;
    pub const PTH: u8 = 0xD;
    pub const RESET: u8 = 0xF;
}

bitflags! {
    /// IFSTAT (all status bits active low)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IfStat: u8 {
        const CMDI = 1 << 7;
        const DTEI = 1 << 6;
        const DECI = 1 << 5;
        const DTBSY = 1 << 3;
        const STBSY = 1 << 2;
        const DTEN = 1 << 1;
        const STEN = 1 << 0;
    }
}

bitflags! {
    /// IFCTRL
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IfCtrl: u8 {
        const CMDIEN = 1 << 7;
        const DTEIEN = 1 << 6;
        const DECIEN = 1 << 5;
        const CMDBK = 1 << 4;
        const DTWAI = 1 << 3;
        const STWAI = 1 << 2;
        const DOUTEN = 1 << 1;
        const SOUTEN = 1 << 0;
    }
}

bitflags! {
    /// CTRL0
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ctrl0: u8 {
        const DECEN = 1 << 7;
        const E01RQ = 1 << 5;
        const AUTORQ = 1 << 4;
        const ERAMRQ = 1 << 3;
        const WRRQ = 1 << 2;
        const QRQ = 1 << 1;
        const PRQ = 1 << 0;
    }
}

/// IFSTAT bits that raise the CDC interrupt when active and enabled
pub const INTERRUPT_SOURCES: u8 = 0x70;

/// STAT0: CRC check passed
pub const STAT0_CRCOK: u8 = 0x80;

/// STAT3: status invalid (active high)
pub const STAT3_VALST: u8 = 0x80;

/// CTRL1 bits mirrored to STAT2 (MODRQ, FORMRQ)
pub const CTRL1_MODE_BITS: u8 = 0x0C;
