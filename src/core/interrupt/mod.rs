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

//! Sub CPU Interrupt Controller
//!
//! Tracks the interrupt requests raised by the expansion unit's peripherals
//! and presents the highest pending level to the sub CPU.
//!
//! ## Mask Register
//!
//! The mask lives in the Gate Array at sub offset 0x33. Bit `n` enables
//! level `n`. A request for a level whose mask bit is clear is dropped, it is
//! not latched for later.
//!
//! ## Interrupt Sources (Levels)
//!
//! ```text
//! Level | Source        | Description
//! ------|---------------|-------------------------------------------
//! 1     | GRAPHICS      | Stamp rotation/scaling operation finished
//! 2     | MAIN_REQUEST  | Main CPU wrote IFL2 in Gate Array reg 0x00
//! 3     | TIMER         | Timer register 0x31 counted down
//! 4     | CDD           | CD drive status block ready
//! 5     | CDC           | CD controller decode / transfer end
//! 6     | SUBCODE       | Subcode buffer (not generated by this core)
//! ```

/// Interrupt level constants
pub mod levels {
    /// Graphics operation complete (level 1)
    pub const GRAPHICS: u8 = 1;

    /// Main CPU request through IFL2 (level 2)
    pub const MAIN_REQUEST: u8 = 2;

    /// Timer expired (level 3)
    pub const TIMER: u8 = 3;

    /// CDD status ready (level 4)
    pub const CDD: u8 = 4;

    /// CDC decoder / data end (level 5)
    pub const CDC: u8 = 5;

    /// Subcode buffer (level 6)
    pub const SUBCODE: u8 = 6;
}

/// Sub CPU interrupt controller
///
/// # Example
///
/// ```
/// use mcdrx::core::interrupt::{levels, InterruptController};
///
/// let mut ic = InterruptController::new();
///
/// // Masked: the request is dropped
/// assert!(!ic.request(levels::CDD));
///
/// ic.write_mask(1 << levels::CDD);
/// assert!(ic.request(levels::CDD));
/// assert_eq!(ic.highest_pending(), levels::CDD);
///
/// ic.acknowledge(levels::CDD);
/// assert_eq!(ic.highest_pending(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InterruptController {
    /// Pending levels, bit n = level n
    pending: u8,

    /// Gate Array mask register (sub 0x33)
    mask: u8,
}

impl InterruptController {
    /// Create a new interrupt controller with nothing pending and all levels masked
    pub fn new() -> Self {
        Self {
            pending: 0,
            mask: 0,
        }
    }

    /// Request an interrupt
    ///
    /// # Arguments
    ///
    /// * `level` - Interrupt level (1-6)
    ///
    /// # Returns
    ///
    /// `true` if the level was enabled and is now pending
    pub fn request(&mut self, level: u8) -> bool {
        debug_assert!((1..=6).contains(&level), "invalid interrupt level {}", level);
        let bit = 1u8 << level;
        if self.mask & bit == 0 {
            log::trace!("IRQ{} dropped (masked), mask=0x{:02X}", level, self.mask);
            return false;
        }
        self.pending |= bit;
        log::trace!("IRQ{} requested, pending=0x{:02X}", level, self.pending);
        true
    }

    /// Acknowledge (clear) a pending level
    pub fn acknowledge(&mut self, level: u8) {
        self.pending &= !(1u8 << (level & 7));
        log::trace!("IRQ{} acknowledged, pending=0x{:02X}", level, self.pending);
    }

    /// Highest pending and enabled level, 0 when none
    pub fn highest_pending(&self) -> u8 {
        let active = self.pending & self.mask & 0x7E;
        if active == 0 {
            0
        } else {
            7 - active.leading_zeros() as u8
        }
    }

    /// Check whether a level is pending
    pub fn is_pending(&self, level: u8) -> bool {
        self.pending & self.mask & (1u8 << (level & 7)) != 0
    }

    /// Check if any enabled interrupt is pending
    pub fn any_pending(&self) -> bool {
        self.highest_pending() != 0
    }

    /// Read the mask register
    pub fn read_mask(&self) -> u8 {
        self.mask
    }

    /// Write the mask register
    ///
    /// Bit 0 is unused and always reads back as 0.
    pub fn write_mask(&mut self, value: u8) {
        self.mask = value & 0x7E;
        log::debug!("IRQ mask set: 0x{:02X}", self.mask);
    }

    /// Raw pending bits (bit n = level n)
    pub fn pending_bits(&self) -> u8 {
        self.pending
    }

    /// Drop every pending request
    pub fn clear(&mut self) {
        self.pending = 0;
    }

    pub(crate) fn restore(&mut self, pending: u8, mask: u8) {
        self.pending = pending & 0x7E;
        self.mask = mask & 0x7E;
    }
}

#[cfg(test)]
mod tests;
