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

//! CD-ROM addressing and disc access
//!
//! Shared by the CD controller (CDC) and the CD drive (CDD):
//! - MSF <-> LBA conversion and BCD helpers
//! - The [`DiscSource`] trait the drive reads sectors through
//! - [`DiscImage`], an in-memory raw 2352-byte sector image
//!
//! # MSF Addressing
//!
//! Positions on the disc are Minute:Second:Frame with 75 frames per second.
//! Internally everything is a linear LBA; the 150-frame (2 second) lead-in
//! is subtracted, so `00:02:00` is LBA 0.
//!
//! # Example
//!
//! ```rust
//! use mcdrx::core::cdrom::CDPosition;
//!
//! let pos = CDPosition::new(0, 2, 0);
//! assert_eq!(pos.to_lba(), 0);
//! assert_eq!(CDPosition::from_lba(-150), CDPosition::new(0, 0, 0));
//! ```

mod disc;
#[cfg(test)]
mod tests;

pub use disc::{DiscImage, Toc, Track, TrackType, MAX_TRACKS};

/// Raw sector size in bytes (sync + header + user data + EDC/ECC)
pub const SECTOR_SIZE: usize = 2352;

/// Lead-in frames subtracted from the MSF position to form the LBA
pub const LEAD_IN_FRAMES: i32 = 150;

/// Frames per second of disc time
pub const FRAMES_PER_SECOND: i32 = 75;

/// Track number reported for positions past the last track
pub const PAST_LAST_TRACK: u8 = 100;

/// Disc position in MSF (Minute:Second:Frame) format
///
/// All values are stored as decimal (not BCD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CDPosition {
    /// Minute (0-99)
    pub minute: u8,
    /// Second (0-59)
    pub second: u8,
    /// Frame (0-74)
    pub frame: u8,
}

impl CDPosition {
    /// Create a new position
    pub fn new(minute: u8, second: u8, frame: u8) -> Self {
        Self {
            minute,
            second,
            frame,
        }
    }

    /// Convert MSF to logical block address (LBA)
    ///
    /// LBA = (minute * 60 + second) * 75 + frame - 150
    pub fn to_lba(&self) -> i32 {
        (self.minute as i32 * 60 + self.second as i32) * FRAMES_PER_SECOND + self.frame as i32
            - LEAD_IN_FRAMES
    }

    /// Convert logical block address to MSF
    ///
    /// LBAs before the lead-in clamp to `00:00:00`.
    pub fn from_lba(lba: i32) -> Self {
        let total = (lba + LEAD_IN_FRAMES).max(0);
        let minute = (total / FRAMES_PER_SECOND / 60) as u8;
        let second = ((total / FRAMES_PER_SECOND) % 60) as u8;
        let frame = (total % FRAMES_PER_SECOND) as u8;
        Self::new(minute, second, frame)
    }

    /// Duration form: a frame count without the lead-in offset
    ///
    /// Used for lengths (track length, total disc length) where no
    /// lead-in applies.
    pub fn from_frames(frames: i32) -> Self {
        Self::from_lba(frames - LEAD_IN_FRAMES)
    }

    /// Decode a position from three BCD bytes
    pub fn from_bcd(minute: u8, second: u8, frame: u8) -> Self {
        Self::new(bcd_to_dec(minute), bcd_to_dec(second), bcd_to_dec(frame))
    }

    /// Encode the position as three BCD bytes
    pub fn to_bcd(&self) -> [u8; 3] {
        [
            dec_to_bcd(self.minute),
            dec_to_bcd(self.second),
            dec_to_bcd(self.frame),
        ]
    }
}

/// Convert a BCD byte to decimal
#[inline(always)]
pub fn bcd_to_dec(value: u8) -> u8 {
    (value >> 4) * 10 + (value & 0x0F)
}

/// Convert a decimal value (0-99) to BCD
#[inline(always)]
pub fn dec_to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

/// Source of raw disc sectors
///
/// Container parsing (cue sheets, compressed images) lives outside the
/// core; anything that can produce a table of contents and raw sectors can
/// be inserted into the drive.
pub trait DiscSource {
    /// Table of contents of the inserted disc
    fn toc(&self) -> &Toc;

    /// Read one raw 2352-byte sector
    ///
    /// Returns `None` for unreadable sectors or positions outside the
    /// program area.
    fn read_sector(&self, lba: i32) -> Option<[u8; SECTOR_SIZE]>;
}
