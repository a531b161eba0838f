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

//! CD drive (CDD) protocol
//!
//! The sub CPU talks to the drive through two 10-nibble blocks in the Gate
//! Array: a command block (0x42-0x4B) and a status block (0x38-0x41). Writing
//! the last command nibble dispatches the command through an opcode table;
//! the resulting status is formatted on the next disc tick (75 Hz) and
//! exported once.
//!
//! # Drive States
//!
//! | State        | Status nibble |
//! |--------------|---------------|
//! | Stopped      | 0x0           |
//! | Playing      | 0x1           |
//! | Seeking      | 0x2           |
//! | FastForward  | 0x3           |
//! | FastRewind   | 0x3           |
//! | Ready        | 0x4           |
//! | Paused       | 0x4           |
//! | TrayOpen     | 0x5           |
//! | NoDisc       | 0xB           |
//!
//! # Block Layout
//!
//! ```text
//! nibble:   0       1       2-3   4-5   6-7   8      9
//! command:  opcode  -       min   sec   frame -      checksum
//! status:   status  report  min   sec   frame extra  checksum
//! ```

mod commands;
#[cfg(test)]
mod tests;

use crate::core::cdc::Cdc;
use crate::core::cdrom::{CDPosition, DiscSource, Toc, TrackType, LEAD_IN_FRAMES};
use crate::core::error::{EmulatorError, Result};
use serde::{Deserialize, Serialize};

/// Nibbles per command or status block
pub const BLOCK_LEN: usize = 10;

/// Sectors skipped per disc tick while fast forwarding or rewinding
pub const SCAN_STEP: i32 = 10;

/// Minimum ticks between a play/seek command and the first sector
pub const MIN_SEEK_TICKS: u32 = 13;

/// Command handler signature
pub type CommandHandler = fn(&mut Cdd);

/// Mechanical / logical drive state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveState {
    NoDisc,
    TrayOpen,
    Stopped,
    Seeking,
    Ready,
    Playing,
    FastForward,
    FastRewind,
    Paused,
}

impl DriveState {
    /// Status nibble reported in block position 0
    pub fn status_code(self) -> u8 {
        match self {
            DriveState::Stopped => 0x0,
            DriveState::Playing => 0x1,
            DriveState::Seeking => 0x2,
            DriveState::FastForward | DriveState::FastRewind => 0x3,
            DriveState::Ready | DriveState::Paused => 0x4,
            DriveState::TrayOpen => 0x5,
            DriveState::NoDisc => 0xB,
        }
    }
}

/// Which report the status block carries in nibbles 1-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Report {
    /// Absolute disc position
    AbsolutePosition,
    /// Position relative to the start of the current track
    RelativePosition,
    /// Current track number
    CurrentTrack,
    /// Lead-out position
    TotalLength,
    /// First and last track numbers
    TrackRange,
    /// Start position and type of a track
    TrackStart(u8),
    /// Drive not ready: position fields zeroed
    NotReady,
}

impl Report {
    /// Report code (status nibble 1)
    pub fn code(self) -> u8 {
        match self {
            Report::AbsolutePosition | Report::NotReady => 0x0,
            Report::RelativePosition => 0x1,
            Report::CurrentTrack => 0x2,
            Report::TotalLength => 0x3,
            Report::TrackRange => 0x4,
            Report::TrackStart(_) => 0x5,
        }
    }
}

/// Checksum nibble over the first nine nibbles of a block
///
/// # Example
///
/// ```
/// use mcdrx::core::cdd::checksum;
///
/// assert_eq!(checksum(&[0; 9]), 0xF);
/// assert_eq!(checksum(&[1, 2, 3, 0, 0, 0, 0, 0, 0]), 0x9);
/// ```
pub fn checksum(nibbles: &[u8]) -> u8 {
    let sum: u32 = nibbles.iter().take(BLOCK_LEN - 1).map(|&n| n as u32).sum();
    !(sum as u8) & 0x0F
}

/// Build a 16-entry opcode table from `(opcode, handler)` pairs
///
/// # Errors
///
/// Returns `EmulatorError::InvalidHandlerTable` for an opcode above 0xF or
/// an opcode listed twice.
pub fn build_command_table(
    entries: &[(u8, CommandHandler)],
) -> Result<[Option<CommandHandler>; 16]> {
    let mut table: [Option<CommandHandler>; 16] = [None; 16];
    for &(opcode, handler) in entries {
        let slot = table
            .get_mut(opcode as usize)
            .ok_or_else(|| EmulatorError::InvalidHandlerTable {
                table: "CDD",
                index: opcode as u32,
                reason: "is not a 4-bit opcode",
            })?;
        if slot.is_some() {
            return Err(EmulatorError::InvalidHandlerTable {
                table: "CDD",
                index: opcode as u32,
                reason: "is registered twice",
            });
        }
        *slot = Some(handler);
    }
    Ok(table)
}

/// CD drive state
pub struct Cdd {
    pub(super) state: DriveState,

    /// Current position
    pub(super) lba: i32,

    /// Track at `lba` (100 past the last track)
    pub(super) track: u8,

    /// Ticks left before the seek completes / the first sector is read
    pub(super) delay: u32,

    pub(super) report: Report,

    /// A handler finished; format and export on the next disc tick
    pub(super) complete: bool,

    pub(super) command: [u8; BLOCK_LEN],
    pub(super) status: [u8; BLOCK_LEN],

    /// DM flag: current track is a data track
    pub(super) data_mode: bool,

    /// Gate Array 0x34-0x35
    pub(super) fader: u16,

    disc: Option<Box<dyn DiscSource>>,
    handlers: [Option<CommandHandler>; 16],
}

impl Cdd {
    /// Create a drive with an empty tray
    ///
    /// # Errors
    ///
    /// Fails if the opcode table is malformed.
    pub fn new() -> Result<Self> {
        let handlers = build_command_table(commands::COMMANDS)?;
        let mut cdd = Self {
            state: DriveState::NoDisc,
            lba: 0,
            track: 0,
            delay: 0,
            report: Report::NotReady,
            complete: false,
            command: [0; BLOCK_LEN],
            status: [0; BLOCK_LEN],
            data_mode: false,
            fader: 0,
            disc: None,
            handlers,
        };
        cdd.reset();
        Ok(cdd)
    }

    /// Drive reset: abort any command, park at LBA 0
    pub fn reset(&mut self) {
        self.state = if self.disc.is_some() {
            DriveState::Stopped
        } else {
            DriveState::NoDisc
        };
        self.lba = 0;
        self.track = self.track_at(0);
        self.delay = 0;
        self.report = Report::AbsolutePosition;
        self.complete = false;
        self.command = [0; BLOCK_LEN];
        self.status = [0; BLOCK_LEN];
        self.status[0] = self.state.status_code();
        self.status[BLOCK_LEN - 1] = checksum(&self.status);
        self.data_mode = false;
        self.fader = 0;
    }

    // ------------------------------------------------------------------
    // Disc
    // ------------------------------------------------------------------

    /// Put a disc in the drive
    pub fn insert_disc(&mut self, disc: Box<dyn DiscSource>) {
        log::info!(
            "CDD: disc inserted ({} tracks, lead-out LBA {})",
            disc.toc().last_track(),
            disc.toc().lead_out()
        );
        self.disc = Some(disc);
        if self.state == DriveState::NoDisc {
            self.state = DriveState::Stopped;
        }
        self.lba = 0;
        self.track = self.track_at(0);
    }

    /// Remove the disc
    pub fn eject_disc(&mut self) -> Option<Box<dyn DiscSource>> {
        let disc = self.disc.take();
        if disc.is_some() {
            log::info!("CDD: disc ejected");
        }
        if self.state != DriveState::TrayOpen {
            self.state = DriveState::NoDisc;
        }
        self.delay = 0;
        self.data_mode = false;
        disc
    }

    pub fn has_disc(&self) -> bool {
        self.disc.is_some()
    }

    /// Table of contents of the inserted disc
    pub fn toc(&self) -> Option<&Toc> {
        self.disc.as_ref().map(|disc| disc.toc())
    }

    fn track_at(&self, lba: i32) -> u8 {
        self.toc().map_or(0, |toc| toc.lba_to_track(lba))
    }

    fn lead_out(&self) -> i32 {
        self.toc().map_or(0, |toc| toc.lead_out())
    }

    fn is_data_track(&self, track: u8) -> bool {
        self.toc()
            .and_then(|toc| toc.track(track))
            .is_some_and(|t| t.track_type == TrackType::Data)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> DriveState {
        self.state
    }

    pub fn lba(&self) -> i32 {
        self.lba
    }

    pub fn track(&self) -> u8 {
        self.track
    }

    /// DM flag (Gate Array 0x36 bit 0)
    pub fn data_mode(&self) -> bool {
        self.data_mode
    }

    pub fn fader(&self) -> u16 {
        self.fader
    }

    /// Sub CPU write to one byte of 0x34-0x35
    pub fn write_fader(&mut self, high: bool, value: u8) {
        self.fader = if high {
            (self.fader & 0x00FF) | ((value as u16) << 8)
        } else {
            (self.fader & 0xFF00) | value as u16
        };
    }

    /// Status block nibble (Gate Array 0x38 + index)
    pub fn status_nibble(&self, index: usize) -> u8 {
        self.status[index % BLOCK_LEN]
    }

    pub fn status_block(&self) -> &[u8; BLOCK_LEN] {
        &self.status
    }

    /// Command block nibble readback (Gate Array 0x42 + index)
    pub fn command_nibble(&self, index: usize) -> u8 {
        self.command[index % BLOCK_LEN]
    }

    /// Whether a status export is waiting for the next disc tick
    pub fn export_pending(&self) -> bool {
        self.complete
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Store one command nibble (Gate Array 0x42-0x4B)
    pub fn write_command(&mut self, index: usize, value: u8) {
        self.command[index % BLOCK_LEN] = value & 0x0F;
    }

    /// Dispatch the command block
    ///
    /// A checksum mismatch is logged and the command runs anyway.
    pub fn execute(&mut self) {
        let expected = checksum(&self.command);
        if expected != self.command[BLOCK_LEN - 1] {
            log::debug!(
                "CDD: command checksum mismatch (got {:X}, expected {:X})",
                self.command[BLOCK_LEN - 1],
                expected
            );
        }

        let opcode = self.command[0];
        match self.handlers[opcode as usize] {
            Some(handler) => {
                log::debug!("CDD: command {:X} {:?}", opcode, &self.command[2..8]);
                handler(self);
            }
            None => log::warn!("CDD: unknown command {:X}, echoing status", opcode),
        }
        self.complete = true;
    }

    /// Short-circuit handlers while the tray is open or the drive is empty
    ///
    /// # Returns
    ///
    /// `true` when the drive can service the command
    pub(super) fn drive_ready(&mut self) -> bool {
        match self.state {
            DriveState::TrayOpen | DriveState::NoDisc => {
                self.report = Report::NotReady;
                false
            }
            _ => true,
        }
    }

    /// BCD MSF parameter in nibbles 2-7, as an LBA
    pub(super) fn command_lba(&self) -> i32 {
        let n = &self.command;
        CDPosition::from_bcd(
            (n[2] << 4) | n[3],
            (n[4] << 4) | n[5],
            (n[6] << 4) | n[7],
        )
        .to_lba()
    }

    /// Move the pickup to `target` and schedule the first read
    pub(super) fn seek_to(&mut self, target: i32, state: DriveState) {
        let target = target.clamp(-LEAD_IN_FRAMES, self.lead_out());
        let distance = (target - self.lba).unsigned_abs();
        self.delay = MIN_SEEK_TICKS.max(distance >> 12);
        self.lba = target;
        self.track = self.track_at(target);
        self.data_mode = self.is_data_track(self.track);
        self.state = state;
        log::debug!(
            "CDD: seek to LBA {} (track {}, {} ticks)",
            target,
            self.track,
            self.delay
        );
    }

    // ------------------------------------------------------------------
    // Disc tick
    // ------------------------------------------------------------------

    /// One 75 Hz disc tick
    ///
    /// # Returns
    ///
    /// `true` when a status block was formatted and must be exported
    pub fn tick(&mut self, cdc: &mut Cdc) -> bool {
        match self.state {
            DriveState::Seeking => {
                self.delay = self.delay.saturating_sub(1);
                if self.delay == 0 {
                    self.state = DriveState::Ready;
                    self.complete = true;
                }
            }
            DriveState::Playing => self.play_tick(cdc),
            DriveState::FastForward => {
                self.lba = (self.lba + SCAN_STEP).min(self.lead_out());
                self.track = self.track_at(self.lba);
            }
            DriveState::FastRewind => {
                self.lba = (self.lba - SCAN_STEP).max(-LEAD_IN_FRAMES);
                self.track = self.track_at(self.lba);
            }
            _ => {}
        }

        if std::mem::take(&mut self.complete) {
            self.format_status();
            true
        } else {
            false
        }
    }

    fn play_tick(&mut self, cdc: &mut Cdc) {
        if self.delay > 0 {
            self.delay -= 1;
            return;
        }
        if self.lba >= self.lead_out() {
            log::debug!("CDD: lead-out reached");
            self.state = DriveState::Stopped;
            self.complete = true;
            return;
        }

        if self.data_mode {
            let sector = self.disc.as_ref().and_then(|disc| disc.read_sector(self.lba));
            cdc.decode_sector(self.lba, sector.as_ref());
        }

        self.lba += 1;
        let track = self.track_at(self.lba);
        if track != self.track {
            self.track = track;
            self.data_mode = self.is_data_track(track);
        }
    }

    /// Format the status block for the current report
    pub(super) fn format_status(&mut self) {
        let mut block = [0u8; BLOCK_LEN];
        block[0] = self.state.status_code();
        block[1] = self.report.code();

        let fields = match self.report {
            Report::NotReady => [0; 7],
            Report::AbsolutePosition => msf_fields(CDPosition::from_lba(self.lba), 0),
            Report::RelativePosition => {
                let start = self
                    .toc()
                    .and_then(|toc| toc.track(self.track))
                    .map_or(self.lba, |t| t.start_lba);
                msf_fields(CDPosition::from_frames((self.lba - start).max(0)), 0)
            }
            Report::CurrentTrack => {
                let bcd = if self.track > self.toc().map_or(0, |toc| toc.last_track()) {
                    0xA2
                } else {
                    crate::core::cdrom::dec_to_bcd(self.track)
                };
                [bcd >> 4, bcd & 0x0F, 0, 0, 0, 0, 0]
            }
            Report::TotalLength => msf_fields(CDPosition::from_lba(self.lead_out()), 0),
            Report::TrackRange => {
                let (first, last) = self
                    .toc()
                    .map_or((0, 0), |toc| (toc.first_track(), toc.last_track()));
                let first = crate::core::cdrom::dec_to_bcd(first);
                let last = crate::core::cdrom::dec_to_bcd(last);
                [first >> 4, first & 0x0F, last >> 4, last & 0x0F, 0, 0, 0]
            }
            Report::TrackStart(number) => match self.toc().and_then(|toc| toc.track(number)) {
                Some(track) => {
                    let mut fields = msf_fields(track.start_position(), number & 0x0F);
                    if track.track_type == TrackType::Data {
                        fields[4] |= 0x08;
                    }
                    fields
                }
                None => [0; 7],
            },
        };

        block[2..BLOCK_LEN - 1].copy_from_slice(&fields);
        block[BLOCK_LEN - 1] = checksum(&block);
        self.status = block;
        log::trace!("CDD: status {:X?}", block);
    }
}

/// Nibbles 2-8 for an MSF position plus the extra nibble
fn msf_fields(position: CDPosition, extra: u8) -> [u8; 7] {
    let [m, s, f] = position.to_bcd();
    [m >> 4, m & 0x0F, s >> 4, s & 0x0F, f >> 4, f & 0x0F, extra]
}
