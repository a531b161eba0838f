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

//! CDD opcode handlers
//!
//! Every handler except tray open/close first checks that the drive can
//! service commands; see [`Cdd::drive_ready`].

use super::{Cdd, CommandHandler, DriveState, Report};

/// Opcode table entries
pub(super) const COMMANDS: &[(u8, CommandHandler)] = &[
    (0x0, status),
    (0x1, stop),
    (0x2, read_toc),
    (0x3, play),
    (0x4, seek),
    (0x6, pause),
    (0x7, resume),
    (0x8, fast_forward),
    (0x9, fast_rewind),
    (0xA, recover),
    (0xC, close_tray),
    (0xD, open_tray),
];

/// 0x0: report state and absolute position
fn status(cdd: &mut Cdd) {
    if !cdd.drive_ready() {
        return;
    }
    cdd.report = Report::AbsolutePosition;
}

/// 0x1
fn stop(cdd: &mut Cdd) {
    if !cdd.drive_ready() {
        return;
    }
    cdd.state = DriveState::Stopped;
    cdd.delay = 0;
    cdd.report = Report::AbsolutePosition;
}

/// 0x2: table of contents query, sub-op in nibble 2
fn read_toc(cdd: &mut Cdd) {
    if !cdd.drive_ready() {
        return;
    }
    cdd.report = match cdd.command[2] {
        0x0 => Report::AbsolutePosition,
        0x1 => Report::RelativePosition,
        0x2 => Report::CurrentTrack,
        0x3 => Report::TotalLength,
        0x4 => Report::TrackRange,
        0x5 => Report::TrackStart(cdd.command[4] * 10 + cdd.command[5]),
        other => {
            log::warn!("CDD: unknown TOC request {:X}", other);
            Report::AbsolutePosition
        }
    };
}

/// 0x3: seek to the MSF parameter and start reading
fn play(cdd: &mut Cdd) {
    if !cdd.drive_ready() {
        return;
    }
    let target = cdd.command_lba();
    cdd.seek_to(target, DriveState::Playing);
    cdd.report = Report::AbsolutePosition;
}

/// 0x4: seek to the MSF parameter and hold
fn seek(cdd: &mut Cdd) {
    if !cdd.drive_ready() {
        return;
    }
    let target = cdd.command_lba();
    cdd.seek_to(target, DriveState::Seeking);
    cdd.report = Report::AbsolutePosition;
}

/// 0x6
fn pause(cdd: &mut Cdd) {
    if !cdd.drive_ready() {
        return;
    }
    cdd.state = DriveState::Paused;
    cdd.report = Report::AbsolutePosition;
}

/// 0x7: continue reading from the current position
fn resume(cdd: &mut Cdd) {
    if !cdd.drive_ready() {
        return;
    }
    cdd.state = DriveState::Playing;
    cdd.report = Report::AbsolutePosition;
}

/// 0x8
fn fast_forward(cdd: &mut Cdd) {
    if !cdd.drive_ready() {
        return;
    }
    cdd.state = DriveState::FastForward;
    cdd.report = Report::AbsolutePosition;
}

/// 0x9
fn fast_rewind(cdd: &mut Cdd) {
    if !cdd.drive_ready() {
        return;
    }
    cdd.state = DriveState::FastRewind;
    cdd.report = Report::AbsolutePosition;
}

/// 0xA
fn recover(cdd: &mut Cdd) {
    if !cdd.drive_ready() {
        return;
    }
    cdd.state = DriveState::Ready;
    cdd.delay = 0;
    cdd.report = Report::AbsolutePosition;
}

/// 0xC
fn close_tray(cdd: &mut Cdd) {
    if cdd.state != DriveState::TrayOpen {
        return;
    }
    if cdd.has_disc() {
        cdd.state = DriveState::Stopped;
        cdd.report = Report::AbsolutePosition;
    } else {
        cdd.state = DriveState::NoDisc;
        cdd.report = Report::NotReady;
    }
    log::debug!("CDD: tray closed");
}

/// 0xD: the pickup keeps its position
fn open_tray(cdd: &mut Cdd) {
    cdd.state = DriveState::TrayOpen;
    cdd.delay = 0;
    cdd.report = Report::NotReady;
    log::debug!("CDD: tray opened");
}
