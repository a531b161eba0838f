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

//! Spin-poll detection on the communication registers
//!
//! The main CPU typically waits for the sub CPU by re-reading the sub flag
//! or a status word in a tight loop. When it does so and nothing new has
//! been written since its last read, the sub CPU is behind; the detector
//! then asks the scheduler to run the sub CPU up to the main CPU's clock.
//!
//! The detector never changes a value returned to either CPU.

use super::Side;
use crate::core::config::SyncConfig;

/// Number of communication bytes tracked (0x10-0x2F)
const COMM_BYTES: usize = 0x20;

/// Communication poll tracker
#[derive(Debug, Clone)]
pub struct CommSync {
    enabled: bool,
    flag_threshold: u8,
    comm_threshold: u8,

    /// Main flag written, not yet read by the sub CPU
    pub(super) main_flag_unread: bool,

    /// Sub flag written, not yet read by the main CPU
    pub(super) sub_flag_unread: bool,

    /// Consecutive stale reads of the sub flag by the main CPU
    pub(super) flag_polls: u8,

    /// Per comm byte: written by its owner, not yet read by the other side
    pub(super) comm_unread: [bool; COMM_BYTES],

    /// Per comm status byte: consecutive stale reads by the main CPU
    pub(super) comm_polls: [u8; COMM_BYTES],

    request: Option<Side>,
}

impl CommSync {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            enabled: config.extra_cpu_sync,
            flag_threshold: config.flag_poll_threshold.max(1),
            comm_threshold: config.comm_poll_threshold.max(1),
            main_flag_unread: false,
            sub_flag_unread: false,
            flag_polls: 0,
            comm_unread: [false; COMM_BYTES],
            comm_polls: [0; COMM_BYTES],
            request: None,
        }
    }

    /// Forget all marks and any pending request
    pub fn reset(&mut self) {
        self.main_flag_unread = false;
        self.sub_flag_unread = false;
        self.flag_polls = 0;
        self.comm_unread = [false; COMM_BYTES];
        self.comm_polls = [0; COMM_BYTES];
        self.request = None;
    }

    /// Whether detection is on
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    fn request_sync(&mut self, side: Side) {
        if self.enabled {
            log::trace!("Gate: spin-poll detected, sync {:?}", side);
            self.request = Some(side);
        }
    }

    /// Take the pending sync request, if any
    pub fn take_request(&mut self) -> Option<Side> {
        self.request.take()
    }

    /// Peek at the pending sync request
    pub fn pending_request(&self) -> Option<Side> {
        self.request
    }

    /// A flag byte was written by `side`
    pub fn flag_written(&mut self, side: Side) {
        match side {
            Side::Main => {
                // Overwriting a flag the sub CPU never saw
                if self.main_flag_unread {
                    self.request_sync(Side::Sub);
                }
                self.main_flag_unread = true;
            }
            Side::Sub => self.sub_flag_unread = true,
        }
    }

    /// The other side's flag byte was read by `side`
    pub fn flag_read(&mut self, side: Side) {
        match side {
            Side::Main => {
                if self.sub_flag_unread {
                    self.sub_flag_unread = false;
                    self.flag_polls = 0;
                } else {
                    self.flag_polls += 1;
                    if self.flag_polls >= self.flag_threshold {
                        self.flag_polls = 0;
                        self.request_sync(Side::Sub);
                    }
                }
            }
            Side::Sub => self.main_flag_unread = false,
        }
    }

    /// A comm byte (offset 0x10-0x2F) was written by `side`
    pub fn comm_written(&mut self, side: Side, offset: u8) {
        let index = comm_index(offset);
        if side == Side::Main && self.comm_unread[index] {
            self.request_sync(Side::Sub);
        }
        self.comm_unread[index] = true;
    }

    /// A comm byte (offset 0x10-0x2F) owned by the other side was read by `side`
    pub fn comm_read(&mut self, side: Side, offset: u8) {
        let index = comm_index(offset);
        match side {
            Side::Main => {
                if self.comm_unread[index] {
                    self.comm_unread[index] = false;
                    self.comm_polls[index] = 0;
                } else {
                    self.comm_polls[index] += 1;
                    if self.comm_polls[index] >= self.comm_threshold {
                        self.comm_polls[index] = 0;
                        self.request_sync(Side::Sub);
                    }
                }
            }
            Side::Sub => self.comm_unread[index] = false,
        }
    }
}

#[inline(always)]
fn comm_index(offset: u8) -> usize {
    debug_assert!((0x10..0x30).contains(&offset), "comm offset 0x{:02X}", offset);
    (offset as usize).wrapping_sub(0x10) & (COMM_BYTES - 1)
}
