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

//! PCM sound generator (RF5C164)
//!
//! Eight sample-playback channels over 64 KiB of wave RAM. The sub CPU sees
//! the chip at 0xFF0000 on odd bytes: the lower half of the window holds
//! the channel registers, the upper half a 4 KiB bank of wave RAM.
//!
//! # Register Map (index = (address >> 1) & 0x1FFF)
//!
//! | Index       | Register                                   |
//! |-------------|--------------------------------------------|
//! | 0x00        | ENV                                        |
//! | 0x01        | PAN                                        |
//! | 0x02-0x03   | FD (low, high)                             |
//! | 0x04-0x05   | LS (low, high)                             |
//! | 0x06        | ST                                         |
//! | 0x07        | CTRL: bit 7 on, bit 6 MOD, bits 0-3 select |
//! | 0x08        | Channel on/off (bit set = off)             |
//! | 0x10-0x1F   | Play address readback (read only)          |
//! | 0x1000-     | Wave RAM bank window                       |

mod channel;
#[cfg(test)]
mod tests;

pub use channel::{decode_sample, Channel, ADDRESS_FRACTION_BITS, LOOP_MARKER};

use crate::core::cdc::DmaTarget;

/// Wave RAM size
pub const PCM_RAM_SIZE: usize = 0x10000;

/// Size of the wave RAM window seen by the sub CPU
pub const BANK_WINDOW_SIZE: usize = 0x1000;

/// Number of channels
pub const CHANNEL_COUNT: usize = 8;

/// Native output rate in Hz
pub const NATIVE_RATE: u32 = 32552;

/// RF5C164 PCM generator
pub struct Pcm {
    pub(super) channels: [Channel; CHANNEL_COUNT],

    /// Wave RAM
    pub(super) ram: Vec<u8>,

    /// CTRL bit 7
    pub(super) sounding: bool,

    /// Channel addressed by registers 0x00-0x06
    pub(super) selected: usize,

    /// Wave RAM bank mapped into the sub CPU window
    pub(super) bank: u8,

    /// Register 0x08 (bit set = channel off)
    pub(super) channel_off: u8,

    /// Host output rate in Hz
    output_rate: u32,
}

impl Pcm {
    /// Create a PCM generator rendering at `output_rate` Hz
    ///
    /// # Example
    ///
    /// ```
    /// use mcdrx::core::pcm::Pcm;
    ///
    /// let mut pcm = Pcm::new(44100);
    /// let mut buffer = [0i32; 64];
    ///
    /// // All channels start off: nothing is written
    /// assert!(!pcm.tick(&mut buffer, 32, true));
    /// ```
    pub fn new(output_rate: u32) -> Self {
        let mut pcm = Self {
            channels: Default::default(),
            ram: vec![0; PCM_RAM_SIZE],
            sounding: false,
            selected: 0,
            bank: 0,
            channel_off: 0xFF,
            output_rate: output_rate.max(1),
        };
        pcm.reset();
        pcm
    }

    /// Reset registers; wave RAM contents are kept
    pub fn reset(&mut self) {
        self.channels = Default::default();
        self.sounding = false;
        self.selected = 0;
        self.bank = 0;
        self.channel_off = 0xFF;
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    pub fn channel(&self, index: usize) -> &Channel {
        &self.channels[index % CHANNEL_COUNT]
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    fn bank_offset(&self, offset: usize) -> usize {
        self.bank as usize * BANK_WINDOW_SIZE + (offset & (BANK_WINDOW_SIZE - 1))
    }

    /// Sub CPU read
    ///
    /// # Arguments
    ///
    /// * `index` - `(address >> 1) & 0x1FFF`
    pub fn read(&self, index: u16) -> u8 {
        let index = index & 0x1FFF;
        if index >= 0x1000 {
            return self.ram[self.bank_offset(index as usize)];
        }
        match index & 0x1F {
            reg @ 0x10..=0x1F => {
                let channel = &self.channels[((reg - 0x10) >> 1) as usize];
                let position = channel.position();
                if reg & 1 == 0 {
                    position as u8
                } else {
                    (position >> 8) as u8
                }
            }
            _ => 0,
        }
    }

    /// Sub CPU write
    pub fn write(&mut self, index: u16, value: u8) {
        let index = index & 0x1FFF;
        if index >= 0x1000 {
            let offset = self.bank_offset(index as usize);
            self.ram[offset] = value;
            return;
        }

        let channel = &mut self.channels[self.selected];
        match index & 0x1F {
            0x00 => channel.env = value,
            0x01 => channel.pan = value,
            0x02 => channel.fd = (channel.fd & 0xFF00) | value as u16,
            0x03 => channel.fd = (channel.fd & 0x00FF) | ((value as u16) << 8),
            0x04 => channel.ls = (channel.ls & 0xFF00) | value as u16,
            0x05 => channel.ls = (channel.ls & 0x00FF) | ((value as u16) << 8),
            0x06 => channel.st = value,
            0x07 => {
                self.sounding = value & 0x80 != 0;
                if value & 0x40 != 0 {
                    self.selected = (value & 0x07) as usize;
                } else {
                    self.bank = value & 0x0F;
                }
                log::trace!(
                    "PCM: ctrl 0x{:02X} (channel {}, bank {})",
                    value,
                    self.selected,
                    self.bank
                );
            }
            0x08 => self.write_channel_off(value),
            reg => log::trace!("PCM: write to read-only register 0x{:02X}", reg),
        }
    }

    fn write_channel_off(&mut self, value: u8) {
        // Only channels switching off -> on restart from ST
        let started = self.channel_off & !value;
        for (i, channel) in self.channels.iter_mut().enumerate() {
            if started & (1 << i) != 0 {
                channel.reseed();
            }
        }
        self.channel_off = value;
    }

    /// Whether channel `index` is producing output
    pub fn is_channel_active(&self, index: usize) -> bool {
        self.sounding && self.channel_off & (1 << index) == 0
    }

    /// Address increment per output frame for `fd`
    fn step(&self, fd: u16) -> u32 {
        (fd as u64 * NATIVE_RATE as u64 / self.output_rate as u64) as u32
    }

    /// Render `frames` output frames
    ///
    /// # Arguments
    ///
    /// * `buffer` - Output; `2 * frames` interleaved samples when `stereo`,
    ///   `frames` samples otherwise
    /// * `frames` - Frames to render
    /// * `stereo` - Interleaved left/right output
    ///
    /// # Returns
    ///
    /// `true` if any channel wrote to the buffer. When `false` the buffer
    /// is untouched.
    pub fn tick(&mut self, buffer: &mut [i32], frames: usize, stereo: bool) -> bool {
        let samples = if stereo { frames * 2 } else { frames };
        let samples = samples.min(buffer.len());
        let frames = if stereo { samples / 2 } else { samples };

        let mut written = false;
        for index in 0..CHANNEL_COUNT {
            if !self.is_channel_active(index) {
                continue;
            }
            if !written {
                buffer[..samples].fill(0);
                written = true;
            }
            let step = self.step(self.channels[index].fd);
            self.channels[index].mix(&self.ram, buffer, frames, stereo, step);
        }
        written
    }
}

impl DmaTarget for Pcm {
    /// CDC DMA lands in the currently mapped bank window
    fn dma_write(&mut self, offset: u32, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            let index = self.bank_offset(offset as usize + i);
            self.ram[index] = byte;
        }
    }
}
