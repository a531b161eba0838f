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

//! PCM channel playback
//!
//! Each channel walks wave RAM with a 21.11 fixed-point address. Samples
//! are 8-bit sign-magnitude; 0xFF marks a loop point.

/// Fractional bits of the play address
pub const ADDRESS_FRACTION_BITS: u32 = 11;

/// Loop marker byte
pub const LOOP_MARKER: u8 = 0xFF;

/// Decode an 8-bit sign-magnitude sample (bit 7 set = negative)
///
/// # Example
///
/// ```
/// use mcdrx::core::pcm::decode_sample;
///
/// assert_eq!(decode_sample(0x05), 5);
/// assert_eq!(decode_sample(0x85), -5);
/// ```
#[inline(always)]
pub fn decode_sample(byte: u8) -> i32 {
    let magnitude = (byte & 0x7F) as i32;
    if byte & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// One of the eight PCM channels
#[derive(Debug, Clone, Default)]
pub struct Channel {
    /// Envelope (volume)
    pub(crate) env: u8,

    /// Pan: low nibble left, high nibble right
    pub(crate) pan: u8,

    /// Frequency delta (address increment per output sample at 32552 Hz)
    pub(crate) fd: u16,

    /// Loop address (integer sample index)
    pub(crate) ls: u16,

    /// Start address, high byte of the integer sample index
    pub(crate) st: u8,

    /// Play address, 21.11 fixed point
    pub(crate) addr: u32,
}

impl Channel {
    /// Integer sample index of the play address
    #[inline(always)]
    pub fn position(&self) -> u16 {
        (self.addr >> ADDRESS_FRACTION_BITS) as u16
    }

    /// Restart from the start address
    pub fn reseed(&mut self) {
        self.addr = (self.st as u32) << (8 + ADDRESS_FRACTION_BITS);
    }

    /// Left and right multipliers
    fn gains(&self) -> (i32, i32) {
        let env = self.env as i32;
        (
            (env * (self.pan & 0x0F) as i32) >> 5,
            (env * (self.pan >> 4) as i32) >> 5,
        )
    }

    /// Mix this channel into `buffer`
    ///
    /// # Arguments
    ///
    /// * `ram` - 64 KiB wave RAM
    /// * `buffer` - Output, interleaved L/R when `stereo`, L+R otherwise
    /// * `frames` - Output frames to render
    /// * `step` - Address increment per output frame
    pub(super) fn mix(
        &mut self,
        ram: &[u8],
        buffer: &mut [i32],
        frames: usize,
        stereo: bool,
        step: u32,
    ) {
        let (left, right) = self.gains();

        for frame in 0..frames {
            let mut byte = ram[self.position() as usize];
            if byte == LOOP_MARKER {
                self.addr = (self.ls as u32) << ADDRESS_FRACTION_BITS;
                byte = ram[self.ls as usize];
                if byte == LOOP_MARKER {
                    // Loop points at another marker: silent for the rest of this call
                    return;
                }
            }

            let sample = decode_sample(byte);
            if stereo {
                buffer[frame * 2] += sample * left;
                buffer[frame * 2 + 1] += sample * right;
            } else {
                buffer[frame] += sample * (left + right);
            }

            self.addr = self.addr.wrapping_add(step) & ((1 << (16 + ADDRESS_FRACTION_BITS)) - 1);
        }
    }
}
