// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! PCM tests
//!
//! - `registers`: register file, bank window, address readback
//! - `playback`: mixing, loop markers, rate scaling

use super::*;

mod registers;

/// CTRL: sounding on, select channel
fn select_channel(pcm: &mut Pcm, channel: u8) {
    pcm.write(0x07, 0xC0 | channel);
}

/// CTRL: sounding on, map wave bank
fn select_bank(pcm: &mut Pcm, bank: u8) {
    pcm.write(0x07, 0x80 | bank);
}

/// Copy `bytes` into wave RAM at `address` through the bank window
fn load_wave(pcm: &mut Pcm, address: u16, bytes: &[u8]) {
    for (i, &byte) in bytes.iter().enumerate() {
        let address = address as usize + i;
        select_bank(pcm, (address >> 12) as u8);
        pcm.write(0x1000 | (address & 0xFFF) as u16, byte);
    }
}

/// Program a channel: unit gain on both sides, one sample per frame at the
/// native rate
fn setup_channel(pcm: &mut Pcm, channel: u8, start: u8, loop_address: u16) {
    select_channel(pcm, channel);
    pcm.write(0x00, 32);
    pcm.write(0x01, 0x11);
    pcm.write(0x02, 0x00);
    pcm.write(0x03, 0x08);
    pcm.write(0x04, loop_address as u8);
    pcm.write(0x05, (loop_address >> 8) as u8);
    pcm.write(0x06, start);
}
