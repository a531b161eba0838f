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

use super::*;

#[test]
fn test_power_on_state() {
    let pcm = Pcm::new(44100);
    for i in 0..CHANNEL_COUNT {
        assert!(!pcm.is_channel_active(i));
    }
    assert_eq!(pcm.output_rate(), 44100);
}

#[test]
fn test_channel_registers() {
    let mut pcm = Pcm::new(NATIVE_RATE);
    setup_channel(&mut pcm, 3, 0x12, 0x3456);
    let channel = pcm.channel(3);
    assert_eq!(channel.env, 32);
    assert_eq!(channel.pan, 0x11);
    assert_eq!(channel.fd, 0x0800);
    assert_eq!(channel.ls, 0x3456);
    assert_eq!(channel.st, 0x12);

    // Other channels untouched
    assert_eq!(pcm.channel(0).fd, 0);
}

#[test]
fn test_bank_window() {
    let mut pcm = Pcm::new(NATIVE_RATE);
    select_bank(&mut pcm, 3);
    pcm.write(0x1005, 0xAB);
    assert_eq!(pcm.ram()[0x3005], 0xAB);
    assert_eq!(pcm.read(0x1005), 0xAB);

    select_bank(&mut pcm, 0);
    assert_eq!(pcm.read(0x1005), 0x00);
}

#[test]
fn test_register_mirror() {
    let mut pcm = Pcm::new(NATIVE_RATE);
    select_channel(&mut pcm, 0);
    pcm.write(0x0020, 0x44);
    assert_eq!(pcm.channel(0).env, 0x44);
}

#[test]
fn test_address_readback() {
    let mut pcm = Pcm::new(NATIVE_RATE);
    setup_channel(&mut pcm, 1, 0x12, 0);
    pcm.write(0x08, !0x02);
    assert_eq!(pcm.read(0x12), 0x00);
    assert_eq!(pcm.read(0x13), 0x12);
    // Channel 0 stays off and parked at 0
    assert_eq!(pcm.read(0x11), 0x00);
}

#[test]
fn test_reseed_only_on_enable() {
    let mut pcm = Pcm::new(NATIVE_RATE);
    setup_channel(&mut pcm, 0, 0x01, 0);
    pcm.write(0x08, 0xFE);
    assert_eq!(pcm.channel(0).position(), 0x100);

    let mut buffer = [0i32; 8];
    pcm.tick(&mut buffer, 4, true);
    assert_eq!(pcm.channel(0).position(), 0x104);

    // Still on: no restart
    pcm.write(0x08, 0xFE);
    assert_eq!(pcm.channel(0).position(), 0x104);

    pcm.write(0x08, 0xFF);
    pcm.write(0x08, 0xFE);
    assert_eq!(pcm.channel(0).position(), 0x100);
}

#[test]
fn test_dma_writes_bank_window() {
    let mut pcm = Pcm::new(NATIVE_RATE);
    select_bank(&mut pcm, 2);
    pcm.dma_write(0xFFE, &[1, 2, 3, 4]);
    assert_eq!(&pcm.ram()[0x2FFE..0x3000], &[1, 2]);
    assert_eq!(&pcm.ram()[0x2000..0x2002], &[3, 4]);
}

#[test]
fn test_reset_keeps_wave_ram() {
    let mut pcm = Pcm::new(NATIVE_RATE);
    load_wave(&mut pcm, 0x100, &[0x42]);
    setup_channel(&mut pcm, 0, 0, 0);
    pcm.write(0x08, 0x00);
    pcm.reset();
    assert_eq!(pcm.ram()[0x100], 0x42);
    assert!(!pcm.is_channel_active(0));
    assert_eq!(pcm.channel(0).env, 0);
}
