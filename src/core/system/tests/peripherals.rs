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
use crate::core::cdd::{checksum, BLOCK_LEN};

/// Program the CDC through the index and data ports
fn write_cdc_registers(cd: &mut SegaCd, first: u8, values: &[u8]) {
    cd.sub_write8(SUB_GATE + 0x05, first);
    for &value in values {
        cd.sub_write8(SUB_GATE + 0x07, value);
    }
}

/// Arm a transfer of `len` bytes from ring offset 0
fn arm_transfer(cd: &mut SegaCd, destination: Destination, len: u16) {
    cd.sub_write8(SUB_GATE + 0x04, destination.bits());
    let dbc = len - 1;
    // IFCTRL (DTEIEN | DOUTEN), DBC, DAC, DTTRG
    write_cdc_registers(cd, 0x01, &[0x42, dbc as u8, (dbc >> 8) as u8, 0, 0, 0]);
}

/// Write a CDD command block through the Gate Array
fn send_cdd_command(cd: &mut SegaCd, opcode: u8, params: [u8; 6]) {
    let mut block = [0u8; BLOCK_LEN];
    block[0] = opcode;
    block[2..8].copy_from_slice(&params);
    block[BLOCK_LEN - 1] = checksum(&block);
    for (i, &nibble) in block.iter().enumerate() {
        cd.sub_write8(SUB_GATE + 0x42 + i as u32, nibble);
    }
}

fn drs(cd: &mut SegaCd) -> bool {
    cd.sub_read8(SUB_GATE + 0x37) & fields::DRS.bits() != 0
}

#[test]
fn test_cdc_host_transfer_to_main() {
    let mut cd = system();
    cd.cdc.ring[..4].copy_from_slice(&[1, 2, 3, 4]);
    enable_levels(&mut cd, &[levels::CDC]);
    arm_transfer(&mut cd, Destination::MainHost, 4);
    assert!(cd.cdc().is_busy());
    assert!(cd.cdc().data_ready());

    // Byte reads: the high byte pops a word, the low byte is latched
    assert_eq!(cd.main_read8(MAIN_GATE + 0x08), 0x01);
    assert_eq!(cd.main_read8(MAIN_GATE + 0x09), 0x02);

    // Wrong side: no data, no effect
    assert_eq!(cd.sub_read16(SUB_GATE + 0x08), 0);
    assert_eq!(cd.cdc().remaining(), 2);

    assert_eq!(cd.main_read16(MAIN_GATE + 0x08), 0x0304);
    assert!(!cd.cdc().is_busy());
    assert!(cd.cdc().transfer_complete());
    assert_eq!(cd.interrupts().highest_pending(), levels::CDC);

    // EDT set, DSR clear, destination kept
    assert_eq!(cd.main_read8(MAIN_GATE + 0x04), 0x82);
}

#[test]
fn test_reset_during_armed_transfer() {
    let mut cd = system();
    enable_levels(&mut cd, &[levels::CDC]);
    arm_transfer(&mut cd, Destination::PrgRam, 64);
    assert!(cd.cdc().is_busy());

    cd.reset();
    assert!(!cd.cdc().is_busy());
    assert!(cd.cdc().transfer_complete());
    assert_eq!(cd.interrupts().pending_bits(), 0);

    // Nothing left for the DMA engine
    cd.tick();
    assert!(cd.memory().prg_ram()[..64].iter().all(|&b| b == 0));
    assert!(!cd.interrupts().is_pending(levels::CDC));
}

#[test]
fn test_cdc_mode_is_read_only_for_main() {
    let mut cd = system();
    cd.sub_write8(SUB_GATE + 0x04, 0x03);
    cd.main_write8(MAIN_GATE + 0x04, 0x02);
    assert_eq!(cd.cdc().destination(), Destination::SubHost);
}

#[test]
fn test_cdc_dma_to_prg_ram() {
    let mut cd = system();
    for (i, byte) in cd.cdc.ring[..16].iter_mut().enumerate() {
        *byte = i as u8 + 1;
    }
    enable_levels(&mut cd, &[levels::CDC]);

    // DMA address counts 8-byte units
    cd.sub_write16(SUB_GATE + 0x0A, 0x0010);
    assert_eq!(cd.sub_read16(SUB_GATE + 0x0A), 0x0010);
    arm_transfer(&mut cd, Destination::PrgRam, 16);

    cd.tick();
    let expected: Vec<u8> = (1..=16).collect();
    assert_eq!(&cd.memory().prg_ram()[0x80..0x90], expected.as_slice());
    assert!(cd.cdc().transfer_complete());
    assert_eq!(cd.interrupts().highest_pending(), levels::CDC);
}

#[test]
fn test_cdd_host_clock_exports_status() {
    let mut cd = system();
    assert!(!drs(&mut cd));

    cd.sub_write8(SUB_GATE + 0x37, 0x04);
    assert!(drs(&mut cd));
    // No interrupt while level 4 is masked
    assert_eq!(cd.interrupts().highest_pending(), 0);

    // Reading the checksum nibble acknowledges the block
    cd.sub_read8(SUB_GATE + 0x41);
    assert!(!drs(&mut cd));
    assert_eq!(cd.sub_read8(SUB_GATE + 0x37), 0x04);
}

#[test]
fn test_unmasking_cdd_with_host_clock_raises_level_4() {
    let mut cd = system();
    cd.sub_write8(SUB_GATE + 0x37, 0x04);
    assert!(!cd.interrupts().is_pending(levels::CDD));

    enable_levels(&mut cd, &[levels::CDD]);
    assert_eq!(cd.interrupts().highest_pending(), levels::CDD);
}

#[test]
fn test_cdd_play_reports_through_gate() {
    let mut cd = system();
    cd.insert_disc(test_disc());
    cd.sub_write8(SUB_GATE + 0x37, 0x04);
    cd.sub_read8(SUB_GATE + 0x41);

    // Play from 00:02:00 (LBA 0, data track)
    send_cdd_command(&mut cd, 0x3, [0, 0, 0, 2, 0, 0]);
    assert_eq!(cd.sub_read8(SUB_GATE + 0x42), 0x3);

    let mut ticks = 0;
    while !drs(&mut cd) {
        cd.tick();
        ticks += 1;
        assert!(ticks < 400, "status block never exported");
    }

    assert_eq!(cd.sub_read8(SUB_GATE + 0x38), 0x1);
    assert_eq!(cd.sub_read8(SUB_GATE + 0x36), 1);
    let status: Vec<u8> = (0x38..0x42).map(|offset| cd.sub_read8(SUB_GATE + offset)).collect();
    assert_eq!(status[BLOCK_LEN - 1], checksum(&status));
}

#[test]
fn test_timer_interrupt_and_stopwatch() {
    let mut cd = system();
    enable_levels(&mut cd, &[levels::TIMER]);
    cd.sub_write8(SUB_GATE + 0x31, 0x01);

    cd.tick();
    assert_eq!(cd.interrupts().highest_pending(), levels::TIMER);
    assert_eq!(cd.sub_read16(SUB_GATE + 0x0C), 2);

    cd.sub_write8(SUB_GATE + 0x0C, 0x00);
    assert_eq!(cd.sub_read16(SUB_GATE + 0x0C), 0);
    assert_eq!(cd.main_read16(MAIN_GATE + 0x0C), 0);
}

#[test]
fn test_timer_disabled_at_zero() {
    let mut cd = system();
    enable_levels(&mut cd, &[levels::TIMER]);
    for _ in 0..10 {
        cd.tick();
    }
    assert!(!cd.interrupts().is_pending(levels::TIMER));
}

#[test]
fn test_graphics_operation_raises_level_1() {
    let mut cd = system();
    enable_levels(&mut cd, &[levels::GRAPHICS]);

    cd.sub_write16(SUB_GATE + 0x62, 8);
    cd.sub_write16(SUB_GATE + 0x64, 1);
    cd.sub_write16(SUB_GATE + 0x66, 0);
    assert!(cd.gfx().busy());
    assert_ne!(cd.sub_read16(SUB_GATE + 0x58) & crate::core::gfx::GRON, 0);

    cd.tick();
    assert!(!cd.gfx().busy());
    assert_eq!(cd.interrupts().highest_pending(), levels::GRAPHICS);
}

#[test]
fn test_graphics_start_ignored_in_one_meg() {
    let mut cd = system();
    cd.sub_write8(SUB_GATE + 3, 0x04);
    cd.sub_write16(SUB_GATE + 0x66, 0);
    assert!(!cd.gfx().busy());
}
