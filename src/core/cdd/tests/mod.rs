// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! CDD tests
//!
//! - `protocol`: checksum, dispatch, export edge, opcode table
//! - `playback`: play/seek timing, ingestion, scanning, lead-out
//! - `toc`: table of contents reports

use super::*;
use crate::core::cdrom::{DiscImage, SECTOR_SIZE};


/// Sectors in the data track of the test disc
const DATA_SECTORS: u32 = 150;

/// Sectors in the audio track of the test disc
const AUDIO_SECTORS: u32 = 75;

/// Two-track disc: data then audio, every byte 0xA5
fn test_disc() -> DiscImage {
    let sectors = (DATA_SECTORS + AUDIO_SECTORS) as usize;
    DiscImage::from_tracks(
        vec![0xA5; sectors * SECTOR_SIZE],
        &[(TrackType::Data, DATA_SECTORS), (TrackType::Audio, AUDIO_SECTORS)],
    )
    .unwrap()
}

fn drive() -> Cdd {
    let mut cdd = Cdd::new().unwrap();
    cdd.insert_disc(Box::new(test_disc()));
    cdd
}

/// Write a full command block with a valid checksum and dispatch it
fn send(cdd: &mut Cdd, opcode: u8, params: [u8; 6]) {
    let mut block = [0u8; BLOCK_LEN];
    block[0] = opcode;
    block[2..8].copy_from_slice(&params);
    block[9] = checksum(&block);
    for (i, &nibble) in block.iter().enumerate() {
        cdd.write_command(i, nibble);
    }
    cdd.execute();
}

/// BCD MSF command parameters
fn msf(minute: u8, second: u8, frame: u8) -> [u8; 6] {
    [
        minute / 10,
        minute % 10,
        second / 10,
        second % 10,
        frame / 10,
        frame % 10,
    ]
}

/// Run disc ticks until the status export fires
fn export(cdd: &mut Cdd, cdc: &mut Cdc) {
    assert!(cdd.tick(cdc), "status export expected");
}
