// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! CDC tests
//!
//! - `front_end`: index front end, reset state, status reads
//! - `transfer`: host port and DMA transfers
//! - `decode`: sector ingestion into the ring

use super::*;
use crate::core::cdc::registers::{self, read, write};


/// Write `value` to register `index` through the index/data front end
fn write_reg(cdc: &mut Cdc, index: u8, value: u8) {
    cdc.write_index(index);
    cdc.write_register(value);
}

fn read_reg(cdc: &mut Cdc, index: u8) -> u8 {
    cdc.write_index(index);
    cdc.read_register()
}

/// Arm a transfer of `count` bytes starting at ring address `dac`
fn arm(cdc: &mut Cdc, destination: Destination, dac: u16, count: u16) {
    cdc.write_mode(destination.bits());
    write_reg(cdc, write::IFCTRL, IfCtrl::DOUTEN.bits() | IfCtrl::DTEIEN.bits());
    let dbc = count - 1;
    write_reg(cdc, write::DBCL, dbc as u8);
    write_reg(cdc, write::DBCH, (dbc >> 8) as u8);
    write_reg(cdc, write::DACL, dac as u8);
    write_reg(cdc, write::DACH, (dac >> 8) as u8);
    write_reg(cdc, write::DTTRG, 0);
}
