// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Graphics co-processor tests
//!
//! - `registers`: register masks, byte merging, start conditions
//! - `render`: stamp fetch, transforms, image buffer layout, throughput

use super::*;


/// Stamp map byte address used by the scenes
const MAP_ADDRESS: u32 = 0x20000;

/// Image buffer byte address
const BUFFER_ADDRESS: u32 = 0x30000;

/// Trace vector table byte address
const TRACE_ADDRESS: u32 = 0x38000;

/// 16-dot stamps, 16x16 stamp screen, one cell tall image buffer
fn scene(h_dots: u16, v_dots: u16) -> (Graphics, WordRam) {
    let mut gfx = Graphics::new();
    gfx.write16(0x58, 0);
    gfx.write16(0x5A, (MAP_ADDRESS >> 2) as u16);
    gfx.write16(0x5C, 0);
    gfx.write16(0x5E, (BUFFER_ADDRESS >> 2) as u16);
    gfx.write16(0x60, 0);
    gfx.write16(0x62, h_dots);
    gfx.write16(0x64, v_dots);
    (gfx, WordRam::new())
}

/// Store a big-endian word without going through ownership checks
fn poke16(word_ram: &mut WordRam, address: u32, value: u16) {
    let [high, low] = value.to_be_bytes();
    word_ram.write_pixel(address * 2, high >> 4);
    word_ram.write_pixel(address * 2 + 1, high & 0x0F);
    word_ram.write_pixel(address * 2 + 2, low >> 4);
    word_ram.write_pixel(address * 2 + 3, low & 0x0F);
}

/// Trace vector for `line`: start (x, y) in dots, deltas in 5.11
fn trace(word_ram: &mut WordRam, line: u32, x: u16, y: u16, dx: i16, dy: i16) {
    let base = TRACE_ADDRESS + line * 8;
    poke16(word_ram, base, x << 3);
    poke16(word_ram, base + 2, y << 3);
    poke16(word_ram, base + 4, dx as u16);
    poke16(word_ram, base + 6, dy as u16);
}

/// Stamp map entry for stamp column/row of a 16x16 map
fn map_entry(word_ram: &mut WordRam, column: u32, row: u32, data: u16) {
    poke16(word_ram, MAP_ADDRESS + (column | (row << 4)) * 2, data);
}

/// Fill 16-dot stamp `number` with `dot(x, y)`
fn draw_stamp(word_ram: &mut WordRam, number: u16, dot: impl Fn(u32, u32) -> u8) {
    for y in 0..16 {
        for x in 0..16 {
            word_ram.write_pixel(stamp_pixel_index(number, x, y, 16), dot(x, y));
        }
    }
}

/// Dot `x` of image buffer `line` for a one-cell-tall buffer
fn buffer_dot(word_ram: &WordRam, x: u32, line: u32) -> u8 {
    let cell_column = x >> 3;
    word_ram.pixel(BUFFER_ADDRESS * 2 + cell_column * 64 + line * 8 + (x & 7))
}

/// Start the engine at the trace table and run it to completion
fn run(gfx: &mut Graphics, word_ram: &mut WordRam) -> u32 {
    gfx.write16(0x66, (TRACE_ADDRESS >> 2) as u16);
    gfx.start(word_ram);
    gfx.run_to_completion(word_ram)
}
