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

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mcdrx::core::config::Config;
use mcdrx::core::gate_array::Side;
use mcdrx::core::gfx::Graphics;
use mcdrx::core::pcm::{Pcm, CHANNEL_COUNT};
use mcdrx::core::system::SegaCd;
use mcdrx::core::word_ram::{cell_byte_offset, WordRam};
use std::hint::black_box;

/// Graphics registers for a `width` x `height` operation
fn start_operation(gfx: &mut Graphics, word_ram: &mut WordRam, width: u16, height: u16) {
    // Trace table at 0x20000: scan right one pixel per dot
    for line in 0..height as u32 {
        let entry = 0x20000 + line * 8;
        word_ram.write16(Side::Main, entry, 0);
        word_ram.write16(Side::Main, entry + 2, (line as u16) << 3);
        word_ram.write16(Side::Main, entry + 4, 0x0800);
        word_ram.write16(Side::Main, entry + 6, 0);
    }
    gfx.write16(0x58, 0x0002);
    gfx.write16(0x5A, 0x0000);
    gfx.write16(0x5C, 0x001F);
    gfx.write16(0x5E, 0x6000);
    gfx.write16(0x60, 0x0000);
    gfx.write16(0x62, width);
    gfx.write16(0x64, height);
    gfx.write16(0x66, 0x8000);
    gfx.start(word_ram);
}

fn gfx_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("gfx_operation");

    for &(width, height) in &[(64u16, 64u16), (256, 224)] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &(width, height),
            |b, &(width, height)| {
                let mut gfx = Graphics::new();
                let mut word_ram = WordRam::new();
                b.iter(|| {
                    start_operation(&mut gfx, &mut word_ram, width, height);
                    black_box(gfx.run_to_completion(&mut word_ram));
                });
            },
        );
    }

    group.finish();
}

fn pcm_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("pcm_render");

    for &channels in &[1usize, CHANNEL_COUNT] {
        group.bench_with_input(BenchmarkId::new("channels", channels), &channels, |b, &channels| {
            let mut pcm = Pcm::new(44100);
            for channel in 0..channels {
                pcm.write(0x07, 0x40 | channel as u8);
                pcm.write(0x00, 0xFF);
                pcm.write(0x01, 0xFF);
                pcm.write(0x02, 0x00);
                pcm.write(0x03, 0x08);
                pcm.write(0x06, 0x00);
            }
            pcm.write(0x07, 0x80);
            pcm.write(0x08, !((1u16 << channels) - 1) as u8);

            // One 60 Hz frame of stereo output
            let mut buffer = vec![0i32; 735 * 2];
            b.iter(|| {
                buffer.fill(0);
                black_box(pcm.tick(&mut buffer, 735, true));
            });
        });
    }

    group.finish();
}

fn word_ram_benchmark(c: &mut Criterion) {
    c.bench_function("cell_byte_offset", |b| {
        b.iter(|| {
            let mut acc = 0u32;
            for offset in (0..0x20000u32).step_by(97) {
                acc ^= cell_byte_offset(black_box(offset));
            }
            black_box(acc)
        });
    });
}

fn system_tick_benchmark(c: &mut Criterion) {
    c.bench_function("system_tick", |b| {
        let mut cd = SegaCd::new(Config::default()).unwrap();
        // Timer running so the timeline fires every tick
        cd.sub_write8(0xFF8031, 0x01);
        b.iter(|| {
            cd.tick();
        });
        black_box(cd.ticks());
    });
}

criterion_group!(
    benches,
    gfx_benchmark,
    pcm_benchmark,
    word_ram_benchmark,
    system_tick_benchmark
);
criterion_main!(benches);
