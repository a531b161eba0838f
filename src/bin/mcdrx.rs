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

use clap::Parser;
use log::{error, info};
use mcdrx::core::cdrom::{DiscImage, DiscSource};
use mcdrx::core::config::Config;
use mcdrx::core::save_state::SaveState;
use mcdrx::core::system::{IdleProcessor, Scheduler, SegaCd};
use std::path::PathBuf;

/// Mega-CD / Sega CD expansion unit runner
#[derive(Parser)]
#[command(name = "mcdrx")]
#[command(about = "Mega-CD expansion unit core runner", long_about = None)]
struct Args {
    /// Path to the expansion unit boot ROM
    boot_rom: Option<PathBuf>,

    /// Raw 2352-byte sector disc image (.bin)
    #[arg(short = 'd', long)]
    disc: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Number of frames to run
    #[arg(short = 'n', long, default_value = "60")]
    frames: u32,

    /// Print the disc's table of contents as JSON and exit
    #[arg(long)]
    dump_toc: bool,

    /// Write a save state after the run
    #[arg(short = 's', long)]
    save_state: Option<PathBuf>,

    /// Apply a save state before the run
    #[arg(short = 'l', long)]
    load_state: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional .env for MCDRX_* overrides and RUST_LOG
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let disc = match &args.disc {
        Some(path) => {
            info!("Loading disc from: {}", path.display());
            let disc = DiscImage::from_bin(path).map_err(|e| {
                error!("Failed to load disc: {}", e);
                e
            })?;
            Some(disc)
        }
        None => None,
    };

    if args.dump_toc {
        let Some(disc) = &disc else {
            return Err("--dump-toc requires --disc".into());
        };
        println!("{}", serde_json::to_string_pretty(disc.toc())?);
        return Ok(());
    }

    info!("mcdrx v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Config::load(path)?
        }
        None => Config::default(),
    };
    config.apply_env();

    let mut cd = SegaCd::new(config.clone())?;

    if let Some(path) = &args.boot_rom {
        info!("Loading boot ROM from: {}", path.display());
        if let Err(e) = cd.load_boot_rom(path) {
            error!("Failed to load boot ROM: {}", e);
            return Err(Box::new(e));
        }
    }

    if let Some(disc) = disc {
        cd.insert_disc(Box::new(disc));
    }

    if let Some(path) = &args.load_state {
        SaveState::load_from_file(path)?.apply(&mut cd);
    }

    let mut scheduler = Scheduler::new(&config.clock);
    let mut main = IdleProcessor::new();
    let mut sub = IdleProcessor::new();

    let frames_per_second = config.clock.frames_per_second.max(1);
    let samples_per_frame = (config.audio.output_rate / frames_per_second) as usize;
    let mut audio = vec![0i32; samples_per_frame * 2];
    let mut audible_frames = 0u32;

    info!("Running {} frames...", args.frames);
    for frame in 0..args.frames {
        scheduler.run_frame(&mut cd, &mut main, &mut sub);
        if cd.render_audio(&mut audio, samples_per_frame, true) {
            audible_frames += 1;
        }
        if frame > 0 && frame % frames_per_second == 0 {
            info!(
                "Progress: {}/{} frames | ticks: {} | drive: {:?}",
                frame,
                args.frames,
                cd.ticks(),
                cd.cdd().state()
            );
        }
    }

    info!("Run complete");
    info!("Scheduler lines: {}", scheduler.lines());
    info!("Spin-poll syncs: {}", scheduler.syncs());
    info!("Sectors decoded: {}", cd.cdc().sectors_decoded());
    info!("Drive state: {:?} at LBA {}", cd.cdd().state(), cd.cdd().lba());
    info!("Pending interrupts: 0x{:02X}", cd.interrupts().pending_bits());
    info!("Frames with PCM output: {}", audible_frames);

    if let Some(path) = &args.save_state {
        let mut state = SaveState::capture(&cd);
        state.metadata.label = format!("{} frames", args.frames);
        state.save_to_file(path)?;
    }

    Ok(())
}
