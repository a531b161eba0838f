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

//! System integration module
//!
//! [`SegaCd`] owns every component of the expansion unit and is the only
//! context passed around: there are no globals. Processors reach it through
//! the per-side bus views in [`bus`], and the [`Scheduler`] drives it one
//! scanline at a time.
//!
//! # Tick order
//!
//! Each [`SegaCd::tick`] (one scanline):
//! 1. commit a delayed 2M Word RAM grant
//! 2. advance the timeline by one line of sub cycles (timer, stopwatch,
//!    75 Hz disc tick)
//! 3. move one CDC DMA burst
//! 4. advance the graphics co-processor
//! 5. forward pending CDC interrupts

mod bus;
mod gate;
mod scheduler;
#[cfg(test)]
mod tests;

pub use bus::{CpuBus, MainBus, SubBus};
pub use gate::{build_gate_table, GateRegister, GateTables, MAIN_LAYOUT, MAIN_TABLE_SIZE, SUB_LAYOUT, SUB_TABLE_SIZE};
pub use scheduler::{IdleProcessor, Processor, Scheduler};

use super::cdc::{Cdc, Destination};
use super::cdd::Cdd;
use super::cdrom::DiscSource;
use super::config::Config;
use super::error::Result;
use super::gate_array::{GateArray, Side};
use super::gfx::Graphics;
use super::interrupt::{levels, InterruptController};
use super::memory::{main_map, sub_map, AddressMap, Memory, HINT_VECTOR_OFFSET};
use super::pcm::Pcm;
use super::timing::{EventHandle, TickCount, TimingEventManager};
use super::word_ram::{WordRam, WordRamMode};
use std::path::Path;

/// Timer / stopwatch period in sub cycles for a sub clock in Hz (30.72 µs)
pub fn timer_interval(sub_hz: u64) -> TickCount {
    ((sub_hz * 3072) / 100_000_000).max(1) as TickCount
}

/// Disc tick period in sub cycles for a sub clock in Hz (75 Hz)
pub fn disc_interval(sub_hz: u64) -> TickCount {
    (sub_hz / 75).max(1) as TickCount
}

/// Address maps for one Word RAM mode
#[derive(Debug, Clone)]
struct MapSet {
    main: AddressMap,
    sub: AddressMap,
}

impl MapSet {
    fn build(mode: WordRamMode) -> Result<Self> {
        Ok(Self {
            main: main_map(mode)?,
            sub: sub_map(mode)?,
        })
    }
}

/// Sega CD / Mega-CD expansion unit
///
/// # Example
///
/// ```
/// use mcdrx::core::config::Config;
/// use mcdrx::core::system::SegaCd;
///
/// let mut cd = SegaCd::new(Config::default()).unwrap();
///
/// // Main CPU posts a command, sub CPU reads it back
/// cd.main_write8(0xA12010, 0x42);
/// assert_eq!(cd.sub_read8(0xFF8010), 0x42);
///
/// cd.tick();
/// assert_eq!(cd.ticks(), 1);
/// ```
pub struct SegaCd {
    pub(super) config: Config,
    pub(super) memory: Memory,
    pub(super) gate: GateArray,
    pub(super) word_ram: WordRam,
    pub(super) interrupts: InterruptController,
    pub(super) cdc: Cdc,
    pub(super) cdd: Cdd,
    pub(super) pcm: Pcm,
    pub(super) gfx: Graphics,

    /// Slow clocks in sub cycles
    pub(super) timeline: TimingEventManager,
    timer_event: EventHandle,
    disc_event: EventHandle,
    line_cycles: TickCount,

    gate_tables: GateTables,
    layouts: [MapSet; 2],
    installed_mode: WordRamMode,
    main_map: AddressMap,
    sub_map: AddressMap,

    /// Low byte of the last host data pop, per side (byte reads at 0x09)
    pub(super) host_latch: [u8; 2],

    /// Main CPU released the sub CPU reset; the scheduler resets it
    pub(super) sub_reset_pending: bool,

    /// Ticks since reset
    pub(super) ticks: u64,
}

impl SegaCd {
    /// Create the expansion unit in its power-on state
    ///
    /// # Errors
    ///
    /// Invalid configuration, or a malformed handler / address table.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let layouts = [
            MapSet::build(WordRamMode::TwoMeg)?,
            MapSet::build(WordRamMode::OneMeg)?,
        ];
        let mut timeline = TimingEventManager::new();
        let timer_event =
            timeline.register_periodic_event("Timer", timer_interval(config.clock.sub_hz));
        let disc_event = timeline.register_periodic_event("Disc", disc_interval(config.clock.sub_hz));

        let mut cd = Self {
            memory: Memory::new(),
            gate: GateArray::new(&config.sync),
            word_ram: WordRam::new(),
            interrupts: InterruptController::new(),
            cdc: Cdc::new(),
            cdd: Cdd::new()?,
            pcm: Pcm::new(config.audio.output_rate),
            gfx: Graphics::new(),
            timeline,
            timer_event,
            disc_event,
            line_cycles: config.clock.sub_cycles_per_line() as TickCount,
            gate_tables: GateTables::new()?,
            main_map: layouts[0].main.clone(),
            sub_map: layouts[0].sub.clone(),
            layouts,
            installed_mode: WordRamMode::TwoMeg,
            host_latch: [0; 2],
            sub_reset_pending: false,
            ticks: 0,
            config,
        };
        cd.reset();

        log::info!(
            "System: initialized ({} main / {} sub cycles per line)",
            cd.config.clock.main_cycles_per_line(),
            cd.line_cycles
        );
        Ok(cd)
    }

    /// Reset to power-on values
    ///
    /// Aborts any CDC transfer, CDD command and graphics operation. The boot
    /// ROM, backup RAM, Word RAM contents and the inserted disc survive.
    pub fn reset(&mut self) {
        self.memory.reset();
        self.gate.reset();
        self.word_ram.reset();
        self.interrupts.clear();
        self.interrupts.write_mask(0);
        self.cdc.reset();
        self.cdd.reset();
        self.pcm.reset();
        self.gfx.reset();

        self.timeline.reset();
        self.timeline
            .schedule(self.timer_event, timer_interval(self.config.clock.sub_hz));
        self.timeline
            .schedule(self.disc_event, disc_interval(self.config.clock.sub_hz));

        self.remap_word_ram();
        self.load_hint_vector();
        self.host_latch = [0; 2];
        self.sub_reset_pending = false;
        self.ticks = 0;
        log::debug!("System: reset");
    }

    /// Load the boot ROM from a file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mcdrx::core::config::Config;
    /// use mcdrx::core::system::SegaCd;
    ///
    /// let mut cd = SegaCd::new(Config::default()).unwrap();
    /// cd.load_boot_rom("us_scd1_9210.bin").unwrap();
    /// ```
    pub fn load_boot_rom<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.memory.load_boot_rom(path)?;
        self.load_hint_vector();
        Ok(())
    }

    /// Load the boot ROM from memory
    pub fn load_boot_rom_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.memory.load_boot_rom_bytes(data)?;
        self.load_hint_vector();
        Ok(())
    }

    /// Seed the HINT vector register from the boot ROM bytes it overlays
    fn load_hint_vector(&mut self) {
        self.gate
            .write_hint_vector(true, self.memory.boot_rom_byte(HINT_VECTOR_OFFSET));
        self.gate
            .write_hint_vector(false, self.memory.boot_rom_byte(HINT_VECTOR_OFFSET + 1));
    }

    // ------------------------------------------------------------------
    // Disc
    // ------------------------------------------------------------------

    pub fn insert_disc(&mut self, disc: Box<dyn DiscSource>) {
        self.cdd.insert_disc(disc);
    }

    /// Remove the disc, returning it to the caller
    pub fn eject_disc(&mut self) -> Option<Box<dyn DiscSource>> {
        self.cdd.eject_disc()
    }

    pub fn has_disc(&self) -> bool {
        self.cdd.has_disc()
    }

    // ------------------------------------------------------------------
    // Scheduling
    // ------------------------------------------------------------------

    /// Advance the peripherals by one scanline
    pub fn tick(&mut self) {
        if self.word_ram.commit_delayed_dmna() {
            self.remap_word_ram();
        }

        for event in self.timeline.advance(self.line_cycles) {
            if event == self.timer_event {
                if self.gate.tick_timer() {
                    self.interrupts.request(levels::TIMER);
                }
                self.gate.tick_stopwatch();
            } else if event == self.disc_event && self.cdd.tick(&mut self.cdc) {
                self.export_cdd_status();
            }
        }

        self.run_cdc_dma();

        if self.gfx.update(&mut self.word_ram) {
            self.interrupts.request(levels::GRAPHICS);
        }
        self.poll_cdc_irq();
        self.ticks += 1;
    }

    fn run_cdc_dma(&mut self) {
        let quantum = self.config.cdc.dma_quantum;
        match self.cdc.destination() {
            Destination::PcmRam => self.cdc.dma_tick(&mut self.pcm, quantum),
            Destination::PrgRam => self.cdc.dma_tick(self.memory.prg_ram_mut(), quantum),
            Destination::WordRam => self.cdc.dma_tick(&mut self.word_ram, quantum),
            _ => 0,
        };
    }

    /// Install the Word RAM regions for the current mode
    pub(crate) fn remap_word_ram(&mut self) {
        let mode = self.word_ram.mode();
        if mode == self.installed_mode {
            return;
        }
        let layout = &self.layouts[match mode {
            WordRamMode::TwoMeg => 0,
            WordRamMode::OneMeg => 1,
        }];
        self.main_map = layout.main.clone();
        self.sub_map = layout.sub.clone();
        self.installed_mode = mode;
        log::debug!("System: Word RAM regions installed for {:?}", mode);
    }

    /// Consume a pending sub CPU reset
    pub fn take_sub_reset(&mut self) -> bool {
        std::mem::take(&mut self.sub_reset_pending)
    }

    /// Whether the sub CPU executes (not held in reset, bus not requested)
    pub fn sub_running(&self) -> bool {
        self.gate.sub_running()
    }

    /// Render PCM output into `buffer`
    ///
    /// See [`Pcm::tick`].
    pub fn render_audio(&mut self, buffer: &mut [i32], frames: usize, stereo: bool) -> bool {
        self.pcm.tick(buffer, frames, stereo)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn gate(&self) -> &GateArray {
        &self.gate
    }

    pub fn word_ram(&self) -> &WordRam {
        &self.word_ram
    }

    pub fn interrupts(&self) -> &InterruptController {
        &self.interrupts
    }

    pub fn cdc(&self) -> &Cdc {
        &self.cdc
    }

    pub fn cdd(&self) -> &Cdd {
        &self.cdd
    }

    pub fn pcm(&self) -> &Pcm {
        &self.pcm
    }

    pub fn gfx(&self) -> &Graphics {
        &self.gfx
    }

    /// Address map currently installed for `side`
    pub fn address_map(&self, side: Side) -> &AddressMap {
        match side {
            Side::Main => &self.main_map,
            Side::Sub => &self.sub_map,
        }
    }
}
