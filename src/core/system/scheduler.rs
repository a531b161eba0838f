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

//! Two-clock scheduler
//!
//! The main and sub processors run on independent clocks. Each scanline the
//! main side runs to its line target first, then the sub side, then the
//! expansion unit's peripherals advance by one tick.
//!
//! When the main CPU spins on a communication register the Gate Array
//! raises a sync request; the main processor yields (see
//! [`CpuBus::yield_requested`]) and the sub side is run up to the main
//! side's current time before the main side continues.

use super::bus::{CpuBus, MainBus, SubBus};
use super::SegaCd;
use crate::core::config::ClockConfig;
use crate::core::gate_array::Side;

/// Instruction-stream processor driven by the scheduler
///
/// Implemented by the instruction-set interpreters outside this crate.
pub trait Processor {
    /// Reset the processor (fetching its vectors through `bus`)
    fn reset(&mut self, bus: &mut dyn CpuBus);

    /// Run until the processor's clock reaches `target` cycles
    ///
    /// # Returns
    ///
    /// The cycle count actually reached. It may overshoot `target` by the
    /// last instruction, or fall short when the bus requested a yield.
    fn run_until(&mut self, bus: &mut dyn CpuBus, target: u64) -> u64;
}

/// Processor that executes nothing and only advances its clock
///
/// Lets the peripherals run without a CPU attached.
#[derive(Debug, Clone, Default)]
pub struct IdleProcessor {
    cycles: u64,
}

impl IdleProcessor {
    pub fn new() -> Self {
        Self { cycles: 0 }
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

impl Processor for IdleProcessor {
    fn reset(&mut self, _bus: &mut dyn CpuBus) {}

    fn run_until(&mut self, _bus: &mut dyn CpuBus, target: u64) -> u64 {
        self.cycles = self.cycles.max(target);
        self.cycles
    }
}

/// Line-granular scheduler
///
/// # Example
///
/// ```
/// use mcdrx::core::config::Config;
/// use mcdrx::core::system::{IdleProcessor, Scheduler, SegaCd};
///
/// let config = Config::default();
/// let mut cd = SegaCd::new(config.clone()).unwrap();
/// let mut scheduler = Scheduler::new(&config.clock);
/// let mut main = IdleProcessor::new();
/// let mut sub = IdleProcessor::new();
///
/// scheduler.run_frame(&mut cd, &mut main, &mut sub);
/// assert_eq!(scheduler.lines(), 262);
/// assert_eq!(main.cycles(), 262 * 487);
/// ```
#[derive(Debug, Clone)]
pub struct Scheduler {
    clock: ClockConfig,

    /// Main cycles per line
    main_per_line: u64,

    /// Sub cycles per line
    sub_per_line: u64,

    /// Main clock reached so far
    main_cycles: u64,

    /// Sub clock reached so far
    sub_cycles: u64,

    /// Lines run since creation
    lines: u64,

    /// Sync requests served
    syncs: u64,
}

impl Scheduler {
    pub fn new(clock: &ClockConfig) -> Self {
        Self {
            clock: clock.clone(),
            main_per_line: clock.main_cycles_per_line(),
            sub_per_line: clock.sub_cycles_per_line(),
            main_cycles: 0,
            sub_cycles: 0,
            lines: 0,
            syncs: 0,
        }
    }

    /// Restart both clocks at zero
    pub fn reset(&mut self) {
        self.main_cycles = 0;
        self.sub_cycles = 0;
        self.lines = 0;
        self.syncs = 0;
    }

    pub fn lines(&self) -> u64 {
        self.lines
    }

    pub fn main_cycles(&self) -> u64 {
        self.main_cycles
    }

    pub fn sub_cycles(&self) -> u64 {
        self.sub_cycles
    }

    /// Number of spin-poll syncs performed
    pub fn syncs(&self) -> u64 {
        self.syncs
    }

    /// Run one scanline on both sides, then tick the peripherals
    pub fn run_line(&mut self, cd: &mut SegaCd, main: &mut dyn Processor, sub: &mut dyn Processor) {
        let main_target = (self.lines + 1) * self.main_per_line;
        let sub_target = (self.lines + 1) * self.sub_per_line;

        while self.main_cycles < main_target {
            let before = self.main_cycles;
            self.main_cycles = main.run_until(&mut MainBus::new(cd), main_target);
            self.handle_sub_reset(cd, sub);

            if cd.gate.take_sync_request() == Some(Side::Sub) {
                let catch_up = self.clock.main_to_sub(self.main_cycles).min(sub_target);
                log::trace!(
                    "Scheduler: sync sub to {} (main at {})",
                    catch_up,
                    self.main_cycles
                );
                self.syncs += 1;
                self.run_sub(cd, sub, catch_up);
            } else if self.main_cycles == before {
                log::warn!("Scheduler: main processor made no progress at cycle {}", before);
                break;
            }
        }

        self.run_sub(cd, sub, sub_target);
        cd.tick();
        self.lines += 1;
    }

    /// Run `lines_per_frame` scanlines
    pub fn run_frame(&mut self, cd: &mut SegaCd, main: &mut dyn Processor, sub: &mut dyn Processor) {
        for _ in 0..self.clock.lines_per_frame {
            self.run_line(cd, main, sub);
        }
    }

    fn run_sub(&mut self, cd: &mut SegaCd, sub: &mut dyn Processor, target: u64) {
        if self.sub_cycles >= target {
            return;
        }
        if cd.gate.sub_running() {
            self.sub_cycles = sub.run_until(&mut SubBus::new(cd), target);
            self.handle_sub_reset(cd, sub);
        } else {
            // Held in reset or bus requested: time passes without execution
            self.sub_cycles = target;
        }
    }

    fn handle_sub_reset(&mut self, cd: &mut SegaCd, sub: &mut dyn Processor) {
        if cd.take_sub_reset() {
            log::debug!("Scheduler: resetting sub processor");
            sub.reset(&mut SubBus::new(cd));
        }
    }
}
