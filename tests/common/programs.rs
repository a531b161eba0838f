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

//! Scripted processors standing in for the two CPU interpreters
//!
//! Each bus access costs a fixed number of cycles. The scripts are small
//! state machines so they can be suspended at any slice boundary.

use mcdrx::core::system::{CpuBus, Processor};

/// Cycles charged per bus access
#[allow(dead_code)]
pub const ACCESS_CYCLES: u64 = 8;

/// Main CPU Gate Array base
const MAIN_GATE: u32 = 0xA12000;

/// Sub CPU Gate Array base
const SUB_GATE: u32 = 0xFF8000;

/// Main CPU: release the sub CPU, post a command, wait for the reply
#[derive(Debug, Default)]
pub struct CommandSender {
    pub cycles: u64,
    pub command: u8,
    pub reply: Option<u8>,
    pub polls: u32,
    step: u8,
}

#[allow(dead_code)]
impl CommandSender {
    pub fn new(command: u8) -> Self {
        Self {
            command,
            ..Self::default()
        }
    }
}

impl Processor for CommandSender {
    fn reset(&mut self, _bus: &mut dyn CpuBus) {
        self.cycles = 0;
        self.step = 0;
    }

    fn run_until(&mut self, bus: &mut dyn CpuBus, target: u64) -> u64 {
        while self.cycles < target {
            self.cycles += ACCESS_CYCLES;
            match self.step {
                0 => {
                    bus.write8(MAIN_GATE + 0x01, 0x01);
                    self.step = 1;
                }
                1 => {
                    bus.write8(MAIN_GATE + 0x10, self.command);
                    bus.write8(MAIN_GATE + 0x0E, 0x01);
                    self.step = 2;
                }
                2 => {
                    self.polls += 1;
                    if bus.read8(MAIN_GATE + 0x0F) == 0x01 {
                        self.reply = Some(bus.read8(MAIN_GATE + 0x20));
                        self.step = 3;
                    } else if bus.yield_requested() {
                        break;
                    }
                }
                _ => self.cycles = target,
            }
        }
        self.cycles
    }
}

/// Sub CPU: wait for a command and answer with `command | 0x80`
#[derive(Debug, Default)]
pub struct CommandResponder {
    pub cycles: u64,
    pub resets: u32,
    pub answered: bool,
}

impl Processor for CommandResponder {
    fn reset(&mut self, _bus: &mut dyn CpuBus) {
        self.resets += 1;
        self.answered = false;
    }

    fn run_until(&mut self, bus: &mut dyn CpuBus, target: u64) -> u64 {
        while self.cycles < target {
            self.cycles += ACCESS_CYCLES;
            if self.answered {
                self.cycles = self.cycles.max(target);
                break;
            }
            if bus.read8(SUB_GATE + 0x0E) == 0x01 {
                let command = bus.read8(SUB_GATE + 0x10);
                bus.write8(SUB_GATE + 0x20, command | 0x80);
                bus.write8(SUB_GATE + 0x0F, 0x01);
                self.answered = true;
            }
        }
        self.cycles
    }
}

/// Main CPU that only releases the sub CPU
#[derive(Debug, Default)]
pub struct Releaser {
    pub cycles: u64,
}

impl Processor for Releaser {
    fn reset(&mut self, _bus: &mut dyn CpuBus) {}

    fn run_until(&mut self, bus: &mut dyn CpuBus, target: u64) -> u64 {
        if self.cycles == 0 {
            bus.write8(MAIN_GATE + 0x01, 0x01);
        }
        self.cycles = target;
        self.cycles
    }
}

/// Sub CPU that enables the timer interrupt and acknowledges it
#[derive(Debug)]
pub struct TimerServicer {
    pub cycles: u64,
    pub interval: u8,
    pub serviced: u32,
}

#[allow(dead_code)]
impl TimerServicer {
    pub fn new(interval: u8) -> Self {
        Self {
            cycles: 0,
            interval,
            serviced: 0,
        }
    }
}

impl Processor for TimerServicer {
    fn reset(&mut self, bus: &mut dyn CpuBus) {
        bus.write8(SUB_GATE + 0x33, 1 << 3);
        bus.write8(SUB_GATE + 0x31, self.interval);
    }

    fn run_until(&mut self, bus: &mut dyn CpuBus, target: u64) -> u64 {
        let level = bus.interrupt_level();
        if level != 0 {
            bus.acknowledge_interrupt(level);
            if level == 3 {
                self.serviced += 1;
            }
        }
        self.cycles = self.cycles.max(target);
        self.cycles
    }
}
