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

//! Core configuration
//!
//! Loaded from a TOML file; every field has a default so partial files are
//! fine. A handful of `MCDRX_*` environment variables override the file
//! (the binary loads `.env` first, so these can live there too).
//!
//! ```toml
//! [clock]
//! main_hz = 7670453
//! sub_hz = 12500000
//! lines_per_frame = 262
//! frames_per_second = 60
//!
//! [audio]
//! output_rate = 44100
//!
//! [sync]
//! extra_cpu_sync = true
//! flag_poll_threshold = 2
//! comm_poll_threshold = 4
//!
//! [cdc]
//! dma_quantum = 256
//! ```

use crate::core::error::{EmulatorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub clock: ClockConfig,
    pub audio: AudioConfig,
    pub sync: SyncConfig,
    pub cdc: CdcConfig,
}

/// Processor clocks and frame geometry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Main CPU clock (Hz)
    pub main_hz: u64,
    /// Sub CPU clock (Hz)
    pub sub_hz: u64,
    /// Scanlines per frame (one scheduler tick per line)
    pub lines_per_frame: u32,
    /// Frames per second
    pub frames_per_second: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            main_hz: 7_670_453,
            sub_hz: 12_500_000,
            lines_per_frame: 262,
            frames_per_second: 60,
        }
    }
}

impl ClockConfig {
    /// Main CPU cycles per scanline
    pub fn main_cycles_per_line(&self) -> u64 {
        self.main_hz / (self.lines_per_frame as u64 * self.frames_per_second as u64)
    }

    /// Sub CPU cycles per scanline
    pub fn sub_cycles_per_line(&self) -> u64 {
        self.sub_hz / (self.lines_per_frame as u64 * self.frames_per_second as u64)
    }

    /// Convert a main clock timestamp to the sub clock
    pub fn main_to_sub(&self, main_cycles: u64) -> u64 {
        ((main_cycles as u128 * self.sub_hz as u128) / self.main_hz as u128) as u64
    }

    fn validate(&self) -> Result<()> {
        if self.main_hz == 0 || self.sub_hz == 0 {
            return Err(EmulatorError::Config("clock rates must be non-zero".into()));
        }
        if self.lines_per_frame == 0 || self.frames_per_second == 0 {
            return Err(EmulatorError::Config(
                "lines_per_frame and frames_per_second must be non-zero".into(),
            ));
        }
        if self.sub_cycles_per_line() == 0 || self.main_cycles_per_line() == 0 {
            return Err(EmulatorError::Config("clock too slow for frame geometry".into()));
        }
        Ok(())
    }
}

/// PCM output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Host output sample rate (Hz)
    pub output_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { output_rate: 44_100 }
    }
}

/// Spin-poll detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Fast-forward the sub CPU when the main CPU spins on a comm byte
    pub extra_cpu_sync: bool,
    /// Consecutive unchanged flag reads before a sync request
    pub flag_poll_threshold: u8,
    /// Consecutive unchanged comm status reads before a sync request
    pub comm_poll_threshold: u8,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            extra_cpu_sync: true,
            flag_poll_threshold: 2,
            comm_poll_threshold: 4,
        }
    }
}

/// CD controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CdcConfig {
    /// Bytes moved per DMA tick
    pub dma_quantum: u32,
}

impl Default for CdcConfig {
    fn default() -> Self {
        Self { dma_quantum: 256 }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// I/O failure, malformed TOML, or invalid values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `MCDRX_*` environment overrides
    ///
    /// - `MCDRX_EXTRA_CPU_SYNC` (`0`/`1`/`true`/`false`)
    /// - `MCDRX_OUTPUT_RATE` (Hz)
    /// - `MCDRX_DMA_QUANTUM` (bytes)
    ///
    /// Unparsable values are ignored with a warning.
    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var("MCDRX_EXTRA_CPU_SYNC") {
            match value.trim() {
                "1" | "true" => self.sync.extra_cpu_sync = true,
                "0" | "false" => self.sync.extra_cpu_sync = false,
                other => log::warn!("Config: ignoring MCDRX_EXTRA_CPU_SYNC={}", other),
            }
        }
        if let Ok(value) = std::env::var("MCDRX_OUTPUT_RATE") {
            match value.trim().parse::<u32>() {
                Ok(rate) if rate > 0 => self.audio.output_rate = rate,
                _ => log::warn!("Config: ignoring MCDRX_OUTPUT_RATE={}", value),
            }
        }
        if let Ok(value) = std::env::var("MCDRX_DMA_QUANTUM") {
            match value.trim().parse::<u32>() {
                Ok(quantum) if quantum >= 8 => self.cdc.dma_quantum = quantum,
                _ => log::warn!("Config: ignoring MCDRX_DMA_QUANTUM={}", value),
            }
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        self.clock.validate()?;
        if self.audio.output_rate == 0 {
            return Err(EmulatorError::Config("output_rate must be non-zero".into()));
        }
        if self.cdc.dma_quantum < 8 || self.cdc.dma_quantum % 8 != 0 {
            return Err(EmulatorError::Config(
                "dma_quantum must be a non-zero multiple of 8".into(),
            ));
        }
        Ok(())
    }
}
