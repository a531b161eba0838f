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

//! Save state serialization
//!
//! A save state is one opaque block holding the entire mutable state of the
//! expansion unit, encoded with bincode in a fixed field order:
//!
//! - Metadata (timestamp, tick count, disc presence)
//! - Gate Array register file, reset latch, timer and stopwatch
//! - Word RAM contents and handshake bits
//! - PRG RAM, backup RAM and RAM cart
//! - CDC registers and decode ring
//! - CDD drive state and command/status blocks
//! - PCM channels and wave RAM
//! - Graphics registers and engine position
//! - Interrupt pending/mask bits and the timeline
//!
//! The boot ROM and the disc are not saved; they are external inputs that
//! must be loaded again before a state is applied.
//!
//! # Version Compatibility
//!
//! Save states include a version number. Loading a state written with a
//! different version fails with `EmulatorError::IncompatibleSaveState`.
//!
//! # Example
//!
//! ```no_run
//! use mcdrx::core::config::Config;
//! use mcdrx::core::save_state::SaveState;
//! use mcdrx::core::system::SegaCd;
//!
//! let mut cd = SegaCd::new(Config::default()).unwrap();
//! // ... run emulation ...
//!
//! SaveState::capture(&cd).save_to_file("slot1.state").unwrap();
//!
//! // Later
//! let state = SaveState::load_from_file("slot1.state").unwrap();
//! state.apply(&mut cd);
//! ```

use crate::core::cdc::Cdc;
use crate::core::cdc::registers::{Ctrl0, IfCtrl, IfStat};
use crate::core::cdd::{Cdd, DriveState, Report, BLOCK_LEN};
use crate::core::error::{EmulatorError, Result};
use crate::core::gate_array::{GateArray, GATE_REGISTER_COUNT};
use crate::core::gfx::{Graphics, GFX_REGISTER_COUNT};
use crate::core::memory::Memory;
use crate::core::pcm::{Channel, Pcm, CHANNEL_COUNT};
use crate::core::system::SegaCd;
use crate::core::word_ram::WordRam;
use bincode::{config, Decode, Encode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Save state version for compatibility checking
///
/// Incremented whenever the layout below changes.
pub const SAVE_STATE_VERSION: u32 = 1;

/// Complete expansion unit save state
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct SaveState {
    /// Version number for compatibility checking
    pub version: u32,

    pub metadata: SaveStateMetadata,
    pub gate: GateState,
    pub word_ram: WordRamState,
    pub memory: MemoryState,
    pub cdc: CdcState,
    pub cdd: CddState,
    pub pcm: PcmState,
    pub gfx: GfxState,
    pub system: SystemState,
}

/// Save state metadata
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
#[bincode(encode_bounds = "", decode_bounds = "")]
pub struct SaveStateMetadata {
    /// Timestamp when the state was captured
    #[bincode(with_serde)]
    pub timestamp: DateTime<Utc>,

    /// Scheduler ticks since reset
    pub ticks: u64,

    /// Whether a disc was inserted when the state was captured
    pub disc_inserted: bool,

    /// Free-form label
    pub label: String,
}

/// Gate Array register file
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct GateState {
    pub regs: Vec<u8>,
    pub busreq: u8,
    pub reset_pending: bool,
    pub hint_vector: u16,
    pub timer_counter: u8,
    pub stopwatch: u16,
}

/// Word RAM contents and memory mode bits
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct WordRamState {
    pub ram: Vec<u8>,
    pub mode_bits: u8,
    pub delayed_dmna: bool,
}

/// PRG RAM, backup RAM and RAM cart
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct MemoryState {
    pub prg_ram: Vec<u8>,
    pub backup_ram: Vec<u8>,
    pub cart_ram: Vec<u8>,
    pub cart_write_enable: bool,
}

/// CD controller registers and decode ring
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct CdcState {
    pub mode: u8,
    pub index: u8,
    pub dma_address: u16,
    pub ifstat: u8,
    pub ifctrl: u8,
    pub ctrl0: u8,
    pub ctrl1: u8,
    pub sbout: u8,
    pub dbc: i32,
    pub dac: u16,
    pub wa: u16,
    pub pt: u16,
    pub header: [u8; 4],
    pub stat: [u8; 4],
    pub ring: Vec<u8>,
    pub irq_pending: bool,
    pub sectors_decoded: u64,
}

/// CD drive state
///
/// The disc itself is not part of the state.
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct CddState {
    #[bincode(with_serde)]
    pub state: DriveState,
    pub lba: i32,
    pub track: u8,
    pub delay: u32,
    #[bincode(with_serde)]
    pub report: Report,
    pub complete: bool,
    pub command: [u8; BLOCK_LEN],
    pub status: [u8; BLOCK_LEN],
    pub data_mode: bool,
    pub fader: u16,
}

/// One PCM channel
#[derive(Debug, Clone, Default, Serialize, Deserialize, Encode, Decode)]
pub struct ChannelState {
    pub env: u8,
    pub pan: u8,
    pub fd: u16,
    pub ls: u16,
    pub st: u8,
    pub addr: u32,
}

/// PCM sound generator
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct PcmState {
    pub channels: Vec<ChannelState>,
    pub ram: Vec<u8>,
    pub sounding: bool,
    pub selected: u8,
    pub bank: u8,
    pub channel_off: u8,
}

/// Graphics co-processor
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct GfxState {
    pub regs: [u16; GFX_REGISTER_COUNT],
    pub trace_address: u32,
    pub buffer_start: u32,
    pub accumulator: u32,
}

/// Interrupts, timeline and glue state owned by the system context
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct SystemState {
    pub interrupt_pending: u8,
    pub interrupt_mask: u8,
    pub timeline_now: u64,
    pub timeline_events: Vec<(bool, u64)>,
    pub host_latch: [u8; 2],
    pub sub_reset_pending: bool,
    pub ticks: u64,
}

/// Copy `src` into `dst`, zero filling when the saved block is short
fn restore_bytes(dst: &mut [u8], src: &[u8]) {
    let len = dst.len().min(src.len());
    dst[..len].copy_from_slice(&src[..len]);
    dst[len..].fill(0);
}

impl SaveState {
    /// Capture the complete state of `cd`
    pub fn capture(cd: &SegaCd) -> Self {
        let (timeline_now, timeline_events) = cd.timeline.snapshot();
        Self {
            version: SAVE_STATE_VERSION,
            metadata: SaveStateMetadata {
                timestamp: Utc::now(),
                ticks: cd.ticks,
                disc_inserted: cd.cdd.has_disc(),
                label: String::new(),
            },
            gate: cd.gate.to_state(),
            word_ram: cd.word_ram.to_state(),
            memory: cd.memory.to_state(),
            cdc: cd.cdc.to_state(),
            cdd: cd.cdd.to_state(),
            pcm: cd.pcm.to_state(),
            gfx: cd.gfx.to_state(),
            system: SystemState {
                interrupt_pending: cd.interrupts.pending_bits(),
                interrupt_mask: cd.interrupts.read_mask(),
                timeline_now,
                timeline_events,
                host_latch: cd.host_latch,
                sub_reset_pending: cd.sub_reset_pending,
                ticks: cd.ticks,
            },
        }
    }

    /// Replace the state of `cd` with this save state
    ///
    /// The boot ROM and the inserted disc are left as they are.
    pub fn apply(&self, cd: &mut SegaCd) {
        cd.gate.restore_from_state(&self.gate);
        cd.word_ram.restore_from_state(&self.word_ram);
        cd.memory.restore_from_state(&self.memory);
        cd.cdc.restore_from_state(&self.cdc);
        cd.cdd.restore_from_state(&self.cdd);
        cd.pcm.restore_from_state(&self.pcm);
        cd.gfx.restore_from_state(&self.gfx);

        let system = &self.system;
        cd.interrupts
            .restore(system.interrupt_pending, system.interrupt_mask);
        cd.timeline
            .restore(system.timeline_now, &system.timeline_events);
        cd.host_latch = system.host_latch;
        cd.sub_reset_pending = system.sub_reset_pending;
        cd.ticks = system.ticks;
        cd.remap_word_ram();

        log::info!(
            "Save state applied (captured {} at tick {})",
            self.metadata.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.metadata.ticks
        );
    }

    /// Encode to the binary block
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::encode_to_vec(self, config::standard())?)
    }

    /// Decode a binary block and check its version
    ///
    /// # Errors
    ///
    /// `SaveStateDecode` for malformed data, `IncompatibleSaveState` for a
    /// block written by another version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (state, _): (SaveState, usize) = bincode::decode_from_slice(bytes, config::standard())?;
        if state.version != SAVE_STATE_VERSION {
            return Err(EmulatorError::IncompatibleSaveState {
                expected: SAVE_STATE_VERSION,
                got: state.version,
            });
        }
        Ok(state)
    }

    /// Save state to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let encoded = self.to_bytes()?;
        std::fs::write(path.as_ref(), &encoded)?;
        log::info!(
            "Save state written to {} ({} bytes)",
            path.as_ref().display(),
            encoded.len()
        );
        Ok(())
    }

    /// Load state from file
    ///
    /// # Errors
    ///
    /// I/O errors, malformed data or an incompatible version.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let buffer = std::fs::read(path)?;
        Self::from_bytes(&buffer)
    }
}

/// Components that can be saved and restored
///
/// # Example
///
/// ```
/// use mcdrx::core::config::SyncConfig;
/// use mcdrx::core::gate_array::GateArray;
/// use mcdrx::core::save_state::StateSave;
///
/// let mut gate = GateArray::new(&SyncConfig::default());
/// gate.set_byte(0x10, 0x42);
/// let state = gate.to_state();
///
/// let mut fresh = GateArray::new(&SyncConfig::default());
/// fresh.restore_from_state(&state);
/// assert_eq!(fresh.byte(0x10), 0x42);
/// ```
pub trait StateSave {
    /// The state type for this component
    type State: Serialize + for<'de> Deserialize<'de>;

    /// Convert this component to a saveable state
    fn to_state(&self) -> Self::State;

    /// Restore this component from a saved state
    fn restore_from_state(&mut self, state: &Self::State);
}

impl StateSave for GateArray {
    type State = GateState;

    fn to_state(&self) -> GateState {
        GateState {
            regs: self.regs.to_vec(),
            busreq: self.busreq,
            reset_pending: self.reset_pending,
            hint_vector: self.hint_vector,
            timer_counter: self.timer_counter,
            stopwatch: self.stopwatch,
        }
    }

    fn restore_from_state(&mut self, state: &GateState) {
        debug_assert_eq!(self.regs.len(), GATE_REGISTER_COUNT);
        restore_bytes(&mut self.regs, &state.regs);
        self.busreq = state.busreq & 0x03;
        self.reset_pending = state.reset_pending;
        self.hint_vector = state.hint_vector;
        self.timer_counter = state.timer_counter;
        self.stopwatch = state.stopwatch & 0x0FFF;
        // Spin-poll history restarts
        self.sync.reset();
    }
}

impl StateSave for WordRam {
    type State = WordRamState;

    fn to_state(&self) -> WordRamState {
        WordRamState {
            ram: self.contents().to_vec(),
            mode_bits: self.mode_bits(),
            delayed_dmna: self.delayed_dmna(),
        }
    }

    fn restore_from_state(&mut self, state: &WordRamState) {
        self.restore(&state.ram, state.mode_bits, state.delayed_dmna);
    }
}

impl StateSave for Memory {
    type State = MemoryState;

    fn to_state(&self) -> MemoryState {
        MemoryState {
            prg_ram: self.prg_ram.clone(),
            backup_ram: self.backup_ram.clone(),
            cart_ram: self.cart_ram.clone(),
            cart_write_enable: self.cart_write_enable,
        }
    }

    fn restore_from_state(&mut self, state: &MemoryState) {
        restore_bytes(&mut self.prg_ram, &state.prg_ram);
        restore_bytes(&mut self.backup_ram, &state.backup_ram);
        restore_bytes(&mut self.cart_ram, &state.cart_ram);
        self.cart_write_enable = state.cart_write_enable;
    }
}

impl StateSave for Cdc {
    type State = CdcState;

    fn to_state(&self) -> CdcState {
        CdcState {
            mode: self.mode,
            index: self.index,
            dma_address: self.dma_address,
            ifstat: self.ifstat.bits(),
            ifctrl: self.ifctrl.bits(),
            ctrl0: self.ctrl0.bits(),
            ctrl1: self.ctrl1,
            sbout: self.sbout,
            dbc: self.dbc,
            dac: self.dac,
            wa: self.wa,
            pt: self.pt,
            header: self.header,
            stat: self.stat,
            ring: self.ring.clone(),
            irq_pending: self.irq_pending,
            sectors_decoded: self.sectors_decoded,
        }
    }

    fn restore_from_state(&mut self, state: &CdcState) {
        self.mode = state.mode;
        self.index = state.index & 0x0F;
        self.dma_address = state.dma_address;
        self.ifstat = IfStat::from_bits_retain(state.ifstat);
        self.ifctrl = IfCtrl::from_bits_truncate(state.ifctrl);
        self.ctrl0 = Ctrl0::from_bits_truncate(state.ctrl0);
        self.ctrl1 = state.ctrl1;
        self.sbout = state.sbout;
        self.dbc = state.dbc;
        self.dac = state.dac;
        self.wa = state.wa;
        self.pt = state.pt;
        self.header = state.header;
        self.stat = state.stat;
        restore_bytes(&mut self.ring, &state.ring);
        self.irq_pending = state.irq_pending;
        self.sectors_decoded = state.sectors_decoded;
    }
}

impl StateSave for Cdd {
    type State = CddState;

    fn to_state(&self) -> CddState {
        CddState {
            state: self.state,
            lba: self.lba,
            track: self.track,
            delay: self.delay,
            report: self.report,
            complete: self.complete,
            command: self.command,
            status: self.status,
            data_mode: self.data_mode,
            fader: self.fader,
        }
    }

    fn restore_from_state(&mut self, state: &CddState) {
        self.state = state.state;
        self.lba = state.lba;
        self.track = state.track;
        self.delay = state.delay;
        self.report = state.report;
        self.complete = state.complete;
        self.command = state.command;
        self.status = state.status;
        self.data_mode = state.data_mode;
        self.fader = state.fader;
    }
}

impl StateSave for Channel {
    type State = ChannelState;

    fn to_state(&self) -> ChannelState {
        ChannelState {
            env: self.env,
            pan: self.pan,
            fd: self.fd,
            ls: self.ls,
            st: self.st,
            addr: self.addr,
        }
    }

    fn restore_from_state(&mut self, state: &ChannelState) {
        self.env = state.env;
        self.pan = state.pan;
        self.fd = state.fd;
        self.ls = state.ls;
        self.st = state.st;
        self.addr = state.addr;
    }
}

impl StateSave for Pcm {
    type State = PcmState;

    fn to_state(&self) -> PcmState {
        PcmState {
            channels: self.channels.iter().map(Channel::to_state).collect(),
            ram: self.ram.clone(),
            sounding: self.sounding,
            selected: self.selected as u8,
            bank: self.bank,
            channel_off: self.channel_off,
        }
    }

    fn restore_from_state(&mut self, state: &PcmState) {
        for (channel, saved) in self.channels.iter_mut().zip(&state.channels) {
            channel.restore_from_state(saved);
        }
        restore_bytes(&mut self.ram, &state.ram);
        self.sounding = state.sounding;
        self.selected = state.selected as usize % CHANNEL_COUNT;
        self.bank = state.bank & 0x0F;
        self.channel_off = state.channel_off;
    }
}

impl StateSave for Graphics {
    type State = GfxState;

    fn to_state(&self) -> GfxState {
        GfxState {
            regs: self.regs,
            trace_address: self.trace_address,
            buffer_start: self.buffer_start,
            accumulator: self.accumulator,
        }
    }

    fn restore_from_state(&mut self, state: &GfxState) {
        self.regs = state.regs;
        self.trace_address = state.trace_address;
        self.buffer_start = state.buffer_start;
        self.accumulator = state.accumulator;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use tempfile::tempdir;

    fn system() -> SegaCd {
        SegaCd::new(Config::default()).unwrap()
    }

    #[test]
    fn test_save_state_version() {
        let state = SaveState::capture(&system());
        assert_eq!(state.version, SAVE_STATE_VERSION);
        assert!(!state.metadata.disc_inserted);
    }

    #[test]
    fn test_round_trip_restores_system() {
        let mut cd = system();
        cd.main_write8(0xA12010, 0x42);
        cd.sub_write8(0x001234, 0x5A);
        cd.sub_write8(0xFE0001, 0x99);
        cd.sub_write8(0xFF8033, 0x08);
        cd.sub_write8(0xFF8031, 0x05);
        cd.sub_write8(0xFF8003, 0x04);
        cd.tick();

        let bytes = SaveState::capture(&cd).to_bytes().unwrap();

        let mut restored = system();
        SaveState::from_bytes(&bytes).unwrap().apply(&mut restored);

        assert_eq!(restored.ticks(), 1);
        assert_eq!(restored.sub_read8(0xFF8010), 0x42);
        assert_eq!(restored.sub_read8(0x001234), 0x5A);
        assert_eq!(restored.memory().backup_ram()[0], 0x99);
        assert_eq!(restored.interrupts().read_mask(), 0x08);
        assert_eq!(restored.gate().stopwatch(), cd.gate().stopwatch());
        // 1M layout is reinstalled
        assert!(restored.sub_claims(0x0C0000));
    }

    #[test]
    fn test_restored_system_continues_identically() {
        let mut cd = system();
        cd.sub_write8(0xFF8033, 0x08);
        cd.sub_write8(0xFF8031, 0x03);
        for _ in 0..5 {
            cd.tick();
        }
        let state = SaveState::capture(&cd);

        let mut restored = system();
        state.apply(&mut restored);
        for _ in 0..20 {
            cd.tick();
            restored.tick();
            assert_eq!(restored.gate().stopwatch(), cd.gate().stopwatch());
            assert_eq!(
                restored.interrupts().pending_bits(),
                cd.interrupts().pending_bits()
            );
        }
    }

    #[test]
    fn test_save_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("slot.state");

        let mut cd = system();
        cd.main_write8(0xA12011, 0x7E);
        let mut state = SaveState::capture(&cd);
        state.metadata.label = "boot menu".to_string();
        state.save_to_file(&path).unwrap();

        let loaded = SaveState::load_from_file(&path).unwrap();
        assert_eq!(loaded.metadata.label, "boot menu");
        assert_eq!(loaded.gate.regs[0x11], 0x7E);
    }

    #[test]
    fn test_version_check() {
        let mut state = SaveState::capture(&system());
        state.version = 999;
        let bytes = state.to_bytes().unwrap();

        let result = SaveState::from_bytes(&bytes);
        assert!(matches!(
            result,
            Err(EmulatorError::IncompatibleSaveState {
                expected: SAVE_STATE_VERSION,
                got: 999
            })
        ));
    }

    #[test]
    fn test_truncated_block_rejected() {
        let bytes = SaveState::capture(&system()).to_bytes().unwrap();
        let result = SaveState::from_bytes(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(EmulatorError::SaveStateDecode(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = SaveState::load_from_file(dir.path().join("absent.state"));
        assert!(matches!(result, Err(EmulatorError::Io(_))));
    }

    #[test]
    fn test_component_state() {
        let mut pcm = Pcm::new(44100);
        pcm.write(0x07, 0xC3);
        pcm.write(0x00, 0x80);
        let state = pcm.to_state();
        assert_eq!(state.channels.len(), CHANNEL_COUNT);
        assert_eq!(state.selected, 3);
        assert_eq!(state.channels[3].env, 0x80);

        let mut fresh = Pcm::new(44100);
        fresh.restore_from_state(&state);
        assert_eq!(fresh.channel(3).env, 0x80);
    }
}
