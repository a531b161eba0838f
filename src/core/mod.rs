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

//! Core emulation components
//!
//! This module contains all expansion unit components:
//! - Gate Array (shared register file, handshakes, timer, font renderer)
//! - Word RAM (2M/1M bank controller)
//! - CDC (CD block decoder and transfer engine)
//! - CDD (CD drive command/status protocol)
//! - PCM (8-channel sound generator)
//! - Graphics co-processor (stamp engine)
//! - Address maps and owned memories
//! - System integration and scheduling

pub mod cdc;
pub mod cdd;
pub mod cdrom;
pub mod config;
pub mod error;
pub mod gate_array;
pub mod gfx;
pub mod interrupt;
pub mod memory;
pub mod pcm;
pub mod save_state;
pub mod system;
pub mod timing;
pub mod word_ram;

// Re-export commonly used types
pub use cdc::Cdc;
pub use cdd::Cdd;
pub use config::Config;
pub use error::{CdError, EmulatorError, Result};
pub use gate_array::{GateArray, Side};
pub use gfx::Graphics;
pub use pcm::Pcm;
pub use save_state::SaveState;
pub use system::{Scheduler, SegaCd};
pub use word_ram::WordRam;
