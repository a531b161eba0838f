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

/// Emulator error types
///
/// Only host-level failures end up here. Conditions the emulated software
/// can observe (tray open, no disc, bad host read, write-protected PRG RAM)
/// are reported through the emulated registers instead.
use thiserror::Error;

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Main error type for the emulator
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("Boot ROM file not found: {0}")]
    BootRomNotFound(String),

    #[error("Invalid boot ROM size: {got} bytes (expected at most {max})")]
    InvalidBootRomSize { max: usize, got: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Save state encode error: {0}")]
    SaveStateEncode(#[from] bincode::error::EncodeError),

    #[error("Save state decode error: {0}")]
    SaveStateDecode(#[from] bincode::error::DecodeError),

    #[error("Incompatible save state version: expected {expected}, got {got}")]
    IncompatibleSaveState { expected: u32, got: u32 },

    #[error("Invalid address map: region 0x{start:06X}-0x{end:06X} {reason}")]
    InvalidAddressMap {
        start: u32,
        end: u32,
        reason: &'static str,
    },

    #[error("Invalid {table} handler table: entry 0x{index:02X} {reason}")]
    InvalidHandlerTable {
        table: &'static str,
        index: u32,
        reason: &'static str,
    },

    #[error("CD error: {0}")]
    Cd(#[from] CdError),
}

/// Disc-level error types
#[derive(Error, Debug)]
pub enum CdError {
    #[error("No disc inserted")]
    NoDisc,

    #[error("Invalid sector: {lba}")]
    InvalidSector { lba: i32 },

    #[error("Disc load error: {0}")]
    DiscLoadError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
