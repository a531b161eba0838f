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

//! Custom assertions for expansion unit testing

use mcdrx::core::system::SegaCd;

/// Assert a sub CPU Gate Array byte has the expected value
#[allow(dead_code)]
pub fn assert_sub_gate(cd: &mut SegaCd, offset: u32, expected: u8) {
    let actual = cd.sub_gate_read8(offset);
    assert_eq!(
        actual, expected,
        "Sub gate 0x{:02X} mismatch: expected 0x{:02X}, got 0x{:02X}",
        offset, expected, actual
    );
}

/// Assert a main CPU Gate Array byte has the expected value
#[allow(dead_code)]
pub fn assert_main_gate(cd: &mut SegaCd, offset: u32, expected: u8) {
    let actual = cd.main_gate_read8(offset);
    assert_eq!(
        actual, expected,
        "Main gate 0x{:02X} mismatch: expected 0x{:02X}, got 0x{:02X}",
        offset, expected, actual
    );
}

/// Assert an interrupt level is pending
#[allow(dead_code)]
pub fn assert_interrupt_pending(cd: &SegaCd, level: u8) {
    assert!(
        cd.interrupts().is_pending(level),
        "Interrupt level {} not pending (pending bits 0x{:02X})",
        level,
        cd.interrupts().pending_bits()
    );
}

/// Assert PRG RAM holds `expected` at `offset`
#[allow(dead_code)]
pub fn assert_prg_bytes(cd: &SegaCd, offset: usize, expected: &[u8]) {
    let actual = &cd.memory().prg_ram()[offset..offset + expected.len()];
    assert_eq!(
        actual, expected,
        "PRG RAM at 0x{:05X} mismatch",
        offset
    );
}
