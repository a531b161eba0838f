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

use super::*;

#[test]
fn test_mailbox_ownership() {
    let mut gate = gate();
    gate.write_comm(Side::Main, 0x10, 0xAA);
    gate.write_comm(Side::Sub, 0x10, 0xBB);
    gate.write_comm(Side::Sub, 0x20, 0xCC);
    gate.write_comm(Side::Main, 0x20, 0xDD);

    assert_eq!(gate.read_comm(Side::Sub, 0x10), 0xAA);
    assert_eq!(gate.read_comm(Side::Main, 0x20), 0xCC);
}

#[test]
fn test_flags_are_separate() {
    let mut gate = gate();
    gate.write_flag(Side::Main, 0x81);
    gate.write_flag(Side::Sub, 0x42);
    assert_eq!(gate.read_flag(Side::Sub, 0x0E), 0x81);
    assert_eq!(gate.read_flag(Side::Main, 0x0F), 0x42);
}

#[test]
fn test_flag_spin_poll_requests_sync() {
    let mut gate = gate();

    // Fresh sub flag: first read consumes the mark
    gate.write_flag(Side::Sub, 1);
    gate.read_flag(Side::Main, 0x0F);
    assert_eq!(gate.sync_requested(), None);

    // Two stale reads trigger a sync of the sub side
    gate.read_flag(Side::Main, 0x0F);
    assert_eq!(gate.sync_requested(), None);
    gate.read_flag(Side::Main, 0x0F);
    assert_eq!(gate.take_sync_request(), Some(Side::Sub));
    assert_eq!(gate.take_sync_request(), None);
}

#[test]
fn test_comm_status_poll_threshold() {
    let mut gate = gate();
    for _ in 0..3 {
        gate.read_comm(Side::Main, 0x20);
    }
    assert_eq!(gate.sync_requested(), None);
    gate.read_comm(Side::Main, 0x20);
    assert_eq!(gate.take_sync_request(), Some(Side::Sub));
}

#[test]
fn test_main_overwriting_unread_command_requests_sync() {
    let mut gate = gate();
    gate.write_comm(Side::Main, 0x10, 1);
    assert_eq!(gate.sync_requested(), None);
    gate.write_comm(Side::Main, 0x10, 2);
    assert_eq!(gate.take_sync_request(), Some(Side::Sub));

    // Once the sub CPU has read it, the next write is fine
    gate.read_comm(Side::Sub, 0x10);
    gate.write_comm(Side::Main, 0x10, 3);
    assert_eq!(gate.sync_requested(), None);
}

#[test]
fn test_unchanged_flag_write_is_noop() {
    let mut gate = gate();
    gate.write_flag(Side::Main, 5);
    gate.write_flag(Side::Main, 5);
    assert_eq!(gate.sync_requested(), None);
    gate.write_flag(Side::Main, 6);
    assert_eq!(gate.take_sync_request(), Some(Side::Sub));
}

#[test]
fn test_detection_disabled() {
    let config = SyncConfig {
        extra_cpu_sync: false,
        ..SyncConfig::default()
    };
    let mut gate = GateArray::new(&config);
    for _ in 0..10 {
        gate.read_flag(Side::Main, 0x0F);
    }
    assert_eq!(gate.sync_requested(), None);
}

#[test]
fn test_detector_never_changes_values() {
    let mut gate = gate();
    gate.write_comm(Side::Sub, 0x22, 0x5A);
    for _ in 0..20 {
        assert_eq!(gate.read_comm(Side::Main, 0x22), 0x5A);
    }
}
