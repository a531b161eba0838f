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
fn test_masked_request_is_dropped() {
    let mut ic = InterruptController::new();
    assert!(!ic.request(levels::CDD));
    assert_eq!(ic.pending_bits(), 0);

    // Enabling afterwards does not resurrect the dropped request
    ic.write_mask(1 << levels::CDD);
    assert!(!ic.any_pending());
}

#[test]
fn test_mask_hides_latched_request() {
    let mut ic = InterruptController::new();
    ic.write_mask(1 << levels::CDC);
    ic.request(levels::CDC);
    assert!(ic.any_pending());

    ic.write_mask(0);
    assert!(!ic.any_pending());

    ic.write_mask(1 << levels::CDC);
    assert_eq!(ic.highest_pending(), levels::CDC);
}

#[test]
fn test_mask_bit_zero_unused() {
    let mut ic = InterruptController::new();
    ic.write_mask(0xFF);
    assert_eq!(ic.read_mask(), 0x7E);
}
