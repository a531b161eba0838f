// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Interrupt controller tests
//!
//! - `basic`: request/acknowledge and level priority
//! - `masking`: mask register behavior

use super::*;

mod masking;
