// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Memory tests
//!
//! - `regions`: region table validation and per-mode maps
//! - `storage`: boot ROM loading, backup RAM, RAM cart

use super::*;
