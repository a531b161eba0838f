// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Shared integration test helpers

pub mod assertions;
pub mod fixtures;
pub mod programs;
