// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! CD-ROM addressing tests
//!
//! - `msf`: MSF/LBA/BCD conversion
//! - `disc`: table of contents and image access

use super::*;
