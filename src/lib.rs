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

//! Mega-CD / Sega CD expansion unit core library
//!
//! This library emulates the hardware of the CD-ROM expansion unit that
//! attaches to a 16-bit console: the Gate Array shared by the main and sub
//! CPUs, the switchable Word RAM, the CD controller and drive, the PCM sound
//! generator and the graphics co-processor. The two 68000 interpreters are
//! external; they drive the unit through the [`core::system::CpuBus`] views.
//!
//! # Example
//!
//! ```
//! use mcdrx::core::config::Config;
//! use mcdrx::core::system::{IdleProcessor, Scheduler, SegaCd};
//!
//! let config = Config::default();
//! let mut cd = SegaCd::new(config.clone()).unwrap();
//! let mut scheduler = Scheduler::new(&config.clock);
//!
//! // Main CPU posts a command byte, the sub CPU sees it
//! cd.main_write8(0xA12010, 0x01);
//! assert_eq!(cd.sub_read8(0xFF8010), 0x01);
//!
//! scheduler.run_frame(&mut cd, &mut IdleProcessor::new(), &mut IdleProcessor::new());
//! ```

pub mod core;
