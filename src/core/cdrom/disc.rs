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

//! Table of contents and in-memory disc images
//!
//! Images are flat runs of raw 2352-byte sectors, tracks laid out back to
//! back starting at LBA 0. Track 1 is always the data track.

use super::{CDPosition, DiscSource, PAST_LAST_TRACK, SECTOR_SIZE};
use crate::core::error::CdError;
use serde::Serialize;
use std::path::Path;

/// Disc track information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Track {
    /// Track number (1-99)
    pub number: u8,

    /// Track type
    pub track_type: TrackType,

    /// First LBA of the track
    pub start_lba: i32,

    /// Length in sectors
    pub length_sectors: u32,
}

impl Track {
    /// Start position in MSF
    pub fn start_position(&self) -> CDPosition {
        CDPosition::from_lba(self.start_lba)
    }

    /// One past the last LBA of the track
    pub fn end_lba(&self) -> i32 {
        self.start_lba + self.length_sectors as i32
    }
}

/// Disc track type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackType {
    /// Mode 1 data track
    Data,
    /// CD-DA audio
    Audio,
}

/// Highest track number a table of contents can carry
pub const MAX_TRACKS: usize = 99;

/// Table of contents
///
/// Ordered tracks plus the lead-out position.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Toc {
    tracks: Vec<Track>,
    lead_out: i32,
}

impl Toc {
    /// Build a table of contents from consecutive track lengths
    ///
    /// # Arguments
    ///
    /// * `layout` - Track type and length in sectors, in track order
    ///
    /// # Example
    ///
    /// ```
    /// use mcdrx::core::cdrom::{Toc, TrackType};
    ///
    /// let toc = Toc::from_layout(&[(TrackType::Data, 1000), (TrackType::Audio, 500)]);
    /// assert_eq!(toc.last_track(), 2);
    /// assert_eq!(toc.lead_out(), 1500);
    /// ```
    pub fn from_layout(layout: &[(TrackType, u32)]) -> Self {
        debug_assert!(layout.len() <= MAX_TRACKS);
        let mut tracks = Vec::with_capacity(layout.len());
        let mut lba = 0i32;
        for (i, &(track_type, length_sectors)) in layout.iter().enumerate() {
            tracks.push(Track {
                number: (i + 1) as u8,
                track_type,
                start_lba: lba,
                length_sectors,
            });
            lba += length_sectors as i32;
        }
        Self {
            tracks,
            lead_out: lba,
        }
    }

    /// All tracks in order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Track by number
    pub fn track(&self, number: u8) -> Option<&Track> {
        self.tracks.iter().find(|t| t.number == number)
    }

    /// First track number (0 when the disc has no tracks)
    pub fn first_track(&self) -> u8 {
        self.tracks.first().map_or(0, |t| t.number)
    }

    /// Last track number (0 when the disc has no tracks)
    pub fn last_track(&self) -> u8 {
        self.tracks.last().map_or(0, |t| t.number)
    }

    /// Lead-out LBA (total program area length)
    pub fn lead_out(&self) -> i32 {
        self.lead_out
    }

    /// Track containing `lba`
    ///
    /// Linear scan over the track list. Positions before the first track
    /// clamp to the first track; positions at or past the lead-out return
    /// [`PAST_LAST_TRACK`].
    pub fn lba_to_track(&self, lba: i32) -> u8 {
        if self.tracks.is_empty() || lba >= self.lead_out {
            return PAST_LAST_TRACK;
        }
        let mut current = self.first_track();
        for track in &self.tracks {
            if lba < track.start_lba {
                break;
            }
            current = track.number;
        }
        current
    }
}

/// Disc image held in memory
///
/// # Example
///
/// ```
/// use mcdrx::core::cdrom::{DiscImage, DiscSource, SECTOR_SIZE};
///
/// let disc = DiscImage::from_raw(vec![0u8; SECTOR_SIZE * 4]).unwrap();
/// assert_eq!(disc.toc().lead_out(), 4);
/// assert!(disc.read_sector(3).is_some());
/// assert!(disc.read_sector(4).is_none());
/// ```
#[derive(Debug)]
pub struct DiscImage {
    toc: Toc,

    /// Raw sector data, track 1 first
    data: Vec<u8>,
}

impl DiscImage {
    /// Load a single-track raw (2352 bytes per sector) data image
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the `.bin` image
    ///
    /// # Returns
    ///
    /// - `Ok(DiscImage)` if loading succeeded
    /// - `Err(CdError)` if the file is unreadable or not sector aligned
    pub fn from_bin<P: AsRef<Path>>(path: P) -> Result<Self, CdError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            CdError::DiscLoadError(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let disc = Self::from_raw(data)?;

        log::info!(
            "Loaded disc image: {} sectors, {} MB",
            disc.toc.lead_out(),
            disc.data.len() / 1024 / 1024
        );

        Ok(disc)
    }

    /// Wrap raw sector data as a single data track
    pub fn from_raw(data: Vec<u8>) -> Result<Self, CdError> {
        if data.is_empty() || data.len() % SECTOR_SIZE != 0 {
            return Err(CdError::DiscLoadError(format!(
                "image size {} is not a multiple of {} bytes",
                data.len(),
                SECTOR_SIZE
            )));
        }
        let sectors = (data.len() / SECTOR_SIZE) as u32;
        Ok(Self {
            toc: Toc::from_layout(&[(TrackType::Data, sectors)]),
            data,
        })
    }

    /// Build a multi-track image from raw data and a track layout
    ///
    /// Track 1 must be the data track and the layout must cover `data`
    /// exactly.
    pub fn from_tracks(data: Vec<u8>, layout: &[(TrackType, u32)]) -> Result<Self, CdError> {
        if layout.len() > MAX_TRACKS {
            return Err(CdError::DiscLoadError(format!(
                "{} tracks exceed the limit of {}",
                layout.len(),
                MAX_TRACKS
            )));
        }
        match layout.first() {
            Some((TrackType::Data, _)) => {}
            _ => {
                return Err(CdError::DiscLoadError(
                    "track 1 must be a data track".to_string(),
                ))
            }
        }
        let toc = Toc::from_layout(layout);
        if toc.lead_out() as usize * SECTOR_SIZE != data.len() {
            return Err(CdError::DiscLoadError(format!(
                "layout covers {} sectors, image holds {} bytes",
                toc.lead_out(),
                data.len()
            )));
        }
        Ok(Self { toc, data })
    }

    /// Number of tracks
    pub fn track_count(&self) -> usize {
        self.toc.tracks().len()
    }
}

impl DiscSource for DiscImage {
    fn toc(&self) -> &Toc {
        &self.toc
    }

    fn read_sector(&self, lba: i32) -> Option<[u8; SECTOR_SIZE]> {
        if lba < 0 || lba >= self.toc.lead_out() {
            return None;
        }
        let offset = lba as usize * SECTOR_SIZE;
        let mut sector = [0u8; SECTOR_SIZE];
        sector.copy_from_slice(self.data.get(offset..offset + SECTOR_SIZE)?);
        Some(sector)
    }
}
