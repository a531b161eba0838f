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

mod common;

use common::assertions::{assert_interrupt_pending, assert_sub_gate};
use common::fixtures::{
    create_test_disc, create_test_system, patterned_sectors, read_cdc_registers, send_cdd_command,
    tick_until, write_cdc_registers, DATA_SECTORS, SUB_GATE,
};
use common::programs::{CommandResponder, CommandSender, Releaser, TimerServicer};
use mcdrx::core::cdrom::{DiscImage, DiscSource};
use mcdrx::core::config::Config;
use mcdrx::core::error::Result;
use mcdrx::core::interrupt::levels;
use mcdrx::core::save_state::SaveState;
use mcdrx::core::system::{IdleProcessor, Scheduler, SegaCd};
use tempfile::tempdir;

/// Insert the test disc, enable the host clock and start playing at 00:02:00
fn start_playback(cd: &mut SegaCd) {
    cd.insert_disc(Box::new(create_test_disc()));
    cd.sub_write8(SUB_GATE + 0x37, 0x04);
    // CTRL0: DECEN | WRRQ
    write_cdc_registers(cd, 0x0A, &[0x84]);
    send_cdd_command(cd, 0x3, [0, 0, 0, 2, 0, 0]);
}

#[test]
fn test_basic_initialization() -> Result<()> {
    let cd = SegaCd::new(Config::default())?;
    assert_eq!(cd.ticks(), 0);
    assert!(!cd.sub_running());
    assert!(!cd.has_disc());
    Ok(())
}

#[test]
fn test_comm_handshake_through_scheduler() {
    let config = Config::default();
    let mut cd = create_test_system();
    let mut scheduler = Scheduler::new(&config.clock);
    let mut main = CommandSender::new(0x01);
    let mut sub = CommandResponder::default();

    for _ in 0..4 {
        scheduler.run_line(&mut cd, &mut main, &mut sub);
    }

    assert_eq!(sub.resets, 1);
    assert!(sub.answered);
    assert_eq!(main.reply, Some(0x81));
    // The main CPU spun on the sub flag and forced at least one catch-up
    assert!(scheduler.syncs() >= 1);
    assert_sub_gate(&mut cd, 0x20, 0x81);
}

#[test]
fn test_timer_interrupt_drives_sub() {
    let config = Config::default();
    let mut cd = create_test_system();
    let mut scheduler = Scheduler::new(&config.clock);
    let mut main = Releaser::default();
    // 16 steps of 30.72 us per interrupt
    let mut sub = TimerServicer::new(0x0F);

    scheduler.run_frame(&mut cd, &mut main, &mut sub);

    assert!(cd.sub_running());
    assert!(
        (30..=34).contains(&sub.serviced),
        "serviced {} timer interrupts",
        sub.serviced
    );
}

#[test]
fn test_disc_to_host_pipeline() {
    let mut cd = create_test_system();
    cd.sub_write8(SUB_GATE + 0x33, 1 << levels::CDC);
    // IFCTRL: DTEIEN | DECIEN | DOUTEN
    write_cdc_registers(&mut cd, 0x01, &[0x62]);
    start_playback(&mut cd);

    tick_until(&mut cd, 5000, |cd| cd.cdc().sectors_decoded() >= 1);
    assert_interrupt_pending(&cd, levels::CDC);

    // HEAD0-3 carry the BCD position of LBA 0 and mode 1
    assert_eq!(read_cdc_registers(&mut cd, 0x04, 4), vec![0x00, 0x02, 0x00, 0x01]);

    // Eight bytes from ring offset 16 to the sub CPU data port
    cd.sub_write8(SUB_GATE + 0x04, 0x03);
    write_cdc_registers(&mut cd, 0x02, &[7, 0, 16, 0, 0]);
    assert!(cd.cdc().is_busy());

    let words: Vec<u16> = (0..4).map(|_| cd.sub_read16(SUB_GATE + 0x08)).collect();
    assert_eq!(words, vec![0x1011, 0x1213, 0x1415, 0x1617]);
    assert!(cd.cdc().transfer_complete());
    assert!(!cd.cdc().is_busy());
}

#[test]
fn test_playback_reaches_audio_track() {
    let mut cd = create_test_system();
    start_playback(&mut cd);

    tick_until(&mut cd, 100_000, |cd| cd.cdd().lba() > DATA_SECTORS as i32);
    assert_eq!(cd.cdd().track(), 2);
    assert!(!cd.cdd().data_mode());
    // Audio sectors bypass the decoder
    assert_eq!(cd.cdc().sectors_decoded(), DATA_SECTORS as u64);
}

#[test]
fn test_save_state_resume() -> Result<()> {
    let config = Config::default();
    let mut cd = create_test_system();
    start_playback(&mut cd);

    let mut scheduler = Scheduler::new(&config.clock);
    let (mut main, mut sub) = (IdleProcessor::new(), IdleProcessor::new());
    for _ in 0..20 {
        scheduler.run_frame(&mut cd, &mut main, &mut sub);
    }

    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("resume.state");
    SaveState::capture(&cd).save_to_file(&path)?;

    let mut restored = create_test_system();
    restored.insert_disc(Box::new(create_test_disc()));
    SaveState::load_from_file(&path)?.apply(&mut restored);
    assert_eq!(restored.ticks(), cd.ticks());

    let mut restored_scheduler = Scheduler::new(&config.clock);
    let (mut main2, mut sub2) = (IdleProcessor::new(), IdleProcessor::new());
    for _ in 0..5 {
        scheduler.run_frame(&mut cd, &mut main, &mut sub);
        restored_scheduler.run_frame(&mut restored, &mut main2, &mut sub2);
    }

    assert!(cd.cdc().sectors_decoded() > 0);
    assert_eq!(restored.cdc().sectors_decoded(), cd.cdc().sectors_decoded());
    assert_eq!(restored.cdd().lba(), cd.cdd().lba());
    assert_eq!(restored.cdd().state(), cd.cdd().state());
    assert_eq!(restored.cdc().ring(), cd.cdc().ring());
    Ok(())
}

#[test]
fn test_disc_image_from_bin() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("disc.bin");
    std::fs::write(&path, patterned_sectors(20)).expect("write image");

    let disc = DiscImage::from_bin(&path).expect("aligned image loads");
    assert_eq!(disc.track_count(), 1);

    let json: serde_json::Value =
        serde_json::to_value(disc.toc()).expect("table of contents serializes");
    assert_eq!(json["lead_out"], 20);
    assert_eq!(json["tracks"][0]["track_type"], "Data");
    assert_eq!(json["tracks"][0]["length_sectors"], 20);
}

#[test]
fn test_misaligned_disc_image_is_rejected() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("short.bin");
    std::fs::write(&path, vec![0u8; 1000]).expect("write image");
    assert!(DiscImage::from_bin(&path).is_err());
}
