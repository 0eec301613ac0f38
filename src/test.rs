// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Cross-module tests exercising the full event-to-audio path through the
//! mock devices.

use std::fs;
use std::io::Write;
use std::sync::Arc;

use crate::audio;
use crate::bank::{loader, Bank, Sample};
use crate::config;
use crate::engine::Sampler;
use crate::event::{Event, EventHandler};
use crate::midi::{self, Device as _};
use crate::pitch::{Note, Pitch};
use crate::playsync::CancelHandle;

fn test_bank() -> Arc<Bank> {
    let mut bank = Bank::new("e2e");
    bank.add(Sample::new(
        Pitch::new(Note::C, 4),
        44100,
        vec![0.5, 0.5],
        vec![0.25],
        vec![0.1],
    ));
    Arc::new(bank)
}

#[tokio::test]
async fn test_midi_events_drive_audio_output() {
    let (sampler, renderer) = Sampler::new(test_bank(), false);
    let sampler = Arc::new(sampler);

    let audio_device = audio::get_device(&config::Audio::new(Some("mock".to_string()), 44100))
        .expect("mock audio device");
    audio_device
        .start(renderer, CancelHandle::new())
        .expect("start audio");
    let mock_audio = audio_device.to_mock().expect("mock audio");

    let mock_midi = midi::test::Device::get("mock");
    let (sender, mut receiver) = tokio::sync::mpsc::channel(16);
    mock_midi.watch_events(sender).expect("watch events");

    // Press middle C and let the event flow through the dispatch path.
    mock_midi.mock_event(Event::from_midi(&[0x90, 60, 100]).expect("decode press"));
    let event = receiver.recv().await.expect("press event");
    sampler.handle_event(&event);

    // Attack crosses into looping sustain within one block.
    assert_eq!(mock_audio.pull(3), vec![0.5, 0.5, 0.25]);
    assert_eq!(sampler.active_voices(), 1);

    // Release; the decay is observed at the next block boundary.
    mock_midi.mock_event(Event::from_midi(&[0x80, 60, 0]).expect("decode release"));
    let event = receiver.recv().await.expect("release event");
    sampler.handle_event(&event);

    assert_eq!(mock_audio.pull(2), vec![0.1, 0.0]);
    assert_eq!(mock_audio.pull(2), vec![0.0, 0.0]);
    assert_eq!(sampler.active_voices(), 0);

    mock_midi.stop_watch_events();
}

#[tokio::test]
async fn test_loaded_bank_plays_through_engine() {
    // Build a bank on disk, load it, and play from it end to end.
    let dir = tempfile::tempdir().expect("tempdir");
    let bank_dir = dir.path().join("piano");
    fs::create_dir(&bank_dir).expect("create bank dir");

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    for (file, frames) in [
        ("attack.wav", vec![0.4f32]),
        ("sustain.wav", vec![0.2, 0.3]),
        ("decay.wav", vec![0.1]),
    ] {
        let mut writer =
            hound::WavWriter::create(bank_dir.join(file), spec).expect("create wav");
        for frame in frames {
            writer.write_sample(frame).expect("write sample");
        }
        writer.finalize().expect("finalize wav");
    }
    let mut manifest = fs::File::create(bank_dir.join(loader::MANIFEST_FILE))
        .expect("create manifest");
    manifest
        .write_all(
            br#"{"name": "piano", "samples": [{"pitch": "A4", "attack": "attack.wav", "sustain": "sustain.wav", "decay": "decay.wav"}]}"#,
        )
        .expect("write manifest");

    let banks = loader::read_banks(dir.path(), 44100).expect("read banks");
    let bank = banks.get("piano").expect("piano bank").clone();

    let (sampler, mut renderer) = Sampler::new(bank, false);
    sampler.press(Pitch::new(Note::A, 4));

    let mut block = vec![0.0f32; 4];
    renderer.render(&mut block);
    assert_eq!(block, vec![0.4, 0.2, 0.3, 0.2]);

    sampler.release(Pitch::new(Note::A, 4));
    renderer.render(&mut block);
    assert_eq!(block, vec![0.1, 0.0, 0.0, 0.0]);
}
