// Integration tests for the sound manager
// These drive the public API end to end with mock voices

use std::thread;

use approx::assert_relative_eq;
use sound_manager::audio_system::{Channel, Clip, LoopingGroup, SlotState};
use sound_manager::messaging::{AudioCommand, AudioEvent};
use sound_manager::testing::{MockBackend, MockVoice, VoiceProbe};
use sound_manager::{AudioConfig, AudioManager, MissingSoundPolicy, VoiceId};

const CONFIG: &str = r#"{
    "sounds": [
        {
            "name": "Footsteps",
            "clips": ["step1.wav", "step2.wav", "step3.wav"],
            "volume": 0.7,
            "fade_seconds": 0.25
        },
        {
            "name": "Engine",
            "clips": ["engine_low.ogg", "engine_high.ogg"],
            "fade_seconds": 1.0,
            "looping": true,
            "routing_group": "sfx"
        }
    ],
    "max_duplicate_instances": 2,
    "music_volume": 0.8
}"#;

fn backend() -> MockBackend {
    MockBackend::new()
        .with_clip("step1.wav", 0.4)
        .with_clip("step2.wav", 0.4)
        .with_clip("step3.wav", 0.4)
        .with_clip("engine_low.ogg", 8.0)
        .with_clip("engine_high.ogg", 8.0)
}

fn build() -> (AudioManager, MockBackend) {
    let config = AudioConfig::from_json(CONFIG).unwrap();
    let mut backend = backend();
    let manager = AudioManager::with_seed(&config, &mut backend, 42).unwrap();
    (manager, backend)
}

fn register(manager: &mut AudioManager, name: &str) -> (VoiceId, VoiceProbe) {
    let voice = MockVoice::new(name, 120.0);
    let probe = voice.probe();
    (manager.register_voice(Box::new(voice)), probe)
}

fn tick(manager: &mut AudioManager, seconds: f32) {
    let steps = (seconds * 60.0).round() as usize;
    for _ in 0..steps {
        manager.update(1.0 / 60.0);
    }
}

#[test]
fn test_config_json_builds_manager() {
    let (manager, backend) = build();

    assert_eq!(manager.slot_count(), 2);
    assert_eq!(manager.music_volume(), 0.8);
    assert_eq!(manager.throttle().max_instances(), 2);

    let engine = backend.voices_for("engine_high.ogg");
    assert_eq!(engine[0].settings().routing_group.as_deref(), Some("sfx"));
    assert!(engine[0].settings().looping);
}

#[test]
fn test_engine_crossfade_between_variants() {
    let (mut manager, backend) = build();
    let low = backend.voices_for("engine_low.ogg").remove(0);
    let high = backend.voices_for("engine_high.ogg").remove(0);

    manager.play_variant("Engine", 0).unwrap();
    tick(&mut manager, 1.1);
    assert_eq!(low.volume(), 1.0);

    manager.play_variant("Engine", 1).unwrap();
    tick(&mut manager, 0.5);
    assert!(low.volume() < 1.0 && low.volume() > 0.0);
    assert!(high.volume() > 0.0 && high.volume() < 1.0);
    assert_eq!(
        manager.slot_state("Engine"),
        Some(SlotState::Switching { from: 0, to: 1 })
    );

    tick(&mut manager, 0.6);
    assert!(!low.is_playing());
    assert_eq!(high.volume(), 1.0);

    // Going back while nothing is fading restarts the low variant
    manager.play_variant_with_fade("Engine", 0, 0.0).unwrap();
    assert!(low.is_playing());
    assert_eq!(low.snapshot().starts, 2);
}

#[test]
fn test_replaying_variant_that_is_fading_out() {
    let (mut manager, backend) = build();
    let low = backend.voices_for("engine_low.ogg").remove(0);

    manager.play_variant("Engine", 0).unwrap();
    tick(&mut manager, 1.1);
    manager.stop("Engine").unwrap();
    tick(&mut manager, 0.5);

    // Coming back mid fade-out cancels the pending stop and starts over
    manager.play_variant("Engine", 0).unwrap();
    assert_eq!(low.volume(), 0.0);
    tick(&mut manager, 2.0);

    assert!(low.is_playing());
    assert_eq!(low.volume(), 1.0);
    assert_eq!(low.snapshot().starts, 2);
}

#[test]
fn test_scene_round_trip() {
    let (mut manager, _backend) = build();
    let (theme, theme_probe) = register(&mut manager, "theme.ogg");
    let (birds, birds_probe) = register(&mut manager, "birds.ogg");
    let (sfx, _) = register(&mut manager, "sfx");
    let (events, _id) = manager.events().subscribe();

    manager.play_looping_music(theme, 1.0, 1.0, true).unwrap();
    manager.play_looping_sound(birds, 0.5, 0.0).unwrap();
    manager.play_one_shot_sound(sfx, &Clip::new("bang.wav", 3.0), 1.0).unwrap();
    tick(&mut manager, 1.1);
    assert_relative_eq!(theme_probe.volume(), 0.8);

    // Duplicate notifications for the same load count once
    assert!(manager.on_level_loaded());
    assert!(!manager.on_level_loaded());
    tick(&mut manager, 0.5);

    assert_eq!(manager.generation(), 1);
    assert!(theme_probe.is_playing());
    assert!(!birds_probe.is_playing());
    assert!(!manager.is_registered(sfx));
    assert_eq!(manager.looping_count(Channel::Music), 1);
    assert_eq!(manager.throttle().tracked_clips(), 0);

    let loads: Vec<u64> = events
        .try_iter()
        .filter_map(|e| match e {
            AudioEvent::LevelLoaded { generation } => Some(generation),
            _ => None,
        })
        .collect();
    assert_eq!(loads, vec![1]);

    // The survivor still answers to the music volume
    manager.set_music_volume(0.5);
    assert_relative_eq!(theme_probe.volume(), 0.5);

    // Once it is stopped, the next load cleans it up
    manager.stop_looping_music(theme).unwrap();
    tick(&mut manager, 1.1);
    assert!(!theme_probe.is_playing());
    assert!(manager.on_level_loaded());
    assert!(!manager.is_registered(theme));
}

#[test]
fn test_new_music_replaces_old_track() {
    let (mut manager, _backend) = build();
    let mut tracks = Vec::new();
    let mut probes = Vec::new();
    for name in ["calm.ogg", "battle.ogg"] {
        let (id, probe) = register(&mut manager, name);
        tracks.push(id);
        probes.push(probe);
    }

    let mut playlist = LoopingGroup::new(tracks, 1.0, Channel::Music).with_fade(0.5);
    playlist.play_index(&mut manager, 0).unwrap();
    tick(&mut manager, 0.5);
    playlist.play_index(&mut manager, 1).unwrap();
    tick(&mut manager, 0.6);

    assert!(!probes[0].is_playing());
    assert!(probes[1].is_playing());
    assert_eq!(manager.looping_count(Channel::Music), 1);
}

#[test]
fn test_one_shot_burst_is_capped_and_damped() {
    let (mut manager, _backend) = build();
    let (sfx, probe) = register(&mut manager, "sfx");
    let clip = Clip::new("explosion.wav", 1.5);

    for _ in 0..5 {
        manager.play_one_shot_sound(sfx, &clip, 0.9).unwrap();
    }

    let shots = probe.one_shots();
    assert_eq!(shots.len(), 2);
    assert_relative_eq!(shots[0].1, 0.9);
    assert_relative_eq!(shots[1].1, 0.6, epsilon = 1e-6);

    tick(&mut manager, 1.6);
    manager.play_one_shot_sound(sfx, &clip, 0.9).unwrap();
    assert_eq!(probe.one_shots().len(), 3);
}

#[test]
fn test_commands_from_gameplay_thread() {
    let (mut manager, backend) = build();
    let sender = manager.command_sender();

    let worker = thread::spawn(move || {
        sender.send(AudioCommand::Play {
            name: "Footsteps".to_string(),
            variant: Some(1),
            fade: Some(0.0),
        });
        sender.send(AudioCommand::SetPitch {
            name: "Footsteps".to_string(),
            pitch: 1.25,
            fade: Some(0.0),
        });
        sender.send(AudioCommand::Play {
            name: "NoSuchSound".to_string(),
            variant: None,
            fade: None,
        });
    });
    worker.join().unwrap();

    manager.update(1.0 / 60.0);

    let step = backend.voices_for("step2.wav").remove(0);
    assert!(step.is_playing());
    assert_relative_eq!(step.volume(), 0.7);
    assert_eq!(step.pitch(), 1.25);
}

#[test]
fn test_strict_lookup_policy() {
    let mut config = AudioConfig::from_json(CONFIG).unwrap();
    config.missing_sound = MissingSoundPolicy::Error;
    let mut manager = AudioManager::new(&config, &mut backend()).unwrap();

    assert!(manager.play("Missing").is_err());
    assert!(manager.stop("Missing").is_err());
    assert!(manager.play("Footsteps").unwrap().is_some());
}

#[test]
fn test_pause_and_resume_keep_fades() {
    let (mut manager, _backend) = build();
    let (rain, rain_probe) = register(&mut manager, "rain.ogg");

    manager.play_looping_sound(rain, 1.0, 1.0).unwrap();
    tick(&mut manager, 0.5);
    manager.pause_all();
    tick(&mut manager, 5.0);

    let entry = manager.registry().entry(Channel::Sound, rain).unwrap();
    assert!(entry.is_paused());
    assert!(!rain_probe.is_playing());

    manager.resume_all();
    tick(&mut manager, 0.6);
    assert_eq!(rain_probe.volume(), 1.0);
}
