//! Sound Engine Tests
//!
//! End-to-end behavior of the sound engine over the offline device.

use std::sync::Arc;

use approx::assert_relative_eq;
use pretty_assertions::assert_eq;

use hairgame_sound::engine::{
    encode_wav_bytes, AudioBackend, AudioBuffer, AudioDevice, ChannelLayout, DeviceSettings,
    DeviceState, OfflineBackend, OfflineDevice,
};
use hairgame_sound::sfx::MemorySource;
use hairgame_sound::synth::{Output, Waveform};
use hairgame_sound::{EngineConfig, ErrorCategory, GameCue, SoundEngine, SoundError};

/// Backend on a platform without audio support
struct NoAudioBackend;

impl AudioBackend for NoAudioBackend {
    type Device = OfflineDevice;

    fn open(&mut self, _settings: &DeviceSettings) -> hairgame_sound::Result<OfflineDevice> {
        Err(SoundError::DeviceUnavailable {
            reason: "no audio output on this platform".to_string(),
        })
    }
}

fn test_config() -> EngineConfig {
    EngineConfig {
        sample_rate: 8000,
        ..EngineConfig::default()
    }
}

/// Short mono WAV clip
fn wav_clip(secs: f64, level: f32) -> Vec<u8> {
    let frames = (secs * 8000.0) as usize;
    let mut buffer = AudioBuffer::new(frames, ChannelLayout::Mono, 8000);
    buffer.channel_mut(0).fill(level);
    encode_wav_bytes(&buffer).unwrap()
}

fn engine_with_sounds() -> SoundEngine<OfflineBackend> {
    let source = MemorySource::new()
        .with("pickup.mp3", wav_clip(0.1, 0.5))
        .with("drop.mp3", wav_clip(0.1, 0.25))
        .with("success.mp3", wav_clip(0.3, 0.5));
    SoundEngine::with_source(OfflineBackend::new(), test_config(), Arc::new(source))
}

fn device(engine: &SoundEngine<OfflineBackend>) -> &OfflineDevice {
    engine.device().unwrap()
}

fn codes(engine: &SoundEngine<impl AudioBackend>) -> Vec<&'static str> {
    engine.diagnostics().map(|d| d.code).collect()
}

// === Initialization ===

#[test]
fn test_initialize_is_idempotent() {
    let mut engine = SoundEngine::new(OfflineBackend::new(), test_config());
    assert!(!engine.is_initialized());

    engine.initialize();
    engine.initialize();
    engine.initialize();

    assert!(engine.is_initialized());
    assert_eq!(engine.backend().opened(), 1);
    assert_eq!(device(&engine).state(), DeviceState::Suspended);
}

#[test]
fn test_unavailable_device_makes_everything_a_no_op() {
    let mut engine = SoundEngine::new(NoAudioBackend, test_config());

    engine.initialize();
    engine.on_user_gesture();
    engine.load_sound("pickup", "pickup.mp3");
    engine.play_sound("pickup");
    engine.start_background_loop(120.0);
    engine.stop_background_loop();
    engine.play_win_fanfare();
    engine.finish_game(false);
    engine.pump();

    assert!(!engine.is_initialized());
    assert!(engine.background().is_none());
    assert_eq!(engine.active_timer_count(), 0);
    assert_eq!(engine.pending_loads(), 0);
    assert!(engine.library().is_empty());

    let diagnostics: Vec<_> = engine.diagnostics().collect();
    assert!(!diagnostics.is_empty());
    assert!(diagnostics
        .iter()
        .all(|d| d.category == ErrorCategory::DeviceUnavailable));
}

#[test]
fn test_first_gesture_resumes_once() {
    let mut engine = SoundEngine::new(OfflineBackend::new(), test_config());
    // No device yet: nothing to arm
    engine.on_user_gesture();
    assert!(!engine.unlock_armed());

    engine.initialize();
    assert!(engine.unlock_armed());

    engine.on_user_gesture();
    engine.on_user_gesture();

    assert!(!engine.unlock_armed());
    assert_eq!(device(&engine).state(), DeviceState::Running);
    assert_eq!(device(&engine).resume_count(), 1);
}

#[test]
fn test_running_device_is_left_alone_by_gesture() {
    let config = EngineConfig {
        start_suspended: false,
        ..test_config()
    };
    let mut engine = SoundEngine::new(OfflineBackend::new(), config);
    engine.initialize();
    engine.on_user_gesture();

    assert_eq!(device(&engine).state(), DeviceState::Running);
    assert_eq!(device(&engine).resume_count(), 0);
}

// === Samples ===

#[test]
fn test_load_then_play_submits_one_sample_voice() {
    let mut engine = engine_with_sounds();
    engine.initialize();
    engine.load_sound("success", "success.mp3");
    engine.wait_for_loads();

    engine.play_sound("success");

    let submitted = device(&engine).submitted();
    assert_eq!(submitted.len(), 1);
    let voice = submitted[0].as_sample().unwrap();
    assert_eq!(voice.name, "success");
    assert_eq!(voice.output, Output::Destination);
    assert_relative_eq!(voice.buffer.duration_secs(), 0.3, epsilon = 1e-3);
    assert!(Arc::ptr_eq(
        &voice.buffer,
        &engine.library().get("success").unwrap()
    ));
}

#[test]
fn test_play_resumes_suspended_device() {
    let mut engine = engine_with_sounds();
    engine.initialize();
    engine.load_sound("pickup", "pickup.mp3");
    engine.wait_for_loads();

    engine.play_sound("pickup");

    assert_eq!(device(&engine).state(), DeviceState::Running);
}

#[test]
fn test_load_is_write_once() {
    let mut engine = engine_with_sounds();
    engine.initialize();
    engine.load_sound("pickup", "pickup.mp3");
    engine.wait_for_loads();
    let first = engine.library().get("pickup").unwrap();

    // A second load under the same name never replaces the first
    engine.load_sound("pickup", "drop.mp3");
    assert_eq!(engine.pending_loads(), 0);
    engine.wait_for_loads();

    let second = engine.library().get("pickup").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_relative_eq!(second.peak(), 0.5, epsilon = 1e-3);
}

#[test]
fn test_load_before_initialize_is_ignored() {
    let mut engine = engine_with_sounds();
    engine.load_sound("pickup", "pickup.mp3");

    assert_eq!(engine.pending_loads(), 0);
    assert!(engine.diagnostics().next().is_none());
}

#[test]
fn test_missing_sample_is_reported_and_leaves_name_unbound() {
    let mut engine = engine_with_sounds();
    engine.initialize();
    engine.load_sound("fanfare", "nowhere.mp3");
    engine.wait_for_loads();

    assert!(!engine.library().contains("fanfare"));
    assert_eq!(codes(&engine), vec!["SAMPLE_NOT_FOUND"]);

    engine.play_sound("fanfare");
    assert!(device(&engine).submitted().is_empty());
}

#[test]
fn test_undecodable_sample_is_reported() {
    let source = MemorySource::new().with("broken.mp3", b"definitely not audio".to_vec());
    let mut engine =
        SoundEngine::with_source(OfflineBackend::new(), test_config(), Arc::new(source));
    engine.initialize();
    engine.load_sound("broken", "broken.mp3");
    engine.wait_for_loads();

    assert!(!engine.library().contains("broken"));
    let diagnostic = engine.diagnostics().next().unwrap();
    assert_eq!(diagnostic.category, ErrorCategory::LoadFailure);
}

#[test]
fn test_play_unknown_name_is_silent() {
    let mut engine = engine_with_sounds();
    engine.initialize();
    engine.play_sound("missing");

    assert!(device(&engine).submitted().is_empty());
    assert!(engine.diagnostics().next().is_none());
}

#[test]
fn test_pump_applies_finished_loads() {
    let mut engine = engine_with_sounds();
    engine.initialize();
    engine.load_manifest();

    while engine.pending_loads() > 0 {
        std::thread::sleep(std::time::Duration::from_millis(5));
        engine.pump();
    }

    assert_eq!(engine.library().names(), vec!["drop", "pickup", "success"]);
}

#[test]
fn test_cues_play_their_mapped_sounds() {
    let mut engine = engine_with_sounds();
    engine.initialize();
    engine.load_manifest();
    engine.wait_for_loads();

    engine.play_cue(GameCue::DragStart);
    engine.play_cue(GameCue::Drop);
    // "losing" is never loaded
    engine.play_cue(GameCue::Failure);

    let names: Vec<_> = device(&engine)
        .submitted()
        .iter()
        .filter_map(|v| v.as_sample())
        .map(|v| v.name.as_str())
        .collect();
    assert_eq!(names, vec!["pickup", "drop"]);
}

// === Background loop ===

#[test]
fn test_start_submits_pattern_on_own_bus() {
    let mut engine = SoundEngine::new(OfflineBackend::new(), test_config());
    engine.start_background_loop(120.0);

    assert!(engine.is_initialized());
    let state = engine.background().unwrap();
    assert_relative_eq!(state.beat_period_ms(), 500.0);
    assert_eq!(state.repetitions(), 1);

    let device = device(&engine);
    assert_eq!(device.buses_created(), &[(state.bus, 0.06)]);

    let submitted = device.submitted();
    assert_eq!(submitted.len(), 4);
    assert!(submitted.iter().all(|v| v.output() == Output::Bus(state.bus)));

    let waveforms: Vec<_> = submitted
        .iter()
        .map(|v| v.as_tone().unwrap().waveform)
        .collect();
    assert_eq!(
        waveforms,
        vec![
            Waveform::Sine,
            Waveform::Sine,
            Waveform::Sine,
            Waveform::Square
        ]
    );
}

#[test]
fn test_restart_replaces_running_loop() {
    let mut engine = SoundEngine::new(OfflineBackend::new(), test_config());
    engine.start_background_loop(120.0);
    let first_bus = engine.background().unwrap().bus;

    engine.start_background_loop(90.0);

    let state = engine.background().unwrap();
    assert_eq!(state.bpm, 90.0);
    assert_ne!(state.bus, first_bus);
    assert_eq!(engine.active_timer_count(), 1);
    assert!(device(&engine).is_bus_released(first_bus));
    assert!(!device(&engine).is_bus_released(state.bus));
}

#[test]
fn test_loop_fires_on_each_beat() {
    let mut engine = SoundEngine::new(OfflineBackend::new(), test_config());
    engine.on_user_gesture();
    engine.start_background_loop(100.0);

    engine.run_for(1.25);

    let fired = engine.background().unwrap().fired_at.clone();
    assert_eq!(fired.len(), 3);
    for (actual, expected) in fired.iter().zip([0.0, 0.6, 1.2]) {
        assert_relative_eq!(*actual, expected, epsilon = 1e-6);
    }
    assert_eq!(device(&engine).submitted().len(), 12);

    engine.stop_background_loop();
    engine.run_for(2.0);

    assert_eq!(device(&engine).submitted().len(), 12);
    assert_eq!(engine.active_timer_count(), 0);
}

#[test]
fn test_stop_is_safe_to_repeat() {
    let mut engine = SoundEngine::new(OfflineBackend::new(), test_config());
    engine.stop_background_loop();

    engine.start_background_loop(100.0);
    engine.stop_background_loop();
    engine.stop_background_loop();

    assert!(engine.background().is_none());
    assert_eq!(engine.active_timer_count(), 0);
    assert!(engine.diagnostics().next().is_none());
}

#[test]
fn test_stop_lets_current_repetition_finish() {
    let mut engine = SoundEngine::new(OfflineBackend::new(), test_config());
    engine.initialize();
    engine.on_user_gesture();
    engine.start_background_loop(100.0);
    let bus = engine.background().unwrap().bus;

    engine.run_for(0.05);
    engine.stop_background_loop();
    assert!(device(&engine).active_voice_count() > 0);

    engine.run_for(1.0);
    assert_eq!(device(&engine).active_voice_count(), 0);
    assert!(device(&engine).is_bus_released(bus));
    assert_eq!(device(&engine).live_bus_count(), 0);
}

#[test]
fn test_invalid_tempo_keeps_current_loop() {
    let mut engine = SoundEngine::new(OfflineBackend::new(), test_config());
    engine.start_background_loop(120.0);

    engine.start_background_loop(0.0);
    engine.start_background_loop(f64::NAN);

    assert_eq!(engine.background().unwrap().bpm, 120.0);
    assert_eq!(engine.active_timer_count(), 1);
    assert_eq!(codes(&engine), vec!["INVALID_TEMPO", "INVALID_TEMPO"]);
}

#[test]
fn test_tempo_faster_than_one_frame_is_rejected() {
    let mut engine = SoundEngine::new(OfflineBackend::new(), test_config());
    engine.start_background_loop(120.0);

    // At 8 kHz a frame lasts 125 us
    engine.start_background_loop(1.0e6);
    engine.start_background_loop(1.0e12);
    engine.run_for(0.01);

    let state = engine.background().unwrap();
    assert_eq!(state.bpm, 120.0);
    assert_eq!(state.repetitions(), 1);
    assert_eq!(engine.active_timer_count(), 1);
    assert_eq!(device(&engine).buses_created().len(), 1);
    assert_eq!(codes(&engine), vec!["INVALID_TEMPO", "INVALID_TEMPO"]);
}

#[test]
fn test_diagnostics_keep_most_recent_64() {
    let mut engine = SoundEngine::new(OfflineBackend::new(), test_config());
    for i in 1..=65 {
        engine.start_background_loop(-(i as f64));
    }

    assert_eq!(engine.diagnostics().count(), 64);
    let first = engine.diagnostics().next().unwrap();
    assert_eq!(first.message, "Invalid tempo: -2 BPM");
    let last = engine.diagnostics().last().unwrap();
    assert_eq!(last.message, "Invalid tempo: -65 BPM");
}

#[test]
fn test_default_loop_uses_configured_tempo() {
    let config = EngineConfig {
        default_bpm: 150.0,
        ..test_config()
    };
    let mut engine = SoundEngine::new(OfflineBackend::new(), config);
    engine.start_default_background_loop();

    assert_relative_eq!(engine.background().unwrap().beat_period_ms(), 400.0);
}

// === Fanfare ===

#[test]
fn test_fanfare_layers_sweep_and_sparkles() {
    let mut engine = SoundEngine::new(OfflineBackend::new(), test_config());
    engine.initialize();
    engine.run_for(0.5);
    let t0 = device(&engine).current_time();

    engine.play_win_fanfare();

    let device = device(&engine);
    let (master, gain) = device.buses_created()[0];
    assert_relative_eq!(gain, 0.12);
    assert!(device.is_bus_released(master));

    let tones: Vec<_> = device
        .submitted()
        .iter()
        .map(|v| v.as_tone().unwrap())
        .collect();
    assert_eq!(tones.len(), 4);
    assert!(tones.iter().all(|t| t.output == Output::Bus(master)));
    assert!(tones
        .iter()
        .all(|t| (t.stop - (t0 + 1.0)).abs() < 1e-9));

    assert_eq!(tones[0].waveform, Waveform::Sawtooth);
    assert_relative_eq!(tones[0].frequency.value_at(t0 + 0.6), 1760.0, epsilon = 1e-6);

    for (i, sparkle) in tones[1..].iter().enumerate() {
        assert_eq!(sparkle.waveform, Waveform::Triangle);
        assert_relative_eq!(sparkle.start, t0 + 0.08 + 0.06 * i as f64, epsilon = 1e-9);
    }
}

#[test]
fn test_fanfare_renders_and_frees_its_bus() {
    let mut engine = SoundEngine::new(OfflineBackend::new(), test_config());
    engine.on_user_gesture();
    engine.initialize();
    engine.on_user_gesture();
    engine.play_win_fanfare();
    engine.run_for(1.2);

    let device = engine.device_mut().unwrap();
    assert_eq!(device.live_bus_count(), 0);
    let output = device.take_output();
    assert!(output.is_finite());
    assert!(output.peak() > 0.0);
    assert!(output.peak() <= 0.12 * 4.0);
}

#[test]
fn test_finish_game_win_stops_music_and_celebrates() {
    let mut engine = engine_with_sounds();
    engine.initialize();
    engine.load_manifest();
    engine.wait_for_loads();
    engine.start_background_loop(100.0);

    engine.finish_game(true);

    assert!(engine.background().is_none());
    assert_eq!(engine.active_timer_count(), 0);
    let last = device(&engine).submitted().last().unwrap();
    assert_eq!(last.as_sample().unwrap().name, "success");
}

#[test]
fn test_finish_game_loss_skips_fanfare() {
    let mut engine = engine_with_sounds();
    engine.initialize();
    engine.start_background_loop(100.0);
    let before = device(&engine).submitted().len();

    engine.finish_game(false);

    assert!(engine.background().is_none());
    assert_eq!(device(&engine).submitted().len(), before);
    assert_eq!(device(&engine).buses_created().len(), 1);
}
