//! CLI Command Implementations
//!
//! Every command renders through the offline device and writes a WAV file.

use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{info, warn};

use crate::config::EngineConfig;
use crate::engine::{export_wav, ExportFormat, OfflineBackend};
use crate::sfx::{GameCue, SoundEngine};
use crate::synth::patterns::FANFARE_LENGTH;

/// Extra render time so the last voices ring out
const TAIL_SECS: f64 = 0.8;

/// Seconds between scripted pickups in a session
const CUE_SPACING_SECS: f64 = 0.8;

/// Load the configuration file, or the built-in defaults
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to read config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn start_engine(config: EngineConfig) -> Result<SoundEngine<OfflineBackend>> {
    let mut engine = SoundEngine::new(OfflineBackend::new(), config);
    engine.initialize();
    if !engine.is_initialized() {
        bail!("audio device could not be opened");
    }
    // Rendering counts as the user's first gesture
    engine.on_user_gesture();
    Ok(engine)
}

fn write_output(engine: &mut SoundEngine<OfflineBackend>, out: &Path) -> Result<()> {
    for diagnostic in engine.diagnostics() {
        warn!("{}", diagnostic);
    }
    let device = engine
        .device_mut()
        .context("audio device disappeared during rendering")?;
    let buffer = device.take_output();
    export_wav(&buffer, out, ExportFormat::default())
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!(
        "Wrote {:.2}s to {} (peak {:.1} dBFS)",
        buffer.duration_secs(),
        out.display(),
        buffer.peak_db()
    );
    Ok(())
}

/// Render `seconds` of the background loop.
pub fn render_loop(config: EngineConfig, bpm: Option<f64>, seconds: f64, out: &Path) -> Result<()> {
    let bpm = bpm.unwrap_or(config.default_bpm);
    info!("Rendering {:.1}s of background loop at {} BPM", seconds, bpm);

    let mut engine = start_engine(config)?;
    engine.start_background_loop(bpm);
    if engine.background().is_none() {
        bail!("background loop did not start (tempo {})", bpm);
    }
    engine.run_for(seconds);
    engine.stop_background_loop();
    engine.run_for(TAIL_SECS);

    write_output(&mut engine, out)
}

/// Render the win fanfare on its own.
pub fn render_fanfare(config: EngineConfig, out: &Path) -> Result<()> {
    info!("Rendering win fanfare");

    let mut engine = start_engine(config)?;
    engine.play_win_fanfare();
    engine.run_for(FANFARE_LENGTH + TAIL_SECS);

    write_output(&mut engine, out)
}

/// Render a scripted round: music, alternating pickups and drops, then a win.
pub fn render_session(config: EngineConfig, seconds: f64, out: &Path) -> Result<()> {
    info!("Rendering {:.1}s session", seconds);

    let mut engine = start_engine(config)?;
    engine.load_manifest();
    engine.wait_for_loads();
    info!("Loaded sounds: {:?}", engine.library().names());

    engine.start_default_background_loop();

    let mut elapsed = 0.0;
    let mut picked_up = false;
    while elapsed + CUE_SPACING_SECS <= seconds {
        engine.run_for(CUE_SPACING_SECS);
        elapsed += CUE_SPACING_SECS;
        let cue = if picked_up {
            GameCue::Drop
        } else {
            GameCue::DragStart
        };
        engine.play_cue(cue);
        picked_up = !picked_up;
    }
    engine.run_for(seconds - elapsed);

    engine.finish_game(true);
    engine.run_for(FANFARE_LENGTH + TAIL_SECS);

    write_output(&mut engine, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_config(asset_root: &Path) -> EngineConfig {
        EngineConfig {
            sample_rate: 8000,
            asset_root: asset_root.to_path_buf(),
            ..EngineConfig::default()
        }
    }

    fn read_wav(path: &Path) -> (hound::WavSpec, Vec<i16>) {
        let mut reader = hound::WavReader::open(path).unwrap();
        let samples = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        (reader.spec(), samples)
    }

    #[test]
    fn test_render_fanfare_writes_wav() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("fanfare.wav");

        render_fanfare(test_config(dir.path()), &out).unwrap();

        let (spec, samples) = read_wav(&out);
        assert_eq!(spec.sample_rate, 8000);
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.bits_per_sample, 16);
        // 1.8 s of stereo frames
        assert_eq!(samples.len(), 14400 * 2);
        assert!(samples.iter().any(|&s| s != 0));
    }

    #[test]
    fn test_render_loop_rejects_bad_tempo() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("loop.wav");

        assert!(render_loop(test_config(dir.path()), Some(0.0), 1.0, &out).is_err());
        assert!(render_loop(test_config(dir.path()), Some(1.0e12), 1.0, &out).is_err());
        assert!(!out.exists());
    }

    #[test]
    fn test_render_loop_writes_requested_length() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("loop.wav");

        render_loop(test_config(dir.path()), Some(120.0), 1.0, &out).unwrap();

        let (_, samples) = read_wav(&out);
        // 1.0 s of loop plus the ring-out tail
        assert_eq!(samples.len(), 14400 * 2);
        assert!(samples.iter().any(|&s| s != 0));
    }

    #[test]
    fn test_render_session_survives_missing_samples() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("session.wav");

        render_session(test_config(dir.path()), 2.0, &out).unwrap();

        let (_, samples) = read_wav(&out);
        let frames = samples.len() as i64 / 2;
        assert!((frames - 30400).abs() <= 1);
    }
}
