//! Sound Engine
//!
//! Owns the output device, the sample library, the background loop and the
//! win fanfare. Every public operation is infallible from the caller's side:
//! failures are logged and kept as [`Diagnostic`]s, and the worst outcome
//! is silence.
//!
//! # Lifecycle
//! - `initialize()` opens the device on first use; it is never closed.
//! - `on_user_gesture()` is wired by the host to pointer/touch input and
//!   resumes a suspended device once.
//! - `pump()` is called from the host's loop to fire due timers and apply
//!   finished sample loads.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::engine::{AudioBackend, AudioDevice, DeviceState, RenderClock, TimerQueue};
use crate::error::{Diagnostic, SoundError};
use crate::sfx::background::{beat_period_ms, BackgroundLoop};
use crate::sfx::loader::{CompletedLoad, FileSource, SampleLoader, SampleSource};
use crate::sfx::{GameCue, SampleLibrary};
use crate::synth::{patterns, Output, SampleVoice, Voice};

/// Most recent diagnostics kept by the engine
const MAX_DIAGNOSTICS: usize = 64;

pub struct SoundEngine<B: AudioBackend> {
    backend: B,
    config: EngineConfig,
    source: Arc<dyn SampleSource>,
    device: Option<B::Device>,
    unlock_armed: bool,
    library: SampleLibrary,
    loader: SampleLoader,
    timers: TimerQueue,
    background: Option<BackgroundLoop>,
    diagnostics: VecDeque<Diagnostic>,
}

impl<B: AudioBackend> SoundEngine<B> {
    /// Engine reading samples from `config.asset_root`
    pub fn new(backend: B, config: EngineConfig) -> Self {
        let source = Arc::new(FileSource::new(config.asset_root.clone()));
        Self::with_source(backend, config, source)
    }

    pub fn with_source(backend: B, config: EngineConfig, source: Arc<dyn SampleSource>) -> Self {
        Self {
            backend,
            config,
            source,
            device: None,
            unlock_armed: false,
            library: SampleLibrary::new(),
            loader: SampleLoader::new(),
            timers: TimerQueue::new(),
            background: None,
            diagnostics: VecDeque::new(),
        }
    }

    // ========================================================================
    // Initialization
    // ========================================================================

    /// Open the output device if it isn't open yet
    pub fn initialize(&mut self) {
        if self.device.is_some() {
            return;
        }

        match self.backend.open(&self.config.device_settings()) {
            Ok(device) => {
                log::info!(
                    "Sound engine initialized ({} Hz, {})",
                    device.sample_rate(),
                    device.state()
                );
                self.device = Some(device);
                self.unlock_armed = true;
            }
            Err(e) => self.report(e),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.device.is_some()
    }

    /// Host callback for pointer/touch input
    ///
    /// The first gesture after initialization resumes a suspended device;
    /// the hook then disarms itself.
    pub fn on_user_gesture(&mut self) {
        if !self.unlock_armed {
            return;
        }
        self.unlock_armed = false;
        self.resume_if_suspended();
        log::debug!("Audio unlock hook disarmed");
    }

    /// Whether the one-time unlock hook is still waiting for a gesture
    pub fn unlock_armed(&self) -> bool {
        self.unlock_armed
    }

    fn resume_if_suspended(&mut self) {
        let result = match self.device.as_mut() {
            Some(device) if device.state() == DeviceState::Suspended => device.resume(),
            _ => return,
        };
        if let Err(e) = result {
            self.report(e);
        }
    }

    // ========================================================================
    // Samples
    // ========================================================================

    /// Start loading `uri` under `name`; returns immediately
    pub fn load_sound(&mut self, name: &str, uri: &str) {
        let Some(device) = self.device.as_ref() else {
            log::debug!("Ignoring load of '{}': engine not initialized", name);
            return;
        };
        if self.library.contains(name) || self.loader.is_pending(name) {
            log::debug!("Ignoring load of '{}': already loaded or loading", name);
            return;
        }

        let sample_rate = device.sample_rate();
        if let Err(e) = self
            .loader
            .spawn(name, uri, Arc::clone(&self.source), sample_rate)
        {
            self.report(e);
        }
    }

    /// Load every sound listed in the configuration
    pub fn load_manifest(&mut self) {
        let sounds: Vec<(String, String)> = self
            .config
            .sounds
            .iter()
            .map(|(name, uri)| (name.clone(), uri.clone()))
            .collect();
        for (name, uri) in sounds {
            self.load_sound(&name, &uri);
        }
    }

    /// Block until every pending load has been applied
    pub fn wait_for_loads(&mut self) {
        let done = self.loader.wait_all();
        self.apply_loads(done);
    }

    pub fn pending_loads(&self) -> usize {
        self.loader.pending_count()
    }

    fn apply_loads(&mut self, done: Vec<CompletedLoad>) {
        for load in done {
            match load.result {
                Ok(buffer) => {
                    let duration = buffer.duration_secs();
                    if self.library.insert(&load.name, buffer) {
                        log::info!(
                            "Loaded sound '{}' from {} ({:.2}s)",
                            load.name,
                            load.uri,
                            duration
                        );
                    }
                }
                Err(e) => self.report(e),
            }
        }
    }

    /// Play a loaded sample once; unknown names are ignored
    pub fn play_sound(&mut self, name: &str) {
        if self.device.is_none() {
            return;
        }
        let Some(buffer) = self.library.get(name) else {
            log::debug!("No sample bound to '{}'", name);
            return;
        };

        self.resume_if_suspended();
        if let Some(device) = self.device.as_mut() {
            let start = device.current_time();
            device.submit(Voice::Sample(SampleVoice {
                name: name.to_string(),
                buffer,
                start,
                output: Output::Destination,
            }));
        }
    }

    /// Play the sound configured for a game cue
    pub fn play_cue(&mut self, cue: GameCue) {
        let name = self.config.cues.sound_for(cue).to_string();
        self.play_sound(&name);
    }

    // ========================================================================
    // Background loop
    // ========================================================================

    /// Start the background loop at the configured default tempo
    pub fn start_default_background_loop(&mut self) {
        self.start_background_loop(self.config.default_bpm);
    }

    /// Replace any running loop with a new one at `bpm`
    pub fn start_background_loop(&mut self, bpm: f64) {
        if !bpm.is_finite() || bpm <= 0.0 {
            self.report(SoundError::InvalidTempo { bpm });
            return;
        }

        self.initialize();
        let Some(sample_rate) = self.device.as_ref().map(|d| d.sample_rate()) else {
            return;
        };
        // A beat must span at least one device frame
        let period_secs = beat_period_ms(bpm) / 1000.0;
        if period_secs < 1.0 / sample_rate as f64 {
            self.report(SoundError::InvalidTempo { bpm });
            return;
        }
        self.stop_background_loop();

        let gain = self.config.background_gain;
        let Some(device) = self.device.as_mut() else {
            return;
        };
        let bus = device.create_bus(gain);
        let timer = self.timers.set_interval(device.current_time(), period_secs);

        log::info!(
            "Background loop started: {} BPM ({:.1} ms/beat)",
            bpm,
            period_secs * 1000.0
        );
        self.background = Some(BackgroundLoop::new(timer, bus, bpm));
        self.fire_background_pattern();
    }

    /// Stop the background loop; safe to call when none is running
    ///
    /// Voices of the current repetition play out.
    pub fn stop_background_loop(&mut self) {
        let Some(state) = self.background.take() else {
            return;
        };

        self.timers.clear(state.timer);
        if let Some(device) = self.device.as_mut() {
            if let Err(e) = device.release_bus(state.bus) {
                log::debug!("Ignoring bus release failure: {}", e);
            }
        }
        log::info!(
            "Background loop stopped after {} repetitions",
            state.repetitions()
        );
    }

    fn fire_background_pattern(&mut self) {
        let (Some(device), Some(state)) = (self.device.as_mut(), self.background.as_mut()) else {
            return;
        };

        let t0 = device.current_time();
        for voice in patterns::background_pattern(t0, Output::Bus(state.bus)) {
            device.submit(voice.into());
        }
        state.fired_at.push(t0);
    }

    pub fn background(&self) -> Option<&BackgroundLoop> {
        self.background.as_ref()
    }

    pub fn active_timer_count(&self) -> usize {
        self.timers.active_count()
    }

    // ========================================================================
    // Fanfare
    // ========================================================================

    /// Layered rising sweep and sparkle chimes
    pub fn play_win_fanfare(&mut self) {
        self.initialize();
        let gain = self.config.fanfare_gain;
        let Some(device) = self.device.as_mut() else {
            return;
        };

        let t0 = device.current_time();
        let master = device.create_bus(gain);
        for voice in patterns::win_fanfare(t0, Output::Bus(master)) {
            device.submit(voice.into());
        }
        // Freed by the device once the fanfare has played
        if let Err(e) = device.release_bus(master) {
            log::debug!("Ignoring bus release failure: {}", e);
        }
    }

    /// End of a round: stop the music, then celebrate or commiserate
    pub fn finish_game(&mut self, won: bool) {
        self.stop_background_loop();
        if won {
            self.play_win_fanfare();
            self.play_cue(GameCue::Success);
        } else {
            self.play_cue(GameCue::Failure);
        }
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    /// Apply finished loads and fire timers due at the current device time
    pub fn pump(&mut self) {
        let done = self.loader.take_finished();
        self.apply_loads(done);

        if let Some(now) = self.device.as_ref().map(|d| d.current_time()) {
            self.fire_timers(now);
        }
    }

    fn fire_timers(&mut self, now: f64) {
        for firing in self.timers.take_due(now) {
            if self.background.as_ref().map(|b| b.timer) == Some(firing.timer) {
                self.fire_background_pattern();
            }
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn device(&self) -> Option<&B::Device> {
        self.device.as_ref()
    }

    pub fn device_mut(&mut self) -> Option<&mut B::Device> {
        self.device.as_mut()
    }

    pub fn library(&self) -> &SampleLibrary {
        &self.library
    }

    /// Recorded failures, oldest first
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    fn report(&mut self, err: SoundError) {
        let diagnostic = Diagnostic::from(&err);
        log::error!("{}", diagnostic);
        if self.diagnostics.len() == MAX_DIAGNOSTICS {
            self.diagnostics.pop_front();
        }
        self.diagnostics.push_back(diagnostic);
    }
}

impl<B> SoundEngine<B>
where
    B: AudioBackend,
    B::Device: RenderClock,
{
    /// Advance a caller-clocked device by `secs`, firing every timer
    /// exactly at its deadline
    pub fn run_for(&mut self, secs: f64) {
        let Some(start) = self.device.as_ref().map(|d| d.current_time()) else {
            return;
        };
        let target = start + secs.max(0.0);

        while let Some(due) = self.timers.next_due() {
            if due > target {
                break;
            }
            let Some(device) = self.device.as_mut() else {
                return;
            };
            device.advance_to(due);
            // Frame rounding may leave the clock a hair short of `due`
            let now = device.current_time().max(due);
            let done = self.loader.take_finished();
            self.apply_loads(done);
            self.fire_timers(now);
        }

        if let Some(device) = self.device.as_mut() {
            device.advance_to(target);
        }
        self.pump();
    }
}
