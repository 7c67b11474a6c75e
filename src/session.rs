//! One listening session: generation pipeline plus playback state.
//!
//! Generation runs provider -> decode -> WAV -> timing as a single sequential
//! step. Requests are not queued; a new one stops current playback and, once
//! it succeeds, supersedes the previous asset and timeline wholesale.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;

use crate::asset::{AssetSlot, AssetStore, CurrentAsset};
use crate::config::{clamp_speed, SessionConfig};
use crate::error::{Result, VocalizeError};
use crate::playback::{FrameReport, FrameScheduler, PlaybackEvent, PlaybackSurface};
use crate::timing::{TextToken, Timeline};
use crate::voice::{Emotion, Voice};
use crate::wav::WavAsset;
use crate::{SpeechProvider, SpeechRequest};

/// How a generation request finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Audio is ready and playing.
    Playing,
    /// Audio is ready but playback did not start (autoplay off or refused).
    Ready,
    /// Blank text; nothing was requested.
    Skipped,
}

pub struct Session<P: SpeechProvider, S: PlaybackSurface, A: AssetStore> {
    provider: P,
    surface: S,
    store: A,
    config: SessionConfig,
    slot: AssetSlot,
    timeline: Timeline,
    scheduler: FrameScheduler,
    last_error: Option<String>,
}

impl<P: SpeechProvider, S: PlaybackSurface, A: AssetStore> Session<P, S, A> {
    pub fn new(provider: P, surface: S, store: A, mut config: SessionConfig) -> Result<Self> {
        config.validate()?;
        config.speed = clamp_speed(config.speed);
        let scheduler = FrameScheduler::new(config.analyser.clone())?;

        Ok(Self {
            provider,
            surface,
            store,
            config,
            slot: AssetSlot::new(),
            timeline: Timeline::default(),
            scheduler,
            last_error: None,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn store(&self) -> &A {
        &self.store
    }

    pub fn set_voice(&mut self, voice: Voice) {
        self.config.voice = voice;
    }

    pub fn set_emotion(&mut self, emotion: Emotion) {
        self.config.emotion = emotion;
    }

    /// Change the playback rate. Returns the rate actually applied.
    pub fn set_speed(&mut self, speed: f64) -> f64 {
        self.config.speed = clamp_speed(speed);
        self.surface.set_playback_rate(self.config.speed);
        self.config.speed
    }

    /// Latest user-facing error, replaced by each failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn tokens(&self) -> &[TextToken] {
        self.timeline.tokens()
    }

    pub fn active_token_id(&self) -> Option<usize> {
        self.scheduler.active()
    }

    pub fn active_token(&self) -> Option<&TextToken> {
        let id = self.scheduler.active()?;
        self.timeline.tokens().get(id)
    }

    /// Latest spectrum frame.
    pub fn spectrum(&self) -> &[u8] {
        self.scheduler.spectrum()
    }

    pub fn current_asset(&self) -> Option<&CurrentAsset> {
        self.slot.current()
    }

    pub fn has_generated_audio(&self) -> bool {
        self.slot.current().is_some()
    }

    /// Whether the frame loops are registered.
    pub fn is_playing(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Synthesize `text` with the configured voice and emotion.
    ///
    /// Failures are recorded in [`last_error`](Self::last_error) and returned;
    /// the previous asset, if any, stays current.
    pub fn generate(&mut self, text: &str) -> Result<GenerationOutcome> {
        if text.trim().is_empty() {
            log::debug!("Skipping generation for blank text");
            return Ok(GenerationOutcome::Skipped);
        }

        self.last_error = None;
        if let Err(e) = self.provider.check_credentials() {
            return Err(self.record_failure(e));
        }
        self.stop();
        self.connect_analyser();

        self.run_generation(text).map_err(|e| self.record_failure(e))
    }

    fn record_failure(&mut self, e: VocalizeError) -> VocalizeError {
        let message = e.user_message();
        log::error!("Generation failed: {message}");
        self.last_error = Some(message);
        e
    }

    fn run_generation(&mut self, text: &str) -> Result<GenerationOutcome> {
        let request = SpeechRequest::new(text, self.config.voice, self.config.emotion);
        let started = Instant::now();

        let pcm = self.provider.synthesize_pcm(&request, self.config.pcm)?;
        let wav = WavAsset::from_pcm(&pcm)?;
        let timeline = Timeline::estimate(text, pcm.duration_secs());

        let handle = self.store.register(&wav);
        if let Err(e) = self.surface.load(&handle, &wav) {
            self.store.release(&handle);
            return Err(e);
        }

        log::info!(
            "Generated {:.2}s of audio ({} words) in {:.2?}",
            wav.duration_secs(),
            timeline.word_count(),
            started.elapsed()
        );

        self.slot.replace(
            &mut self.store,
            CurrentAsset {
                handle,
                wav,
                voice: request.voice,
                emotion: request.emotion,
                created_at: Utc::now(),
            },
        );
        self.timeline = timeline;
        self.surface.set_playback_rate(self.config.speed);

        if !self.config.autoplay {
            return Ok(GenerationOutcome::Ready);
        }
        match self.surface.play() {
            Ok(()) => {
                self.scheduler.on_event(PlaybackEvent::Play);
                Ok(GenerationOutcome::Playing)
            }
            Err(e) => {
                log::warn!("Autoplay blocked: {e}");
                Ok(GenerationOutcome::Ready)
            }
        }
    }

    /// Play the current asset from the start.
    pub fn replay(&mut self) -> Result<()> {
        if self.slot.current().is_none() {
            return Err(VocalizeError::NoAsset);
        }
        self.connect_analyser();
        self.surface.set_current_time(0.0);
        self.surface.set_playback_rate(self.config.speed);
        match self.surface.play() {
            Ok(()) => {
                self.scheduler.on_event(PlaybackEvent::Play);
                Ok(())
            }
            Err(e) => {
                log::error!("Playback failed: {e}");
                Err(e)
            }
        }
    }

    /// Pause, rewind and cancel the frame loops.
    pub fn stop(&mut self) {
        self.surface.pause();
        self.surface.set_current_time(0.0);
        self.scheduler.on_event(PlaybackEvent::Stop);
    }

    /// Forward a lifecycle event from an event-driven surface.
    pub fn on_event(&mut self, event: PlaybackEvent) -> bool {
        self.scheduler.on_event(event)
    }

    /// Run one display frame. Returns `None` once playback is not active.
    pub fn frame(&mut self) -> Option<FrameReport> {
        if !self.scheduler.is_running() {
            return None;
        }
        if self.surface.has_ended() {
            self.scheduler.on_event(PlaybackEvent::Ended);
            return None;
        }
        if self.surface.is_paused() {
            self.scheduler.on_event(PlaybackEvent::Pause);
            return None;
        }
        self.scheduler.frame(&self.timeline, &self.surface)
    }

    /// Write the current asset into `dir` under its download name.
    pub fn export(&self, dir: &Path) -> Result<PathBuf> {
        let current = self.slot.current().ok_or(VocalizeError::NoAsset)?;
        current.export(dir, &self.config.file_prefix)
    }

    /// Download name of the current asset.
    pub fn export_file_name(&self) -> Option<String> {
        self.slot
            .current()
            .map(|c| c.file_name(&self.config.file_prefix))
    }

    fn connect_analyser(&mut self) {
        if self.scheduler.is_attached() {
            return;
        }
        if let Some(tap) = self.surface.tap() {
            self.scheduler.attach(tap);
        }
    }
}

impl<P: SpeechProvider, S: PlaybackSurface, A: AssetStore> Drop for Session<P, S, A> {
    fn drop(&mut self) {
        self.slot.clear(&mut self.store);
    }
}
