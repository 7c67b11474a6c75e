//! Playback surface and the per-frame loops driven while audio plays.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crate::asset::AssetHandle;
use crate::config::AnalyserConfig;
use crate::error::{Result, VocalizeError};
use crate::spectrum::{SignalSource, SpectrumSampler};
use crate::sync::SyncLoop;
use crate::timing::Timeline;
use crate::wav::WavAsset;

/// Read-only view of the playhead, in seconds.
pub trait PlaybackClock {
    fn current_time(&self) -> f64;
}

/// An addressable audio element.
pub trait PlaybackSurface: PlaybackClock {
    /// Point the element at a new asset. Playback position resets to 0.
    fn load(&mut self, handle: &AssetHandle, asset: &WavAsset) -> Result<()>;

    /// Start playing. An error means the platform refused to start, e.g. an
    /// autoplay policy; the loaded asset stays valid.
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    fn set_current_time(&mut self, secs: f64);

    fn set_playback_rate(&mut self, rate: f64);

    fn is_paused(&self) -> bool;

    fn has_ended(&self) -> bool;

    /// Live signal for the analyser, if the surface can provide one.
    fn tap(&self) -> Option<Arc<dyn SignalSource>>;
}

/// Lifecycle notifications from a playback surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Play,
    Pause,
    Ended,
    Stop,
}

/// Outcome of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Frames run since the last start.
    pub frame: u64,
    pub current_time: f64,
    pub active: Option<usize>,
    pub active_changed: bool,
}

/// The sync and spectrum loops, registered together while playing.
///
/// `frame` is a no-op that does not touch the clock unless the loops are
/// registered; `stop` deregisters both and clears their output.
#[derive(Debug)]
pub struct FrameScheduler {
    running: bool,
    frames: u64,
    sync: SyncLoop,
    spectrum: SpectrumSampler,
}

impl FrameScheduler {
    pub fn new(analyser: AnalyserConfig) -> Result<Self> {
        Ok(Self {
            running: false,
            frames: 0,
            sync: SyncLoop::new(),
            spectrum: SpectrumSampler::new(analyser)?,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        if !self.running {
            log::debug!("Frame loops registered");
        }
        self.running = true;
        self.frames = 0;
    }

    /// Deregister both loops. Returns true if an active token was cleared.
    pub fn stop(&mut self) -> bool {
        if self.running {
            log::debug!("Frame loops cancelled after {} frames", self.frames);
        }
        self.running = false;
        self.spectrum.clear();
        self.sync.reset()
    }

    /// Apply a lifecycle event.
    pub fn on_event(&mut self, event: PlaybackEvent) -> bool {
        match event {
            PlaybackEvent::Play => {
                self.start();
                false
            }
            PlaybackEvent::Pause | PlaybackEvent::Ended | PlaybackEvent::Stop => self.stop(),
        }
    }

    /// Run both loops once.
    pub fn frame(&mut self, timeline: &Timeline, clock: &dyn PlaybackClock) -> Option<FrameReport> {
        if !self.running {
            return None;
        }
        let current_time = clock.current_time();
        let active_changed = self.sync.tick(timeline, current_time);
        self.spectrum.sample();
        self.frames += 1;

        Some(FrameReport {
            frame: self.frames,
            current_time,
            active: self.sync.active(),
            active_changed,
        })
    }

    pub fn active(&self) -> Option<usize> {
        self.sync.active()
    }

    /// Latest spectrum frame.
    pub fn spectrum(&self) -> &[u8] {
        self.spectrum.frame()
    }

    /// Connect the analyser to a signal, once per scheduler.
    pub fn attach(&mut self, source: Arc<dyn SignalSource>) -> bool {
        self.spectrum.attach(source)
    }

    pub fn is_attached(&self) -> bool {
        self.spectrum.is_connected()
    }
}

#[derive(Debug)]
struct Transport {
    samples: Arc<[f32]>,
    sample_rate: u32,
    duration: f64,
    /// Playhead when `anchor` was taken, or the paused position.
    position: f64,
    anchor: Option<Instant>,
    rate: f64,
    handle: Option<AssetHandle>,
}

impl Transport {
    fn current_time(&self) -> f64 {
        match self.anchor {
            Some(anchor) => (self.position + anchor.elapsed().as_secs_f64() * self.rate).min(self.duration),
            None => self.position,
        }
    }

    fn has_ended(&self) -> bool {
        self.handle.is_some() && self.current_time() >= self.duration
    }

    /// Fold elapsed time into `position` and restart the anchor if playing.
    fn rebase(&mut self) {
        self.position = self.current_time();
        if self.anchor.is_some() {
            self.anchor = Some(Instant::now());
        }
    }
}

/// A device-free playback surface.
///
/// Keeps the decoded samples in memory and advances a monotonic clock scaled
/// by the playback rate. Its [`tap`](PlaybackSurface::tap) exposes the samples
/// just behind the playhead.
#[derive(Debug, Clone)]
pub struct HeadlessPlayer {
    transport: Arc<Mutex<Transport>>,
}

impl Default for HeadlessPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPlayer {
    pub fn new() -> Self {
        Self {
            transport: Arc::new(Mutex::new(Transport {
                samples: Arc::from(Vec::new()),
                sample_rate: 0,
                duration: 0.0,
                position: 0.0,
                anchor: None,
                rate: 1.0,
                handle: None,
            })),
        }
    }

    fn with_transport<T>(&self, f: impl FnOnce(&mut Transport) -> T) -> T {
        let mut guard = self.transport.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Handle of the loaded asset.
    pub fn source(&self) -> Option<AssetHandle> {
        self.with_transport(|t| t.handle.clone())
    }

    pub fn duration(&self) -> f64 {
        self.with_transport(|t| t.duration)
    }
}

impl PlaybackClock for HeadlessPlayer {
    fn current_time(&self) -> f64 {
        self.with_transport(|t| t.current_time())
    }
}

impl PlaybackSurface for HeadlessPlayer {
    fn load(&mut self, handle: &AssetHandle, asset: &WavAsset) -> Result<()> {
        let samples = asset.samples()?;
        let sample_rate = asset.format().sample_rate;
        self.with_transport(|t| {
            t.duration = if sample_rate == 0 {
                0.0
            } else {
                samples.len() as f64 / f64::from(sample_rate)
            };
            t.samples = Arc::from(samples);
            t.sample_rate = sample_rate;
            t.position = 0.0;
            t.anchor = None;
            t.handle = Some(handle.clone());
        });
        log::debug!("Loaded {handle} into headless player");
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.with_transport(|t| {
            if t.handle.is_none() {
                return Err(VocalizeError::Playback("no source loaded".to_string()));
            }
            if t.has_ended() {
                t.position = 0.0;
            }
            if t.anchor.is_none() {
                t.anchor = Some(Instant::now());
            }
            Ok(())
        })
    }

    fn pause(&mut self) {
        self.with_transport(|t| {
            t.position = t.current_time();
            t.anchor = None;
        });
    }

    fn set_current_time(&mut self, secs: f64) {
        self.with_transport(|t| {
            t.position = if secs.is_finite() { secs.clamp(0.0, t.duration) } else { 0.0 };
            if t.anchor.is_some() {
                t.anchor = Some(Instant::now());
            }
        });
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.with_transport(|t| {
            t.rebase();
            t.rate = rate;
        });
    }

    fn is_paused(&self) -> bool {
        self.with_transport(|t| t.anchor.is_none() || t.has_ended())
    }

    fn has_ended(&self) -> bool {
        self.with_transport(|t| t.has_ended())
    }

    fn tap(&self) -> Option<Arc<dyn SignalSource>> {
        Some(Arc::new(PlayheadTap {
            transport: Arc::clone(&self.transport),
        }))
    }
}

/// Samples just behind the headless playhead.
struct PlayheadTap {
    transport: Arc<Mutex<Transport>>,
}

impl SignalSource for PlayheadTap {
    fn read_time_domain(&self, out: &mut [f32]) -> bool {
        let t = self.transport.lock().unwrap_or_else(PoisonError::into_inner);
        if t.handle.is_none() || t.samples.is_empty() {
            return false;
        }
        let end = ((t.current_time() * f64::from(t.sample_rate)) as usize).min(t.samples.len());
        let start = end.saturating_sub(out.len());
        let available = &t.samples[start..end];
        let pad = out.len() - available.len();
        out[..pad].fill(0.0);
        out[pad..].copy_from_slice(available);
        true
    }
}
