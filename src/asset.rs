//! Ownership of the one playable asset a session exposes.
//!
//! Every registered asset gets a handle from an [`AssetStore`]. The
//! [`AssetSlot`] holds at most one of them and releases the old handle before
//! a new one is installed, so repeated generations never accumulate live
//! handles.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::voice::{Emotion, Voice};
use crate::wav::WavAsset;

/// URL-like reference to a registered asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetHandle(String);

impl AssetHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands out and reclaims asset handles.
pub trait AssetStore {
    /// Make `asset` addressable and return its handle.
    fn register(&mut self, asset: &WavAsset) -> AssetHandle;

    /// Free the resources behind `handle`. Unknown handles are ignored.
    fn release(&mut self, handle: &AssetHandle);
}

/// Keeps registered assets in memory under `blob:vocalize/<n>` handles.
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    next_id: u64,
    live: HashMap<AssetHandle, WavAsset>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles not yet released.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn get(&self, handle: &AssetHandle) -> Option<&WavAsset> {
        self.live.get(handle)
    }
}

impl AssetStore for MemoryAssetStore {
    fn register(&mut self, asset: &WavAsset) -> AssetHandle {
        self.next_id += 1;
        let handle = AssetHandle::new(format!("blob:vocalize/{}", self.next_id));
        self.live.insert(handle.clone(), asset.clone());
        handle
    }

    fn release(&mut self, handle: &AssetHandle) {
        if self.live.remove(handle).is_none() {
            log::debug!("Release of unknown asset handle {handle}");
        }
    }
}

/// The current asset together with what produced it.
#[derive(Debug, Clone)]
pub struct CurrentAsset {
    pub handle: AssetHandle,
    pub wav: WavAsset,
    pub voice: Voice,
    pub emotion: Emotion,
    pub created_at: DateTime<Utc>,
}

impl CurrentAsset {
    /// Download name: `{prefix}-{Voice}-{emotion}-{unix millis}.wav`.
    pub fn file_name(&self, prefix: &str) -> String {
        export_file_name(prefix, self.voice, self.emotion, self.created_at.timestamp_millis())
    }

    /// Write the WAV bytes into `dir` under [`file_name`](Self::file_name).
    pub fn export(&self, dir: &Path, prefix: &str) -> Result<PathBuf> {
        let path = dir.join(self.file_name(prefix));
        self.wav.write_to(&path)?;
        log::info!("Exported {} bytes to {}", self.wav.len(), path.display());
        Ok(path)
    }
}

pub fn export_file_name(prefix: &str, voice: Voice, emotion: Emotion, timestamp_ms: i64) -> String {
    format!("{prefix}-{}-{}-{timestamp_ms}.wav", voice.name(), emotion.slug())
}

/// Single-slot owner of the current asset.
#[derive(Debug, Default)]
pub struct AssetSlot {
    current: Option<CurrentAsset>,
}

impl AssetSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&CurrentAsset> {
        self.current.as_ref()
    }

    /// Install `next`, releasing the previous handle first.
    pub fn replace(&mut self, store: &mut dyn AssetStore, next: CurrentAsset) {
        if let Some(prev) = self.current.take() {
            log::debug!("Releasing superseded asset {}", prev.handle);
            store.release(&prev.handle);
        }
        self.current = Some(next);
    }

    /// Release the current asset, if any.
    pub fn clear(&mut self, store: &mut dyn AssetStore) {
        if let Some(prev) = self.current.take() {
            store.release(&prev.handle);
        }
    }
}
