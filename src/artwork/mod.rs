//! Local artwork lookup on a background thread.
//!
//! The engine sends [`ArtworkRequest`]s through a bounded channel and drains
//! [`ArtworkResolved`] messages on its own thread. The worker only reads the
//! filesystem; it never sees engine state.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError, bounded};

use crate::core::errors::{Result, TvdError};
use crate::store::Item;

const CHANNEL_CAPACITY: usize = 256;
const EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Directory-safe form of an item name: alphanumerics, space, `-` and `_`
/// kept, trimmed, spaces turned into underscores.
#[must_use]
pub fn safe_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .replace(' ', "_")
}

/// Find artwork for `item` under `assets_dir`.
///
/// Order: `<safe>/banner.<ext>`, `<safe>/<safe>.<ext>`, the item's icon,
/// then its executable path. Only existing files are returned.
#[must_use]
pub fn resolve_artwork(assets_dir: &Path, item: &Item) -> Option<PathBuf> {
    let safe = safe_name(&item.name);
    if !safe.is_empty() {
        let folder = assets_dir.join(&safe);
        for stem in ["banner", safe.as_str()] {
            for ext in EXTENSIONS {
                let candidate = folder.join(format!("{stem}.{ext}"));
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
    }
    item.icon
        .as_deref()
        .map(PathBuf::from)
        .filter(|p| p.is_file())
        .or_else(|| Some(PathBuf::from(&item.path)).filter(|p| p.is_file()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtworkRequest {
    Resolve { index: usize, item: Item },
    Shutdown,
}

/// Lookup result, tagged with the index and name it was requested for so a
/// stale answer can be recognized after the store changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkResolved {
    pub index: usize,
    pub name: String,
    pub artwork: Option<PathBuf>,
}

/// Handle to the worker thread. Dropping it stops the worker.
pub struct ArtworkWorker {
    tx: Sender<ArtworkRequest>,
    rx: Receiver<ArtworkResolved>,
    dropped: Arc<AtomicU64>,
    join: Option<thread::JoinHandle<()>>,
}

impl std::fmt::Debug for ArtworkWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtworkWorker")
            .field("dropped", &self.dropped_requests())
            .finish_non_exhaustive()
    }
}

impl ArtworkWorker {
    /// Start the worker for `assets_dir`.
    pub fn spawn(assets_dir: PathBuf) -> Result<Self> {
        let (tx, request_rx) = bounded::<ArtworkRequest>(CHANNEL_CAPACITY);
        let (result_tx, rx) = bounded::<ArtworkResolved>(CHANNEL_CAPACITY);
        let join = thread::Builder::new()
            .name("tvdeck-artwork".to_string())
            .spawn(move || worker_main(&assets_dir, &request_rx, &result_tx))
            .map_err(|e| TvdError::Runtime {
                details: format!("failed to spawn artwork worker: {e}"),
            })?;
        Ok(Self {
            tx,
            rx,
            dropped: Arc::new(AtomicU64::new(0)),
            join: Some(join),
        })
    }

    /// Queue a lookup without blocking. Returns false if it was dropped.
    pub fn request(&self, index: usize, item: &Item) -> bool {
        match self.tx.try_send(ArtworkRequest::Resolve {
            index,
            item: item.clone(),
        }) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Collect every finished lookup without blocking.
    pub fn drain(&self) -> Vec<ArtworkResolved> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(resolved) => out.push(resolved),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        out
    }

    /// Block until one result arrives or the worker exits.
    pub fn recv(&self) -> Result<ArtworkResolved> {
        self.rx.recv().map_err(|_| TvdError::ChannelClosed {
            component: "artwork",
        })
    }

    #[must_use]
    pub fn dropped_requests(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop the worker and wait for it.
    pub fn shutdown(&mut self) {
        let _ = self.tx.send(ArtworkRequest::Shutdown);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                tracing::warn!("artwork worker panicked");
            }
        }
    }
}

impl Drop for ArtworkWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_main(assets_dir: &Path, rx: &Receiver<ArtworkRequest>, tx: &Sender<ArtworkResolved>) {
    while let Ok(request) = rx.recv() {
        let ArtworkRequest::Resolve { index, item } = request else {
            break;
        };
        let artwork = resolve_artwork(assets_dir, &item);
        tracing::trace!(name = %item.name, ?artwork, "artwork resolved");
        let resolved = ArtworkResolved {
            index,
            name: item.name,
            artwork,
        };
        if tx.send(resolved).is_err() {
            break;
        }
    }
}
