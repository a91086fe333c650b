//! Batch dispatch of removal jobs over a bounded worker pool.
//!
//! Each [`WorkItem`] is processed in isolation: one malformed image produces a
//! [`BatchMessage::Failed`] for its id and never affects the others. Messages
//! arrive in completion order, not submission order.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use image::RgbaImage;
use rayon::prelude::*;

use crate::engine::WatermarkEngine;

/// Caller-assigned identifier correlating a work item with its result.
pub type ItemId = u64;

/// A single image submitted for removal.
#[derive(Debug, Clone)]
pub struct WorkItem {
    /// Correlation id.
    pub id: ItemId,
    /// The image to clean. Ownership moves to the worker.
    pub image: RgbaImage,
}

/// Result of one work item.
#[derive(Debug, Clone)]
pub enum BatchMessage {
    /// The watermark was removed.
    Completed {
        /// Correlation id.
        id: ItemId,
        /// The cleaned image.
        image: RgbaImage,
        /// `(width, height)` of the input.
        original_dimensions: (u32, u32),
    },
    /// The item could not be processed.
    Failed {
        /// Correlation id.
        id: ItemId,
        /// Human-readable reason.
        message: String,
    },
}

impl BatchMessage {
    /// Correlation id of the item this message belongs to.
    #[must_use]
    pub fn id(&self) -> ItemId {
        match self {
            Self::Completed { id, .. } | Self::Failed { id, .. } => *id,
        }
    }

    /// Whether the item succeeded.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Run the engine on a single work item.
#[must_use]
pub fn process_item(engine: &WatermarkEngine, item: WorkItem) -> BatchMessage {
    let WorkItem { id, image } = item;
    let original_dimensions = image.dimensions();

    match engine.remove(image) {
        Ok(image) => {
            tracing::debug!(id, "batch item completed");
            BatchMessage::Completed {
                id,
                image,
                original_dimensions,
            }
        }
        Err(e) => {
            tracing::warn!(id, error = %e, "batch item failed");
            BatchMessage::Failed {
                id,
                message: e.to_string(),
            }
        }
    }
}

/// Process a batch in parallel on the global rayon pool.
///
/// Results are returned in submission order.
#[must_use]
pub fn process_batch(engine: &WatermarkEngine, items: Vec<WorkItem>) -> Vec<BatchMessage> {
    items
        .into_par_iter()
        .map(|item| process_item(engine, item))
        .collect()
}

/// A bounded pool of workers that consumes work items and reports results on
/// a channel.
///
/// Dropping the receiver returned by [`submit`](Self::submit) abandons any
/// pending results; workers finish their current image and discard the output.
pub struct WorkerPool {
    engine: Arc<WatermarkEngine>,
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// Build a pool with at most `workers` threads (at least one).
    ///
    /// # Errors
    ///
    /// Returns an error if the operating system refuses to spawn threads.
    pub fn new(
        engine: Arc<WatermarkEngine>,
        workers: usize,
    ) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("watermark-worker-{i}"))
            .build()?;
        Ok(Self { engine, pool })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Queue items for processing and return the channel their results arrive on.
    ///
    /// The channel yields exactly one message per item, then disconnects once
    /// every item has been handled.
    pub fn submit<I>(&self, items: I) -> Receiver<BatchMessage>
    where
        I: IntoIterator<Item = WorkItem>,
    {
        let (tx, rx) = mpsc::channel();
        for item in items {
            let engine = Arc::clone(&self.engine);
            let tx = tx.clone();
            self.pool.spawn(move || {
                let id = item.id;
                if tx.send(process_item(&engine, item)).is_err() {
                    tracing::debug!(id, "result receiver dropped, discarding output");
                }
            });
        }
        rx
    }
}
