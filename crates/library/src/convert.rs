use crate::error::{ErrorKind, Result};
use crate::{Library, MAX_CONVERT_CONCURRENCY};
use async_stream::stream;
use exn::ResultExt;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;

/// Progress events emitted by [`Library::convert`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) exactly once, with the number of keys.
/// 2. [`Skipped`](Self::Skipped) or [`Converted`](Self::Converted) once per
///    key, in completion order. A key that fails is reported as an `Err`
///    item instead and the stream carries on.
/// 3. [`Complete`](Self::Complete) exactly once, last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertEvent {
    Started(u64),
    /// The handbook was already persisted; nothing was extracted.
    Skipped(String),
    /// The handbook was materialized and persisted.
    Converted { key: String, chars: usize },
    Complete,
}

impl Library {
    /// Materialize and persist every handbook in `keys`, skipping those
    /// already in the store.
    ///
    /// Up to [`MAX_CONVERT_CONCURRENCY`] handbooks are in flight at once.
    /// Conversions go through the same cache as [`handbook`](Self::handbook)
    /// requests, so a concurrent request for the same key never triggers a
    /// second extraction.
    pub fn convert<I>(&self, keys: I) -> impl Stream<Item = Result<ConvertEvent>> + '_
    where
        I: IntoIterator<Item = String>,
    {
        let keys: Vec<String> = keys.into_iter().collect();
        // `rustfmt` does not format macros that use braces. Wrap in parentheses!
        stream!({
            yield Ok(ConvertEvent::Started(keys.len() as u64));

            let mut pending: VecDeque<_> = keys.into_iter().map(|key| self.convert_one(key)).collect();
            let mut processing = FuturesUnordered::new();
            processing.extend(pending.drain(..MAX_CONVERT_CONCURRENCY.min(pending.len())));
            while let Some(result) = processing.next().await {
                yield result;
                if let Some(next) = pending.pop_front() {
                    processing.push(next);
                }
            }

            yield Ok(ConvertEvent::Complete);
        })
    }

    #[tracing::instrument(skip(self))]
    async fn convert_one(&self, key: String) -> Result<ConvertEvent> {
        self.entry(&key)?;
        let stored = self
            .store
            .has(&key)
            .await
            .or_raise(|| ErrorKind::Storage)
            .or_raise(|| ErrorKind::Unavailable(key.clone()))?;
        if stored {
            tracing::info!("Already converted");
            return Ok(ConvertEvent::Skipped(key));
        }
        let text = self.handbook(&key).await?;
        // Materializing persists best-effort only, and the text may have
        // come from memory. Converted means stored.
        if !self.store.has(&key).await.unwrap_or(false) {
            self.store
                .write(&key, &text)
                .await
                .or_raise(|| ErrorKind::Storage)
                .or_raise(|| ErrorKind::Unavailable(key.clone()))?;
        }
        Ok(ConvertEvent::Converted { key, chars: text.chars().count() })
    }
}
