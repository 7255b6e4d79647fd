//! Lazy, restartable record collections.
//!
//! A [`Data`] never holds a live stream. It holds a factory that opens a
//! fresh one, so every call to [`Data::stream`] starts from the beginning:
//! iterating an uncached collection three times issues three requests and
//! yields the same sequence each time.
//!
//! With caching enabled the first complete, error-free pass is stored and
//! later passes replay the stored items without calling the factory again.
//!
//! # Example
//!
//! ```ignore
//! use provider_stream::data::Data;
//!
//! let data = Data::from_vec(vec![1, 2, 3, 4]).filter(|n| n % 2 == 0).map(|n| n * 10);
//! assert_eq!(data.collect().await?, vec![20, 40]);
//! ```

mod metadata;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt, TryStreamExt};

use crate::error::ProviderResult;
use crate::stream::ErrorLog;

pub use metadata::{MetaValue, Metadata, META_ERRORS, META_URLS};

/// Opens a fresh record stream on every call.
pub type Factory<T> = Arc<dyn Fn() -> BoxStream<'static, ProviderResult<T>> + Send + Sync>;

type Slot<T> = Arc<Mutex<Option<Arc<Vec<T>>>>>;

/// A lazily evaluated, restartable sequence of records.
///
/// Clones share the factory and the cache slot but carry their own
/// metadata.
pub struct Data<T> {
    factory: Factory<T>,
    cache: bool,
    materialized: Slot<T>,
    metadata: Metadata,
}

impl<T> Clone for Data<T> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            cache: self.cache,
            materialized: Arc::clone(&self.materialized),
            metadata: self.metadata.clone(),
        }
    }
}

impl<T> Data<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Wrap a stream factory. The factory is not called here.
    pub fn new<F, S>(factory: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Stream<Item = ProviderResult<T>> + Send + 'static,
    {
        Self {
            factory: Arc::new(move || factory().boxed()),
            cache: false,
            materialized: Arc::new(Mutex::new(None)),
            metadata: Metadata::new(),
        }
    }

    /// A collection over fixed items.
    pub fn from_vec(items: Vec<T>) -> Self {
        let items = Arc::new(items);
        Self::new(move || replay(Arc::clone(&items)))
    }

    /// Enable or disable materializing the first complete pass.
    pub fn use_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    pub fn is_cache_enabled(&self) -> bool {
        self.cache
    }

    /// Whether a pass has been stored.
    pub fn is_materialized(&self) -> bool {
        self.slot().is_some()
    }

    /// Start a pass over the collection.
    ///
    /// Errors from the factory's stream surface here, while iterating, never
    /// at construction. Dropping the returned stream early drops the
    /// factory's stream with it.
    pub fn stream(&self) -> BoxStream<'static, ProviderResult<T>> {
        if !self.cache {
            return (self.factory)();
        }
        if let Some(items) = self.slot().clone() {
            return replay(items);
        }
        fill((self.factory)(), Arc::clone(&self.materialized))
    }

    /// Drain one pass into a `Vec`, stopping at the first error.
    pub async fn collect(&self) -> ProviderResult<Vec<T>> {
        self.stream().try_collect().await
    }

    /// Enable caching and force the materializing pass now.
    pub async fn materialize(&mut self) -> ProviderResult<()> {
        self.cache = true;
        if self.is_materialized() {
            return Ok(());
        }
        let mut pass = self.stream();
        while let Some(item) = pass.next().await {
            item?;
        }
        Ok(())
    }

    /// Forget the stored pass; the next iteration calls the factory again.
    pub fn clear_cache(&self) {
        *self.slot() = None;
    }

    /// Number of records. Performs a full pass unless materialized.
    pub async fn len(&self) -> ProviderResult<usize> {
        if let Some(items) = self.slot().as_ref() {
            return Ok(items.len());
        }
        self.stream().try_fold(0, |n, _| async move { Ok(n + 1) }).await
    }

    /// Whether the collection yields nothing. Reads at most one record.
    pub async fn is_empty(&self) -> ProviderResult<bool> {
        match self.stream().next().await {
            None => Ok(true),
            Some(Ok(_)) => Ok(false),
            Some(Err(e)) => Err(e),
        }
    }

    /// Derive a collection by transforming each pass as a whole.
    ///
    /// The derived collection reads through this one, including its cache,
    /// and starts with a copy of its metadata.
    pub fn map_stream<U, F>(&self, transform: F) -> Data<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(BoxStream<'static, ProviderResult<T>>) -> BoxStream<'static, ProviderResult<U>>
            + Send
            + Sync
            + 'static,
    {
        let parent = self.clone();
        let mut derived: Data<U> = Data::new(move || transform(parent.stream()));
        derived.metadata = self.metadata.clone();
        derived
    }

    /// Apply `f` to every record.
    pub fn map<U, F>(&self, f: F) -> Data<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.map_stream(move |pass| {
            let f = Arc::clone(&f);
            pass.map(move |item| item.map(|value| f(value))).boxed()
        })
    }

    /// Keep records matching `predicate`. Errors always pass through.
    pub fn filter<F>(&self, predicate: F) -> Data<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        self.map_stream(move |pass| {
            let predicate = Arc::clone(&predicate);
            pass.filter(move |item| {
                let keep = match item {
                    Ok(value) => predicate(value),
                    Err(_) => true,
                };
                futures::future::ready(keep)
            })
            .boxed()
        })
    }

    /// At most the first `n` records; the rest of the source is never read.
    pub fn limit(&self, n: usize) -> Data<T> {
        self.map_stream(move |pass| pass.take(n).boxed())
    }

    /// This collection followed by `other`. `other` is opened only once this
    /// one is exhausted.
    pub fn chain(&self, other: &Data<T>) -> Data<T> {
        let parts = [self.clone(), other.clone()];
        let mut chained = Data::new(move || stream::iter(parts.clone()).flat_map(|part| part.stream()));
        chained.metadata = self.metadata.clone();
        chained
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.set_metadata(key, value);
        self
    }

    /// URLs recorded by the command that built this collection.
    pub fn urls(&self) -> Option<&[String]> {
        self.metadata.get(META_URLS).and_then(MetaValue::as_urls)
    }

    /// Interactive-mode stream errors, if the collection records them.
    pub fn errors(&self) -> Option<&ErrorLog> {
        self.metadata.get(META_ERRORS).and_then(MetaValue::as_errors)
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<Vec<T>>>> {
        self.materialized.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> fmt::Debug for Data<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let materialized = self
            .materialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|items| items.len());
        f.debug_struct("Data")
            .field("cache", &self.cache)
            .field("materialized", &materialized)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

fn replay<T>(items: Arc<Vec<T>>) -> BoxStream<'static, ProviderResult<T>>
where
    T: Clone + Send + Sync + 'static,
{
    stream::iter((0..items.len()).map(move |i| Ok(items[i].clone()))).boxed()
}

struct Fill<T> {
    inner: BoxStream<'static, ProviderResult<T>>,
    items: Vec<T>,
    slot: Slot<T>,
    failed: bool,
}

/// Pass records through while recording them; store the list if the pass
/// ends without an error.
fn fill<T>(inner: BoxStream<'static, ProviderResult<T>>, slot: Slot<T>) -> BoxStream<'static, ProviderResult<T>>
where
    T: Clone + Send + Sync + 'static,
{
    let state = Fill {
        inner,
        items: Vec::new(),
        slot,
        failed: false,
    };

    stream::unfold(state, |mut state| async move {
        match state.inner.next().await {
            Some(Ok(item)) => {
                state.items.push(item.clone());
                Some((Ok(item), state))
            }
            Some(Err(e)) => {
                state.failed = true;
                Some((Err(e), state))
            }
            None => {
                if !state.failed {
                    let mut slot = state.slot.lock().unwrap_or_else(PoisonError::into_inner);
                    if slot.is_none() {
                        tracing::debug!("Materialized {} records", state.items.len());
                        *slot = Some(Arc::new(std::mem::take(&mut state.items)));
                    }
                }
                None
            }
        }
    })
    .boxed()
}
