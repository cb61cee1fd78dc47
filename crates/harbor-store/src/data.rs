//! Data store collaborator and registry
//!
//! A `DataStore` holds raw object bytes behind a location-constraint
//! name. The registry maps resolved `dataStoreName`s to live stores and
//! can stream the concatenated bytes for a sequence of location
//! descriptors without buffering whole objects.

use crate::file::FileDataStore;
use crate::types::{ByteStream, DataLocation, PutContext, PutResult};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use futures::{StreamExt, stream};
use harbor_common::{Error, Md5Writer, Result};
use harbor_placement::{BackendConfig, LocationKind};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Raw byte storage behind one location constraint
#[async_trait]
pub trait DataStore: Send + Sync {
    /// The `dataStoreName` this store is registered under
    fn name(&self) -> &str;

    /// Store the body and return the location descriptors plus the MD5
    /// content digest of the bytes written
    async fn put(
        &self,
        ctx: &PutContext,
        body: ByteStream,
        content_length: u64,
    ) -> Result<PutResult>;

    /// Stream the bytes for one location descriptor, honoring its
    /// `start`/`size` range
    async fn get(&self, location: &DataLocation) -> Result<ByteStream>;
}

/// In-memory data store
pub struct MemDataStore {
    name: String,
    chunks: DashMap<String, Bytes>,
}

impl MemDataStore {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chunks: DashMap::new(),
        }
    }
}

#[async_trait]
impl DataStore for MemDataStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(
        &self,
        ctx: &PutContext,
        mut body: ByteStream,
        content_length: u64,
    ) -> Result<PutResult> {
        let mut digest = Md5Writer::new();
        let mut buf = Vec::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            digest.update(&chunk);
            buf.extend_from_slice(&chunk);
        }
        let size = buf.len() as u64;
        if content_length != size {
            warn!(
                bucket = %ctx.bucket,
                key = %ctx.key,
                declared = content_length,
                actual = size,
                "content length mismatch on data write"
            );
        }

        let chunk_key = Uuid::new_v4().to_string();
        self.chunks.insert(chunk_key.clone(), Bytes::from(buf));
        Ok(PutResult {
            locations: vec![DataLocation {
                key: chunk_key,
                data_store_name: self.name.clone(),
                start: 0,
                size,
            }],
            content_md5: digest.finalize(),
        })
    }

    async fn get(&self, location: &DataLocation) -> Result<ByteStream> {
        let data = self
            .chunks
            .get(&location.key)
            .map(|entry| entry.clone())
            .ok_or_else(|| Error::DataLocationNotFound(location.key.clone()))?;

        let start = usize::try_from(location.start)
            .map_err(|_| Error::invalid_argument("location start out of range"))?;
        let end = if location.size == 0 {
            data.len()
        } else {
            start.saturating_add(
                usize::try_from(location.size)
                    .map_err(|_| Error::invalid_argument("location size out of range"))?,
            )
        };
        if start > data.len() || end > data.len() {
            return Err(Error::invalid_argument(format!(
                "location range {}..{} exceeds stored size {}",
                start,
                end,
                data.len()
            )));
        }

        let slice = data.slice(start..end);
        Ok(stream::once(async move { Ok(slice) }).boxed())
    }
}

/// Registry of live data stores keyed by `dataStoreName`
#[derive(Default)]
pub struct DataStoreRegistry {
    stores: HashMap<String, Arc<dyn DataStore>>,
}

impl DataStoreRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a store under its own name
    pub fn register(&mut self, store: Arc<dyn DataStore>) {
        self.stores.insert(store.name().to_string(), store);
    }

    /// Look up a store by name
    pub fn get(&self, name: &str) -> Result<Arc<dyn DataStore>> {
        self.stores
            .get(name)
            .cloned()
            .ok_or_else(|| Error::DataStoreNotFound(name.to_string()))
    }

    /// Build one store per configured location constraint
    pub fn from_backend_config(config: &BackendConfig) -> Result<Self> {
        let mut registry = Self::new();
        for (name, kind) in &config.locations {
            let store: Arc<dyn DataStore> = match kind {
                LocationKind::Mem => Arc::new(MemDataStore::new(name.clone())),
                LocationKind::File { path } => {
                    Arc::new(FileDataStore::new(name.clone(), path)?)
                }
            };
            registry.register(store);
        }
        Ok(registry)
    }

    /// Stream the concatenated bytes for a sequence of location
    /// descriptors, in order.
    ///
    /// Chunks are fetched lazily as the consumer pulls, so an object
    /// split across arbitrarily many locations never has to fit in
    /// memory. A lookup or read failure surfaces as an I/O error at the
    /// point of the failing chunk.
    #[must_use]
    pub fn stream_locations(self: Arc<Self>, locations: Vec<DataLocation>) -> ByteStream {
        let registry = self;
        stream::iter(locations)
            .then(move |location| {
                let registry = Arc::clone(&registry);
                async move {
                    let store = registry.get(&location.data_store_name)?;
                    store.get(&location).await
                }
            })
            .map(|result: Result<ByteStream>| match result {
                Ok(chunk_stream) => chunk_stream,
                Err(err) => stream::once(async move { Err(std::io::Error::other(err)) }).boxed(),
            })
            .flatten()
            .boxed()
    }
}
