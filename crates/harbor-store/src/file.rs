//! File-backed data store
//!
//! One file per stored chunk under the configured root directory.
//! Ranged reads honor the `start`/`size` of the location descriptor; a
//! write aborted mid-stream removes its partial file.

use crate::data::DataStore;
use crate::types::{ByteStream, DataLocation, PutContext, PutResult};
use async_trait::async_trait;
use futures::StreamExt;
use harbor_common::{Error, Md5Writer, Result};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio_util::io::ReaderStream;
use tracing::warn;
use uuid::Uuid;

/// Local filesystem data store
pub struct FileDataStore {
    name: String,
    root: PathBuf,
}

impl FileDataStore {
    /// Create the store, making sure the root directory exists
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            name: name.into(),
            root,
        })
    }

    /// Chunk keys are generated UUIDs; anything path-like is rejected
    /// rather than resolved
    fn chunk_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(Error::invalid_argument(format!(
                "invalid chunk key: {key}"
            )));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl DataStore for FileDataStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(
        &self,
        ctx: &PutContext,
        mut body: ByteStream,
        content_length: u64,
    ) -> Result<PutResult> {
        let chunk_key = Uuid::new_v4().to_string();
        let path = self.root.join(&chunk_key);
        let mut file = fs::File::create(&path).await?;

        let mut digest = Md5Writer::new();
        let write_result: Result<()> = async {
            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                digest.update(&chunk);
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            file.sync_all().await?;
            Ok(())
        }
        .await;

        if let Err(err) = write_result {
            // Aborted stream or disk error: drop the partial chunk
            if let Err(cleanup_err) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %cleanup_err, "failed to remove partial chunk");
            }
            return Err(err);
        }

        let size = digest.bytes_written();
        if content_length != size {
            warn!(
                bucket = %ctx.bucket,
                key = %ctx.key,
                declared = content_length,
                actual = size,
                "content length mismatch on data write"
            );
        }

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
        let path = self.chunk_path(&location.key)?;
        let mut file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::DataLocationNotFound(location.key.clone()));
            }
            Err(err) => return Err(err.into()),
        };

        let len = file.metadata().await?.len();
        let size = if location.size == 0 {
            len.checked_sub(location.start).ok_or_else(|| {
                Error::invalid_argument(format!(
                    "location start {} exceeds stored size {len}",
                    location.start
                ))
            })?
        } else {
            location.size
        };
        if location.start.saturating_add(size) > len {
            return Err(Error::invalid_argument(format!(
                "location range {}..{} exceeds stored size {len}",
                location.start,
                location.start + size
            )));
        }

        file.seek(SeekFrom::Start(location.start)).await?;
        Ok(ReaderStream::new(file.take(size)).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;

    fn body(bytes: &'static [u8]) -> ByteStream {
        stream::once(async move { Ok(Bytes::from_static(bytes)) }).boxed()
    }

    async fn collect(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_file_put_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDataStore::new("file", dir.path()).unwrap();
        let ctx = PutContext::new("b1", "k1");

        let result = store.put(&ctx, body(b"file backed bytes"), 17).await.unwrap();
        assert_eq!(
            result.content_md5,
            hex::encode(md5::compute(b"file backed bytes").0)
        );

        let bytes = collect(store.get(&result.locations[0]).await.unwrap()).await;
        assert_eq!(bytes, b"file backed bytes");
    }

    #[tokio::test]
    async fn test_file_ranged_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDataStore::new("file", dir.path()).unwrap();
        let ctx = PutContext::new("b1", "k1");
        let result = store.put(&ctx, body(b"0123456789"), 10).await.unwrap();

        let mut location = result.locations[0].clone();
        location.start = 3;
        location.size = 4;
        let bytes = collect(store.get(&location).await.unwrap()).await;
        assert_eq!(bytes, b"3456");

        location.start = 9;
        location.size = 5;
        assert!(store.get(&location).await.is_err());
    }

    #[tokio::test]
    async fn test_file_missing_location() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDataStore::new("file", dir.path()).unwrap();
        let location = DataLocation {
            key: Uuid::new_v4().to_string(),
            data_store_name: "file".to_string(),
            start: 0,
            size: 0,
        };
        assert!(matches!(
            store.get(&location).await.err().unwrap(),
            Error::DataLocationNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_aborted_write_removes_partial_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDataStore::new("file", dir.path()).unwrap();
        let ctx = PutContext::new("b1", "k1");

        let aborted: ByteStream = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::other("client went away")),
        ])
        .boxed();
        assert!(store.put(&ctx, aborted, 100).await.is_err());

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(entries.is_empty(), "partial chunk left behind: {entries:?}");
    }

    #[tokio::test]
    async fn test_path_like_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDataStore::new("file", dir.path()).unwrap();
        for key in ["../escape", "a/b", ""] {
            let location = DataLocation {
                key: key.to_string(),
                data_store_name: "file".to_string(),
                start: 0,
                size: 0,
            };
            assert!(store.get(&location).await.is_err(), "key {key:?} accepted");
        }
    }
}
