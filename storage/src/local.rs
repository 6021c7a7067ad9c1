use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use eyre::WrapErr as _;
use futures::StreamExt as _;
use tokio::io::AsyncWriteExt;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::Instrument;

use storage_driver::{ByteStream, Driver, Metadata, StorageError, StorageErrorKind};

const ENGINE: &str = "local";

/// Prefix of in-flight files written by [`LocalDriver::save`]. Never listed.
const TEMP_PREFIX: &str = ".tmp-";

/// Storage driver backed by a directory on the local filesystem.
///
/// Each key maps to a file at `<root>/<key>`.
#[derive(Debug)]
pub struct LocalDriver {
    root: Utf8PathBuf,
}

impl LocalDriver {
    /// Create a driver rooted at `root`. The directory is created lazily.
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    fn path(&self, key: &Utf8Path) -> Result<Utf8PathBuf, StorageError> {
        if key
            .components()
            .any(|c| !matches!(c, Utf8Component::Normal(_)))
        {
            return Err(StorageError::builder(
                ENGINE,
                StorageErrorKind::InvalidRequest,
                format!("key must be a relative path of normal components: {key}"),
            )
            .key(key.as_str())
            .build());
        }
        Ok(self.root.join(key))
    }
}

fn fs_error<'a>(
    key: &'a Utf8Path,
    context: &'static str,
) -> impl FnOnce(std::io::Error) -> StorageError + 'a {
    move |err| {
        let kind = StorageErrorKind::from(err.kind());
        StorageError::builder(ENGINE, kind, eyre::Report::new(err).wrap_err(context))
            .key(key.as_str())
            .build()
    }
}

#[async_trait::async_trait]
impl Driver for LocalDriver {
    fn name(&self) -> &'static str {
        ENGINE
    }

    /// Content is written to a temporary file next to the key and renamed
    /// over it once complete, so a failed save keeps the previous value.
    async fn save(&self, key: &Utf8Path, content: ByteStream) -> Result<(), StorageError> {
        let path = self.path(key)?;
        let parent = path.parent().unwrap_or(&self.root).to_owned();

        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(fs_error(key, "create parent directories"))?;

        let (file, temp) = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(TEMP_PREFIX)
                .tempfile_in(parent)
        })
        .in_current_span()
        .await
        .map_err(StorageError::with(ENGINE, StorageErrorKind::Other))?
        .map_err(fs_error(key, "create temporary file"))?
        .into_parts();

        let mut writer = tokio::io::BufWriter::new(tokio::fs::File::from_std(file));

        let mut reader = StreamReader::new(content);
        tokio::io::copy(&mut reader, &mut writer)
            .await
            .map_err(fs_error(key, "copy content"))?;

        writer
            .shutdown()
            .await
            .map_err(fs_error(key, "shutdown writer"))?;

        tokio::fs::rename(&temp, &path)
            .await
            .map_err(fs_error(key, "move into place"))?;

        // Renamed away; nothing left for the guard to remove.
        let _ = temp.keep();
        Ok(())
    }

    async fn value(&self, key: &Utf8Path) -> Result<ByteStream, StorageError> {
        let path = self.path(key)?;
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(fs_error(key, "open file"))?;
        Ok(ReaderStream::new(file).boxed())
    }

    async fn metadata(&self, key: &Utf8Path) -> Result<Metadata, StorageError> {
        let path = self.path(key)?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(fs_error(key, "metadata"))?;
        if metadata.is_dir() {
            return Err(StorageError::not_found(ENGINE, key.as_str()));
        }

        let created = metadata
            .created()
            .or_else(|_| metadata.modified())
            .map_err(fs_error(key, "created timestamp"))?;

        Ok(Metadata {
            size: metadata.len(),
            created: created.into(),
        })
    }

    async fn list(&self, prefix: &Utf8Path) -> Result<Vec<Utf8PathBuf>, StorageError> {
        let dir = self.path(prefix)?;
        let root = self.root.clone();

        let items = tokio::task::spawn_blocking(move || collect_list(&root, &dir))
            .in_current_span()
            .await
            .map_err(StorageError::with(ENGINE, StorageErrorKind::Other))?
            .map_err(|err| {
                StorageError::builder(ENGINE, StorageErrorKind::Io, err)
                    .key(prefix.as_str())
                    .build()
            })?;

        tracing::debug!("Found {} entries", items.len());
        Ok(items)
    }

    async fn delete(&self, key: &Utf8Path) -> Result<(), StorageError> {
        let path = self.path(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(fs_error(key, "remove file"))?;
        Ok(())
    }
}

#[tracing::instrument]
fn collect_list(root: &Utf8Path, dir: &Utf8Path) -> eyre::Result<Vec<Utf8PathBuf>> {
    let mut files = Vec::new();
    if dir.is_dir() {
        visit(dir, &mut files).wrap_err("walking directory")?;
    }

    let mut keys: Vec<_> = files
        .into_iter()
        .filter_map(|p| p.strip_prefix(root).ok().map(|p| p.to_owned()))
        .collect();
    keys.sort();
    Ok(keys)
}

fn visit(path: &Utf8Path, files: &mut Vec<Utf8PathBuf>) -> eyre::Result<()> {
    for entry in path.read_dir_utf8()? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            visit(entry.path(), files)?;
        } else if !entry.file_name().starts_with(TEMP_PREFIX) {
            files.push(entry.path().to_owned())
        }
    }

    Ok(())
}
