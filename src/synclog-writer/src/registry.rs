use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use crate::{SynchronizedWriter, WriterError, WriterOptions};

/// Hands out at most one [`SynchronizedWriter`] per file.
///
/// Two writers on the same file would each keep their own counter and
/// file offset and overwrite each other's records. The registry is
/// owned by whoever starts the logging session and passed around
/// explicitly; there is no process-wide instance.
#[derive(Debug, Default)]
pub struct WriterRegistry {
    options: WriterOptions,
    writers: Mutex<HashMap<PathBuf, Arc<SynchronizedWriter>>>,
}

impl WriterRegistry {
    /// Creates an empty registry using default [`WriterOptions`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry whose writers use `options`.
    pub fn with_options(options: WriterOptions) -> Self {
        Self {
            options,
            writers: Mutex::default(),
        }
    }

    /// Gets the writer for `path`, creating the file on first use.
    ///
    /// Paths are compared in canonical form, so `..` components and
    /// symbolic links lead to the same writer as the file they name.
    /// Concurrent calls are serialized, so only one of them ever creates
    /// the file. A writer stays registered after it was closed and is
    /// returned as-is.
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<Arc<SynchronizedWriter>, WriterError> {
        let path = path.as_ref();
        let key = canonical_key(path).map_err(|source| WriterError::Resource {
            target: path.display().to_string(),
            source,
        })?;

        let mut writers = self.writers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(writer) = writers.get(&key) {
            return Ok(Arc::clone(writer));
        }

        let writer = Arc::new(SynchronizedWriter::create_with(&key, self.options)?);
        writers.insert(key, Arc::clone(&writer));

        Ok(writer)
    }

    /// Gets the number of files with a registered writer.
    pub fn len(&self) -> usize {
        self.writers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no writer was created yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes every writer handed out so far.
    ///
    /// All writers are closed even when some of them fail; the first
    /// failure is returned and the rest are logged.
    pub fn close_all(&self) -> Result<(), WriterError> {
        let writers = self.writers.lock().unwrap_or_else(PoisonError::into_inner);

        let mut first = None;
        for writer in writers.values() {
            if let Err(e) = writer.close() {
                if first.is_none() {
                    first = Some(e);
                } else {
                    log::error!("{e}");
                }
            }
        }

        first.map_or(Ok(()), Err)
    }
}

/// Resolves the path a writer for `path` is registered under.
///
/// The file itself may not exist yet, in which case only its parent
/// directory is resolved.
fn canonical_key(path: &Path) -> io::Result<PathBuf> {
    if let Ok(key) = fs::canonicalize(path) {
        return Ok(key);
    }

    let name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path does not name a file")
    })?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    Ok(fs::canonicalize(parent)?.join(name))
}
