use crate::buffer::ResourceBuffer;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// Errors raised by a [`Resource`] when it cannot accept new contents.
#[derive(Error, Debug)]
pub enum CommitError {
    /// The resource does not accept writes.
    #[error("Resource '{0}' is read-only")]
    ReadOnly(String),

    /// Writing the new contents to storage failed.
    #[error("Resource I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The staged contents could not be moved over the original.
    #[error("Failed to replace resource file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// An addressable binary object whose bytes can be searched and replaced.
///
/// The resource owns its buffer. Callers borrow it mutably for the whole
/// plan-apply-commit cycle, so at most one request runs against it at a time.
pub trait Resource {
    /// A stable, human-readable identifier (e.g. a path), used in logs and events.
    fn id(&self) -> &str;

    /// The current, authoritative contents.
    fn data(&self) -> &[u8];

    /// Replaces the contents with `buffer`.
    ///
    /// Called by the engine once per applied request, after the mutator has built the
    /// complete output. Implementations must make the switch atomic: either `buffer`
    /// becomes the authoritative contents, or nothing changes.
    ///
    /// # Arguments
    /// * `buffer`: The new contents. The resource takes ownership.
    ///
    /// # Returns
    /// `Ok(())` once `buffer` is authoritative, or a `CommitError` if it could not be stored.
    /// On error `data()` must still return the previous contents, and any backing storage
    /// must be left as it was.
    fn commit(&mut self, buffer: ResourceBuffer) -> Result<(), CommitError>;
}

/// A resource held entirely in memory.
#[derive(Debug, Clone)]
pub struct InMemoryResource {
    id: String,
    buffer: ResourceBuffer,
    read_only: bool,
}

impl InMemoryResource {
    pub fn new(id: impl Into<String>, bytes: impl Into<ResourceBuffer>) -> Self {
        Self {
            id: id.into(),
            buffer: bytes.into(),
            read_only: false,
        }
    }

    /// Marks the resource so that every commit is rejected.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn buffer(&self) -> &ResourceBuffer {
        &self.buffer
    }
}

impl Resource for InMemoryResource {
    fn id(&self) -> &str {
        &self.id
    }

    fn data(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    fn commit(&mut self, buffer: ResourceBuffer) -> Result<(), CommitError> {
        if self.read_only {
            return Err(CommitError::ReadOnly(self.id.clone()));
        }
        self.buffer = buffer;
        Ok(())
    }
}

/// A resource backed by a file on disk.
///
/// Commits are staged in a temporary file next to the target and then renamed over
/// it, so the original file is either fully replaced or left as it was.
#[derive(Debug)]
pub struct FileResource {
    path: PathBuf,
    id: String,
    buffer: ResourceBuffer,
    backup: bool,
}

impl FileResource {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, std::io::Error> {
        let path = path.into();
        let bytes = fs::read(&path)?;
        debug!(path = %path.display(), len = bytes.len(), "Loaded file resource");
        Ok(Self {
            id: path.display().to_string(),
            path,
            buffer: ResourceBuffer::new(bytes),
            backup: false,
        })
    }

    /// When enabled, the previous contents are copied to `<file>.bak` before each commit.
    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".bak");
        self.path.with_file_name(name)
    }

    fn stage(&self, bytes: &[u8]) -> Result<NamedTempFile, CommitError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(bytes)?;
        staged.flush()?;
        let permissions = fs::metadata(&self.path)?.permissions();
        staged.as_file().set_permissions(permissions)?;
        staged.as_file().sync_all()?;
        Ok(staged)
    }
}

impl Resource for FileResource {
    fn id(&self) -> &str {
        &self.id
    }

    fn data(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    fn commit(&mut self, buffer: ResourceBuffer) -> Result<(), CommitError> {
        let staged = self.stage(buffer.as_bytes())?;
        if self.backup {
            let backup_path = self.backup_path();
            fs::copy(&self.path, &backup_path)?;
            debug!(backup = %backup_path.display(), "Wrote backup");
        }
        staged.persist(&self.path)?;
        self.buffer = buffer;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_commit_replaces_contents() {
        let mut resource = InMemoryResource::new("mem", b"abc".to_vec());
        resource
            .commit(ResourceBuffer::from(b"xyz".to_vec()))
            .unwrap();
        assert_eq!(resource.data(), b"xyz");
        assert_eq!(resource.buffer(), &ResourceBuffer::from(b"xyz".to_vec()));
        assert_eq!(resource.id(), "mem");
    }

    #[test]
    fn read_only_resource_rejects_commit_and_keeps_contents() {
        let mut resource = InMemoryResource::new("rom", b"abc".to_vec()).read_only();
        let err = resource
            .commit(ResourceBuffer::from(b"xyz".to_vec()))
            .unwrap_err();
        assert!(matches!(err, CommitError::ReadOnly(ref id) if id == "rom"));
        assert_eq!(resource.data(), b"abc");
    }

    #[test]
    fn file_resource_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.bin");
        fs::write(&path, b"\x7fELF hello").unwrap();

        let mut resource = FileResource::open(&path).unwrap();
        assert_eq!(resource.data(), b"\x7fELF hello");
        assert_eq!(resource.path(), path.as_path());

        resource
            .commit(ResourceBuffer::from(b"\x7fELF bye".to_vec()))
            .unwrap();
        assert_eq!(resource.data(), b"\x7fELF bye");
        assert_eq!(fs::read(&path).unwrap(), b"\x7fELF bye");
        assert!(!resource.backup_path().exists());
    }

    #[test]
    fn file_resource_writes_backup_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fw.img");
        fs::write(&path, b"original").unwrap();

        let mut resource = FileResource::open(&path).unwrap().with_backup(true);
        resource
            .commit(ResourceBuffer::from(b"patched".to_vec()))
            .unwrap();

        assert_eq!(resource.backup_path(), dir.path().join("fw.img.bak"));
        assert_eq!(fs::read(resource.backup_path()).unwrap(), b"original");
        assert_eq!(fs::read(&path).unwrap(), b"patched");
    }

    #[test]
    fn failed_backup_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fw.bin");
        fs::write(&path, b"foobarfoo").unwrap();
        // A directory where the backup file should go makes the copy fail.
        fs::create_dir(dir.path().join("fw.bin.bak")).unwrap();

        let mut resource = FileResource::open(&path).unwrap().with_backup(true);
        let err = resource
            .commit(ResourceBuffer::from(b"XbarX".to_vec()))
            .unwrap_err();

        assert!(matches!(err, CommitError::Io(_)));
        assert_eq!(resource.data(), b"foobarfoo");
        assert_eq!(fs::read(&path).unwrap(), b"foobarfoo");

        let mut entries: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        entries.sort();
        assert_eq!(entries, vec!["fw.bin".to_string(), "fw.bin.bak".to_string()]);
    }

    #[test]
    fn opening_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileResource::open(dir.path().join("missing.bin")).is_err());
    }
}
