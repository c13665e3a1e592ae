//! File sink with hourly and size-triggered rotation.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracelog_core::LogError;
use tracing::debug;

use super::Sink;

/// Something the rotation scheduler can drive.
pub trait Rotate: Send + Sync {
    fn rotate(&self) -> Result<(), LogError>;

    /// Record the wall-clock time of the next scheduled rotation.
    fn arm(&self, _deadline: DateTime<Utc>) {}
}

/// Active file, bytes written since the last rotation and the armed
/// deadline. Every mutation goes through the sink's mutex, so scheduled
/// and manual rotations serialize with writes.
///
/// `size_trigger_held` is set when a size-triggered rotation fails; the
/// cap is not retried until a scheduled or manual rotation succeeds.
#[derive(Debug)]
struct RotationState {
    file: Option<File>,
    size: u64,
    next_rotation: Option<DateTime<Utc>>,
    rotations: u64,
    size_trigger_held: bool,
}

#[derive(Debug)]
pub struct RotatingFileSink {
    path: PathBuf,
    max_bytes: u64,
    state: Mutex<RotationState>,
}

impl RotatingFileSink {
    /// Open (or create) `path` for appending, creating parent directories.
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64) -> Result<Self, LogError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| LogError::Open {
                path: path.clone(),
                source,
            })?;
        }
        let file = open_append(&path).map_err(|source| LogError::Open {
            path: path.clone(),
            source,
        })?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);
        debug!(path = %path.display(), size, max_bytes, "Opened rotating log file");

        Ok(Self {
            path,
            max_bytes,
            state: Mutex::new(RotationState {
                file: Some(file),
                size,
                next_rotation: None,
                rotations: 0,
                size_trigger_held: false,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Bytes written to the active file.
    pub fn size(&self) -> u64 {
        self.lock().size
    }

    /// Successful rotations since the sink was opened.
    pub fn rotations(&self) -> u64 {
        self.lock().rotations
    }

    pub fn next_rotation(&self) -> Option<DateTime<Utc>> {
        self.lock().next_rotation
    }

    /// Whether the size cap is suspended after a failed early rotation.
    pub fn size_trigger_held(&self) -> bool {
        self.lock().size_trigger_held
    }

    fn lock(&self) -> MutexGuard<'_, RotationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Close the active file, move it aside and open a fresh one.
    ///
    /// When the rename fails the original file is reopened so writing can
    /// continue, and the error is returned.
    fn rotate_locked(&self, state: &mut RotationState) -> Result<(), LogError> {
        if let Some(mut file) = state.file.take() {
            let _ = file.flush();
        }

        let target = rotated_file_name(&self.path, Utc::now());
        let target = disambiguate(target);
        if let Err(source) = fs::rename(&self.path, &target) {
            state.file = open_append(&self.path).ok();
            if let Some(file) = &state.file {
                state.size = file.metadata().map(|m| m.len()).unwrap_or(state.size);
            }
            return Err(LogError::Rotation {
                path: self.path.clone(),
                source,
            });
        }

        let file = open_append(&self.path).map_err(|source| LogError::Rotation {
            path: self.path.clone(),
            source,
        })?;
        state.file = Some(file);
        state.size = 0;
        state.rotations += 1;
        state.size_trigger_held = false;
        debug!(path = %self.path.display(), rotated_to = %target.display(), "Rotated log file");
        Ok(())
    }
}

impl Rotate for RotatingFileSink {
    fn rotate(&self) -> Result<(), LogError> {
        let mut state = self.lock();
        self.rotate_locked(&mut state)
    }

    fn arm(&self, deadline: DateTime<Utc>) {
        self.lock().next_rotation = Some(deadline);
    }
}

impl Sink for RotatingFileSink {
    fn name(&self) -> &str {
        "rotating-file"
    }

    /// Rotates first when the write would push a non-empty file past the
    /// cap. If that early rotation fails the record is still written to
    /// the current file, the rotation error is returned once, and the cap
    /// stays suspended until the next successful rotation.
    fn write(&self, line: &[u8]) -> io::Result<()> {
        let mut state = self.lock();
        let len = line.len() as u64;

        let mut early_failure = None;
        if !state.size_trigger_held && state.size > 0 && state.size + len > self.max_bytes {
            if let Err(e) = self.rotate_locked(&mut state) {
                state.size_trigger_held = true;
                early_failure = Some(e);
            }
        }

        if state.file.is_none() {
            state.file = Some(open_append(&self.path)?);
        }
        if let Some(file) = state.file.as_mut() {
            file.write_all(line)?;
        }
        state.size += len;

        match early_failure {
            Some(e) => Err(io::Error::other(e)),
            None => Ok(()),
        }
    }

    fn flush(&self) -> io::Result<()> {
        match self.lock().file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// All rotating files of one logger, rotated together.
#[derive(Default)]
pub struct RotatingFiles(Vec<Arc<RotatingFileSink>>);

impl RotatingFiles {
    pub fn new(files: Vec<Arc<RotatingFileSink>>) -> Self {
        Self(files)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RotatingFileSink>> {
        self.0.iter()
    }
}

impl Rotate for RotatingFiles {
    /// Rotates every file; returns the last failure, if any.
    fn rotate(&self) -> Result<(), LogError> {
        let mut result = Ok(());
        for file in &self.0 {
            if let Err(e) = file.rotate() {
                result = Err(e);
            }
        }
        result
    }

    fn arm(&self, deadline: DateTime<Utc>) {
        for file in &self.0 {
            file.arm(deadline);
        }
    }
}

/// `dir/name.ext` → `dir/name-2024-05-01T13-59-59.000.ext`.
pub fn rotated_file_name(path: &Path, at: DateTime<Utc>) -> PathBuf {
    let stamp = at.format("%Y-%m-%dT%H-%M-%S%.3f");
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("log");
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}-{stamp}.{ext}"),
        None => format!("{stem}-{stamp}"),
    };
    path.with_file_name(name)
}

fn disambiguate(candidate: PathBuf) -> PathBuf {
    if !candidate.exists() {
        return candidate;
    }
    let stem = candidate
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("log")
        .to_string();
    let ext = candidate.extension().and_then(|e| e.to_str()).map(str::to_owned);
    (1u32..)
        .map(|n| {
            let name = match &ext {
                Some(ext) => format!("{stem}-{n}.{ext}"),
                None => format!("{stem}-{n}"),
            };
            candidate.with_file_name(name)
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// The rotation failure carried by a [`RotatingFileSink::write`] error.
pub fn rotation_error(err: &io::Error) -> Option<&LogError> {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<LogError>())
        .filter(|e| matches!(e, LogError::Rotation { .. }))
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
