//! Output destinations.
//!
//! A sink receives already-encoded lines. Sinks never see or mutate the
//! record itself.

mod memory;
mod rotating;
mod stdout;

use std::io;
use std::sync::Arc;

use tracelog_config::SinkAddress;
use tracelog_core::LogError;

pub use memory::MemorySink;
pub use rotating::{RotatingFileSink, RotatingFiles, Rotate, rotated_file_name, rotation_error};
pub use stdout::{ConsoleSink, DiscardSink};

pub trait Sink: Send + Sync {
    /// Name used in failure reports.
    fn name(&self) -> &str;

    /// Write one encoded record.
    fn write(&self, line: &[u8]) -> io::Result<()>;

    fn flush(&self) -> io::Result<()>;
}

/// A sink resolved from its address. Rotating files are also returned
/// by concrete type so the scheduler can drive them.
pub struct ResolvedSink {
    pub sink: Arc<dyn Sink>,
    pub rotating: Option<Arc<RotatingFileSink>>,
}

/// Map an address to a write capability. Opens rotating files eagerly.
pub fn resolve(address: &SinkAddress, max_file_bytes: u64) -> Result<ResolvedSink, LogError> {
    let resolved = match address {
        SinkAddress::Stdout => ResolvedSink {
            sink: Arc::new(ConsoleSink::stdout()),
            rotating: None,
        },
        SinkAddress::Stderr => ResolvedSink {
            sink: Arc::new(ConsoleSink::stderr()),
            rotating: None,
        },
        SinkAddress::Discard => ResolvedSink {
            sink: Arc::new(DiscardSink),
            rotating: None,
        },
        SinkAddress::RotatingFile(path) => {
            let file = Arc::new(RotatingFileSink::open(path, max_file_bytes)?);
            ResolvedSink {
                sink: file.clone(),
                rotating: Some(file),
            }
        }
    };
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_builtin_addresses() {
        let out = resolve(&SinkAddress::Stdout, 1024).unwrap();
        assert_eq!(out.sink.name(), "stdout");
        assert!(out.rotating.is_none());
        assert_eq!(resolve(&SinkAddress::Discard, 1024).unwrap().sink.name(), "discard");
    }

    #[test]
    fn rotating_file_is_opened_eagerly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/svc.log");
        let out = resolve(&SinkAddress::RotatingFile(path.clone()), 1024).unwrap();
        assert!(out.rotating.is_some());
        assert!(path.exists());
    }
}
