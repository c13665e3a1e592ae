//! Optional process-wide logger slot.
//!
//! Re-initialization always tears the previous logger down (flushing its
//! sinks) before the replacement is built.

use std::sync::{PoisonError, RwLock};

use tracelog_config::OutputConfiguration;
use tracelog_core::LogError;

use crate::logger::Logger;

static GLOBAL: RwLock<Option<Logger>> = RwLock::new(None);

/// Shut down the installed logger, then build and install a new one.
pub fn init(config: &OutputConfiguration) -> Result<Logger, LogError> {
    shutdown();
    let logger = Logger::new(config)?;
    *GLOBAL.write().unwrap_or_else(PoisonError::into_inner) = Some(logger.clone());
    Ok(logger)
}

/// Install an already built logger, shutting down the previous one.
pub fn install(logger: Logger) {
    let previous = GLOBAL
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(logger);
    if let Some(previous) = previous {
        previous.shutdown();
    }
}

pub fn current() -> Option<Logger> {
    GLOBAL.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Remove and shut down the installed logger. Safe to call repeatedly.
pub fn shutdown() {
    let previous = GLOBAL.write().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(previous) = previous {
        previous.shutdown();
    }
}
