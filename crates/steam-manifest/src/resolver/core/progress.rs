//! Progress reporting for resolution runs

use std::path::PathBuf;
use std::sync::Arc;

/// Progress callback for resolution operations
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Events emitted while a resolution runs
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    RepositoryStarted {
        repository: String,
    },
    RepositoryFailed {
        repository: String,
        error: String,
    },
    EntrySkipped {
        path: String,
    },
    EntrySaved {
        path: String,
        size: u64,
    },
    KeysLoaded {
        depots: usize,
    },
    DescriptorWritten {
        path: PathBuf,
    },
}

pub(crate) fn report(callback: Option<&ProgressCallback>, event: ProgressEvent) {
    if let Some(callback) = callback {
        callback(event);
    }
}
