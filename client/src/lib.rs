//! Framework-free core of the pattern runner: persisted settings and
//! favorites, the output buffer, input resolution and the streaming run loop.

pub mod api;
pub mod error;
pub mod input;
pub mod orchestrator;
pub mod relay;
pub mod storage;
pub mod store;

pub use api::{CompanionApi, HttpCompanion};
pub use error::{ApiError, RunError, StorageError, ValidationError};
pub use input::{InputSource, PageReader, ReaderProxy};
pub use orchestrator::{CancelHandle, Orchestrator, RunOutcome};
pub use storage::{LocalStorage, MemoryStorage, Storage};
