pub mod memory;
pub mod models;
pub mod queries;
pub mod store;

pub use memory::MemoryWhisperStore;
pub use models::{NewWhisper, Opened, Sender, Whisper, WhisperId, WhisperRow};
pub use queries::{init_db, DbPool, SqliteWhisperStore};
pub use store::{MarkOpened, WhisperStore};

#[cfg(test)]
pub use queries::setup_test_db;
