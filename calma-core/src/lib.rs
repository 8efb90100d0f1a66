pub mod analysis;
pub mod config;
pub mod dispatch;
pub mod loader;
pub mod storage;

pub use dispatch::{Action, Dispatcher, NullView, ViewSink};
pub use loader::load_and_migrate;
pub use storage::{LegacyStore, SqliteStore};
