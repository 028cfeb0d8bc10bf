//! Mock definition files.
//!
//! ```text
//! mocks folder
//!     → loader.rs (read routes/ and collections.*, report broken files)
//!     → Mocks::load (validate, resolve, publish router)
//!
//! On change:
//!     watcher.rs detects a definition file event
//!     → debounce
//!     → loader.rs reads the folder again
//!     → Mocks::load swaps the router
//! ```

mod loader;
mod watcher;

pub use loader::{is_definition_file, FileLoader, LoadError, LoadedDefinitions};
pub use watcher::MocksWatcher;
