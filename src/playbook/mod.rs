// ABOUTME: Playbook data model and its YAML loader
// ABOUTME: Exports Playbook, Task and the PlaybookParser

pub mod error;
pub mod loader;
pub mod model;

pub use error::{ParserError, Result};
pub use loader::PlaybookParser;
pub use model::{Playbook, Task, TaskList};
