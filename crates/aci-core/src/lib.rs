pub mod cache;
pub mod config;
pub mod editor;
pub mod error;
pub mod history;
pub mod io;
pub mod lang;
pub mod linter;
pub mod paths;
pub mod results;
pub mod shell;
pub mod text;
pub mod tool;
pub mod viewer;

pub use error::{AciError, Result};
