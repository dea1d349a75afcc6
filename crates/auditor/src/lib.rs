pub mod commands;
pub mod error;

pub use commands::Report;
pub use error::{AuditError, Result};
