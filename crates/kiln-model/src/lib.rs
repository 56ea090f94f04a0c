//! Shared data model for the kiln build generator.
//!
//! Everything here is plain data: host platforms and build types, the ordered
//! list of compiler source units, annotated test records, and structured
//! command descriptors. Rendering and file IO live in the crates that consume
//! these types.

pub mod command;
pub mod error;
pub mod platform;
pub mod source;
pub mod test_record;

pub use command::{CommandLine, Fragment, Placeholder, Word};
pub use error::{ModelError, Result};
pub use platform::{BuildType, Platform};
pub use source::{CORE_SOURCES, SourceRole, SourceUnit, core_units};
pub use test_record::AnnotatedTest;
