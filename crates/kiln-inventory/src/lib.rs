//! Test inventory: annotated C tests and incremental-update scenarios.

pub mod directives;
pub mod discovery;
pub mod error;

pub use directives::{
    DEFAULT_RUN, DISABLED_PREFIX, RET_PREFIX, RUN_PREFIX, SELF_TOKEN, TXT_PREFIX,
    parse_annotations,
};
pub use discovery::{TEST_DIR, discover_scenarios, list_test_sources, scan_tests};
pub use error::{InventoryError, Result};
