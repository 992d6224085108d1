//! Child process lifecycle.

mod shutdown;

pub use shutdown::{DEFAULT_GRACE, shutdown_child};
