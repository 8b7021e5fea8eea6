//! Install and update orchestration.
//!
//! Each call resolves the reference, checks presence, builds a [`Plan`] and
//! walks its steps in order, stopping at the first failure.

mod lock;
mod plan;
mod service;

pub use lock::{NameGuard, NameLocks};
pub use plan::{Mode, Plan, Step, plan};
pub use service::{InstallAction, LoadOutcome, PackageManager};
