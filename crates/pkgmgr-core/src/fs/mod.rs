//! Filesystem primitives shared across features.

pub mod presence;
pub mod remover;

pub use presence::{ensure_dir, exists};
pub use remover::SafeRemover;
