//! Git operations for fetching skill packages.
//!
//! - Cloning a fetch location into a canonical directory
//! - Rebasing an existing clone onto upstream
//! - Reading the checked-out commit of a clone

mod fetcher;
mod head;

pub use fetcher::GitFetcher;
pub use head::head_commit;
