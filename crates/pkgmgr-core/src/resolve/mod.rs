//! Package reference resolution.
//!
//! A reference can take any of these forms:
//! - `https://host/path/to/repo.git` (full URL, used as-is)
//! - `org/repo` (repository on the default host)
//! - `eskill-name` (skill package on the default organization)
//! - `name` (bare skill name, the prefix is added)
//!
//! Every reference maps to a fetch location and a canonical directory name.
//! The name is the fetch path reversed and joined with `.`, dropping the
//! default host and organization, so `acme/tools` becomes `tools.acme`
//! while `eskill-chat` on the default organization stays `eskill-chat`.

use std::path::{Component, Path};

use serde::Serialize;

use crate::config::ResolverSettings;

/// Outcome of resolving a reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPackage {
    /// URL passed to `git clone`
    pub fetch_location: String,
    /// Directory name under the target root
    pub canonical_name: String,
}

impl ResolvedPackage {
    /// Whether the canonical name is exactly one normal path component, so
    /// that `root.join(name)` names a child of `root`.
    pub fn has_directory_name(&self) -> bool {
        let mut components = Path::new(&self.canonical_name).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(part)), None) if *part == *self.canonical_name
        )
    }
}

/// Resolves references against configurable host/organization defaults.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    settings: ResolverSettings,
}

impl Resolver {
    pub fn new(settings: ResolverSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Resolve a reference. Never fails; any string is accepted.
    pub fn resolve(&self, reference: &str) -> ResolvedPackage {
        let fetch_location = self.fetch_location(reference);
        let canonical_name = self.canonical_name(&fetch_location);
        ResolvedPackage {
            fetch_location,
            canonical_name,
        }
    }

    /// Whether a directory name carries the managed skill prefix.
    pub fn is_managed_name(&self, name: &str) -> bool {
        name.starts_with(&self.settings.skill_prefix)
    }

    fn fetch_location(&self, reference: &str) -> String {
        let ResolverSettings {
            default_host,
            default_org,
            skill_prefix,
        } = &self.settings;

        if reference.contains("://") {
            reference.to_string()
        } else if reference.contains('/') {
            format!("https://{}/{}.git", default_host, reference)
        } else if reference.starts_with(skill_prefix.as_str()) {
            format!("https://{}/{}/{}.git", default_host, default_org, reference)
        } else {
            format!(
                "https://{}/{}/{}{}.git",
                default_host, default_org, skill_prefix, reference
            )
        }
    }

    fn canonical_name(&self, fetch_location: &str) -> String {
        let without_scheme = match fetch_location.find("://") {
            Some(idx) => &fetch_location[idx + 3..],
            None => fetch_location,
        };
        let trimmed = without_scheme.trim_end_matches('/');
        let path = trimmed.strip_suffix(".git").unwrap_or(trimmed);

        // Empty segments come from `file:///abs/path` or doubled slashes and
        // would produce leading or trailing dots.
        let mut parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
        if parts.first() == Some(&self.settings.default_host.as_str()) {
            parts.remove(0);
            if parts.first() == Some(&self.settings.default_org.as_str()) {
                parts.remove(0);
            }
        }
        parts.reverse();
        parts.join(".")
    }
}

/// Resolve a reference with the default settings.
pub fn resolve(reference: &str) -> ResolvedPackage {
    Resolver::default().resolve(reference)
}
