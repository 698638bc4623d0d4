//! Credentials for downstream collaborators.
//!
//! SMB, LDAP, IMAP and search-index credentials live in a separate TOML file
//! with strict permissions. The crawl engine itself reads none of them; this
//! loader exists for the mirroring and indexing steps that do.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

/// Named credential sets parsed from the secrets file.
#[derive(Debug, Clone)]
pub struct Secrets {
    entries: HashMap<String, HashMap<String, String>>,
}

impl Secrets {
    /// Load and validate the secrets file.
    ///
    /// The file must be readable by its owner only (no group or world bits);
    /// anything looser is a configuration error and the run does not start.
    pub fn load(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("failed to stat secrets file {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = metadata.permissions().mode();
            if mode & 0o077 != 0 {
                anyhow::bail!(
                    "secrets file {} is readable by group or world (mode {:o}); \
                     tighten it to 0600",
                    path.display(),
                    mode & 0o777
                );
            }
        }
        #[cfg(not(unix))]
        let _ = &metadata;

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read secrets file {}", path.display()))?;
        let entries: HashMap<String, HashMap<String, String>> = toml::from_str(&raw)
            .with_context(|| format!("invalid secrets file {}", path.display()))?;

        Ok(Self { entries })
    }

    /// Credential value for a named collaborator, e.g. `("search", "url")`.
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.entries.get(section)?.get(key).map(String::as_str)
    }
}
