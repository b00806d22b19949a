use std::collections::BTreeMap;

use thiserror::Error;

/// A single managed game server: friendly name plus the opaque identifier
/// the control panel knows it by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedServer {
    /// Canonical (lowercased) friendly name.
    pub name: String,
    pub panel_id: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate server name \"{0}\" after case normalization")]
    DuplicateName(String),

    #[error("server \"{0}\" has an empty panel id")]
    EmptyId(String),
}

/// The static friendly-name → panel-id mapping, built once from config.
///
/// Names are normalized to lowercase at load so operators cannot create
/// lookups that depend on how a user typed the name. Iteration order is
/// sorted by name, which keeps poll order and the aggregate label stable.
#[derive(Debug, Clone, Default)]
pub struct ServerRegistry {
    servers: BTreeMap<String, ManagedServer>,
}

impl ServerRegistry {
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, RegistryError> {
        let mut servers = BTreeMap::new();
        for (name, panel_id) in entries {
            let canonical = name.trim().to_lowercase();
            if panel_id.trim().is_empty() {
                return Err(RegistryError::EmptyId(canonical));
            }
            let server = ManagedServer {
                name: canonical.clone(),
                panel_id,
            };
            if servers.insert(canonical.clone(), server).is_some() {
                return Err(RegistryError::DuplicateName(canonical));
            }
        }
        Ok(Self { servers })
    }

    /// Look up a server by friendly name, case-insensitively.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&ManagedServer> {
        self.servers.get(&name.trim().to_lowercase())
    }

    /// All servers, sorted by canonical name.
    pub fn servers(&self) -> impl Iterator<Item = &ManagedServer> {
        self.servers.values()
    }

    /// Canonical names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.servers.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}
