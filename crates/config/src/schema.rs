//! Configuration schema for the steward bot.
//!
//! Loaded once at startup and treated as an immutable snapshot from then on;
//! nothing in the runtime mutates it.

use std::collections::BTreeMap;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Floor on the status-surface update interval, in seconds.
///
/// Discord allows roughly 2 renames per 10 minutes per channel; anything
/// faster than one write per 5 minutes gets silently queued or dropped by the
/// platform, so the synchronizer never runs faster than this.
pub const MIN_UPDATE_INTERVAL_SECS: u64 = 300;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StewardConfig {
    pub discord: DiscordConfig,
    pub panel: PanelConfig,
    pub access: AccessConfig,
    /// Friendly server name → control-panel server id.
    pub servers: BTreeMap<String, String>,
    pub sync: SyncConfig,
}

/// Discord connection and surface configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token from the Discord developer portal.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// When set, slash commands are registered against this guild only
    /// (instant propagation); otherwise they are registered globally.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<u64>,

    /// Channel or category whose name carries the aggregate server status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_channel_id: Option<u64>,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[REDACTED]")
            .field("guild_id", &self.guild_id)
            .field("status_channel_id", &self.status_channel_id)
            .finish()
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            guild_id: None,
            status_channel_id: None,
        }
    }
}

/// Control panel (Crafty Controller) connection parameters.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Base URL of the panel, e.g. `https://crafty.local:8443`.
    pub base_url: String,

    /// Username for session login. Ignored when `bearer_token` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password for session login.
    #[serde(
        serialize_with = "serialize_opt_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<Secret<String>>,

    /// Static API token. Takes precedence over username/password.
    #[serde(
        serialize_with = "serialize_opt_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub bearer_token: Option<Secret<String>>,

    /// Verify the panel's TLS certificate. Disable only for self-signed
    /// panels on trusted networks.
    pub verify_ssl: bool,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl PanelConfig {
    /// Whether the config carries a usable credential (token or user+pass).
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.bearer_token.is_some() || (self.username.is_some() && self.password.is_some())
    }
}

impl std::fmt::Debug for PanelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("verify_ssl", &self.verify_ssl)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: None,
            password: None,
            bearer_token: None,
            verify_ssl: true,
            timeout_secs: 15,
        }
    }
}

/// Who may issue start/stop/restart/status commands.
///
/// Both lists empty means nobody is authorized; the bot will deny every
/// command until an operator fills one in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Discord user ids allowed regardless of roles.
    pub allowed_user_ids: Vec<u64>,

    /// Role names (case-insensitive) whose members are allowed.
    pub allowed_role_names: Vec<String>,
}

/// Status synchronizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Whether the periodic status loop runs at all.
    pub enabled: bool,

    /// Seconds between polls. Values below [`MIN_UPDATE_INTERVAL_SECS`] are
    /// clamped up at load time.
    pub update_interval_secs: u64,
}

impl SyncConfig {
    /// The configured interval with the platform floor applied.
    #[must_use]
    pub fn effective_interval_secs(&self) -> u64 {
        self.update_interval_secs.max(MIN_UPDATE_INTERVAL_SECS)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            update_interval_secs: 60,
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn serialize_opt_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = StewardConfig::default();
        assert!(cfg.sync.enabled);
        assert_eq!(cfg.sync.update_interval_secs, 60);
        assert_eq!(cfg.panel.timeout_secs, 15);
        assert!(cfg.panel.verify_ssl);
        assert!(cfg.servers.is_empty());
        assert!(cfg.access.allowed_user_ids.is_empty());
    }

    #[test]
    fn deserialize_from_toml() {
        let toml = r#"
[discord]
token = "bot-token"
guild_id = 42
status_channel_id = 99

[panel]
base_url = "https://crafty.local:8443"
username = "bot"
password = "hunter2"

[access]
allowed_user_ids = [111]
allowed_role_names = ["Admins"]

[servers]
smp = "d4f3c9b0"

[sync]
update_interval_secs = 600
"#;
        let cfg: StewardConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.discord.token.expose_secret(), "bot-token");
        assert_eq!(cfg.discord.guild_id, Some(42));
        assert_eq!(cfg.panel.base_url, "https://crafty.local:8443");
        assert!(cfg.panel.has_credentials());
        assert_eq!(cfg.servers.get("smp").map(String::as_str), Some("d4f3c9b0"));
        assert_eq!(cfg.sync.update_interval_secs, 600);
        // defaults for unspecified fields
        assert!(cfg.panel.verify_ssl);
        assert!(cfg.sync.enabled);
    }

    #[test]
    fn bearer_token_counts_as_credentials() {
        let cfg: StewardConfig = toml::from_str(
            r#"
[panel]
base_url = "http://localhost:8000"
bearer_token = "abc"
"#,
        )
        .unwrap();
        assert!(cfg.panel.has_credentials());
    }

    #[test]
    fn username_without_password_is_not_credentials() {
        let cfg: StewardConfig = toml::from_str(
            r#"
[panel]
base_url = "http://localhost:8000"
username = "bot"
"#,
        )
        .unwrap();
        assert!(!cfg.panel.has_credentials());
    }

    #[test]
    fn interval_floor_applied() {
        let sync = SyncConfig {
            enabled: true,
            update_interval_secs: 15,
        };
        assert_eq!(sync.effective_interval_secs(), MIN_UPDATE_INTERVAL_SECS);

        let slow = SyncConfig {
            enabled: true,
            update_interval_secs: 900,
        };
        assert_eq!(slow.effective_interval_secs(), 900);
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg: StewardConfig = toml::from_str(
            r#"
[discord]
token = "super-secret"

[panel]
base_url = "http://localhost:8000"
password = "hunter2"
"#,
        )
        .unwrap();
        let rendered = format!("{:?}", cfg.discord);
        assert!(!rendered.contains("super-secret"));
        let rendered = format!("{:?}", cfg.panel);
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn serialize_roundtrip() {
        let cfg: StewardConfig = toml::from_str(
            r#"
[discord]
token = "tok"

[panel]
base_url = "http://localhost:8000"
bearer_token = "abc"

[servers]
smp = "id-1"
"#,
        )
        .unwrap();
        let out = toml::to_string(&cfg).unwrap();
        let back: StewardConfig = toml::from_str(&out).unwrap();
        assert_eq!(back.discord.token.expose_secret(), "tok");
        assert_eq!(back.servers.len(), 1);
    }
}
