//! Configuration validation.
//!
//! Runs once at startup, before anything touches the network: syntax, unknown
//! or misspelled fields, and semantic checks (missing credentials, empty
//! allow-lists, sub-floor intervals). Errors refuse startup; warnings are
//! printed and tolerated.

use std::{collections::HashMap, path::Path};

use secrecy::ExposeSecret;

use crate::schema::{MIN_UPDATE_INTERVAL_SECS, StewardConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "required", "access", "sync",
    /// "security"
    pub category: &'static str,
    /// Dotted path, e.g. "panel.base_url"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn error(category: &'static str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category,
            path: path.into(),
            message: message.into(),
        }
    }

    fn warning(
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

/// Expected shape of the configuration, for unknown-key detection.
enum KnownKeys {
    /// A struct with fixed field names.
    Struct(HashMap<&'static str, KnownKeys>),
    /// A map with operator-chosen keys (the server registry).
    Map,
    /// Scalar or list value — stop recursion.
    Leaf,
}

/// Build the schema map mirroring every field in `schema.rs`.
fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Map, Struct};

    Struct(HashMap::from([
        (
            "discord",
            Struct(HashMap::from([
                ("token", Leaf),
                ("guild_id", Leaf),
                ("status_channel_id", Leaf),
            ])),
        ),
        (
            "panel",
            Struct(HashMap::from([
                ("base_url", Leaf),
                ("username", Leaf),
                ("password", Leaf),
                ("bearer_token", Leaf),
                ("verify_ssl", Leaf),
                ("timeout_secs", Leaf),
            ])),
        ),
        (
            "access",
            Struct(HashMap::from([
                ("allowed_user_ids", Leaf),
                ("allowed_role_names", Leaf),
            ])),
        ),
        ("servers", Map),
        (
            "sync",
            Struct(HashMap::from([
                ("enabled", Leaf),
                ("update_interval_secs", Leaf),
            ])),
        ),
    ]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a_len = a.len();
    let b_len = b.len();
    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = if ca == cb {
                0
            } else {
                1
            };
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_len]
}

/// Find the best match for `needle` among `candidates` using Levenshtein
/// distance. Returns `Some(best)` if the distance is <= `max_distance`.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in candidates {
        let d = levenshtein(needle, candidate);
        if d > 0 && d <= max_distance && best.as_ref().is_none_or(|(_, bd)| d < *bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(s, _)| s)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path.
///
/// TOML files get the full treatment (syntax + unknown fields + semantics);
/// YAML/JSON are parsed and semantically checked only.
pub fn validate_file(path: &Path) -> ValidationResult {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    if ext == "toml" {
        return match std::fs::read_to_string(path) {
            Ok(content) => validate_toml_str(&content),
            Err(e) => ValidationResult {
                diagnostics: vec![Diagnostic::error(
                    "syntax",
                    "",
                    format!("failed to read config file: {e}"),
                )],
            },
        };
    }

    match crate::loader::load_config(path) {
        Ok(config) => ValidationResult {
            diagnostics: validate_config(&config),
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::error("syntax", "", e.to_string())],
        },
    }
}

/// Validate a TOML string without file-system side effects (useful for tests
/// and the `check` subcommand).
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    // 1. Syntax — parse raw TOML
    let toml_value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic::error(
                "syntax",
                "",
                format!("TOML syntax error: {e}"),
            ));
            return ValidationResult { diagnostics };
        },
    };

    // 2. Unknown fields — walk the TOML tree against KnownKeys
    let schema = build_schema_map();
    check_unknown_fields(&toml_value, &schema, "", &mut diagnostics);

    // 3. Type check + semantic checks — attempt full deserialization
    match toml::from_str::<StewardConfig>(toml_str) {
        Ok(config) => diagnostics.extend(validate_config(&config)),
        Err(e) => diagnostics.push(Diagnostic::error("syntax", "", format!("type error: {e}"))),
    }

    ValidationResult { diagnostics }
}

/// Semantic checks on a parsed config. This is the fail-fast gate: errors
/// here mean the bot refuses to start.
#[must_use]
pub fn validate_config(config: &StewardConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    // Required: Discord token.
    if config.discord.token.expose_secret().is_empty() {
        diagnostics.push(Diagnostic::error(
            "required",
            "discord.token",
            "discord.token is required",
        ));
    }

    // Required: panel base URL, with a scheme.
    if config.panel.base_url.is_empty() {
        diagnostics.push(Diagnostic::error(
            "required",
            "panel.base_url",
            "panel.base_url is required",
        ));
    } else if !config.panel.base_url.starts_with("http://")
        && !config.panel.base_url.starts_with("https://")
    {
        diagnostics.push(Diagnostic::error(
            "required",
            "panel.base_url",
            format!(
                "panel.base_url must start with http:// or https:// (got \"{}\")",
                config.panel.base_url
            ),
        ));
    }

    // Required: some way to authenticate against the panel.
    if !config.panel.has_credentials() {
        diagnostics.push(Diagnostic::error(
            "required",
            "panel",
            "either panel.bearer_token or panel.username + panel.password must be set",
        ));
    }

    // Required: something to manage.
    if config.servers.is_empty() {
        diagnostics.push(Diagnostic::error(
            "required",
            "servers",
            "no servers configured; add at least one entry under [servers]",
        ));
    }
    for (name, id) in &config.servers {
        if id.trim().is_empty() {
            diagnostics.push(Diagnostic::error(
                "required",
                format!("servers.{name}"),
                "server id must not be empty",
            ));
        }
    }

    // Duplicate names after case normalization ("SMP" and "smp" would
    // collide in the registry).
    let mut seen = HashMap::new();
    for name in config.servers.keys() {
        if let Some(first) = seen.insert(name.to_lowercase(), name.clone()) {
            diagnostics.push(Diagnostic::error(
                "required",
                format!("servers.{name}"),
                format!("duplicate server name (collides with \"{first}\" after lowercasing)"),
            ));
        }
    }

    // Discord snowflakes are never 0; a 0 here is a placeholder someone
    // forgot to fill in.
    if config.discord.guild_id == Some(0) {
        diagnostics.push(Diagnostic::error(
            "required",
            "discord.guild_id",
            "discord.guild_id must be a real guild id, not 0",
        ));
    }
    if config.discord.status_channel_id == Some(0) {
        diagnostics.push(Diagnostic::error(
            "required",
            "discord.status_channel_id",
            "discord.status_channel_id must be a real channel id, not 0",
        ));
    }

    // Sync needs a surface to write to.
    if config.sync.enabled && config.discord.status_channel_id.is_none() {
        diagnostics.push(Diagnostic::error(
            "sync",
            "discord.status_channel_id",
            "sync is enabled but discord.status_channel_id is not set",
        ));
    }

    // Empty allow-lists deny everyone.
    if config.access.allowed_user_ids.is_empty() && config.access.allowed_role_names.is_empty() {
        diagnostics.push(Diagnostic::warning(
            "access",
            "access",
            "both allow-lists are empty; every command will be denied",
        ));
    }

    // Interval below the platform floor gets clamped.
    if config.sync.enabled && config.sync.update_interval_secs < MIN_UPDATE_INTERVAL_SECS {
        diagnostics.push(Diagnostic::warning(
            "sync",
            "sync.update_interval_secs",
            format!(
                "{} is below the platform floor of {MIN_UPDATE_INTERVAL_SECS}s and will be clamped",
                config.sync.update_interval_secs
            ),
        ));
    }

    // TLS verification disabled.
    if !config.panel.verify_ssl {
        diagnostics.push(Diagnostic::warning(
            "security",
            "panel.verify_ssl",
            "TLS certificate verification is disabled for panel requests",
        ));
    }

    diagnostics
}

/// Walk the TOML value tree against the schema tree and flag unknown keys.
fn check_unknown_fields(
    value: &toml::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match (value, schema) {
        (toml::Value::Table(table), KnownKeys::Struct(fields)) => {
            let known_keys: Vec<&str> = fields.keys().copied().collect();
            for (key, child_value) in table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                if let Some(child_schema) = fields.get(key.as_str()) {
                    check_unknown_fields(child_value, child_schema, &path, diagnostics);
                } else {
                    let msg = match suggest(key, &known_keys, 3) {
                        Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
                        None => "unknown field".to_string(),
                    };
                    diagnostics.push(Diagnostic::error("unknown-field", path, msg));
                }
            }
        },
        // Map keys are operator-chosen; values are scalars, nothing to check.
        _ => {},
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
