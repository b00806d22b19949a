use std::path::{Path, PathBuf};

use {thiserror::Error, tracing::debug};

use crate::{env_subst::substitute_env, schema::StewardConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "steward.toml",
    "steward.yaml",
    "steward.yml",
    "steward.json",
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("unsupported config format: .{0}")]
    UnsupportedFormat(String),

    #[error("no config file found (looked for steward.toml in . and the user config dir)")]
    NotFound,
}

/// Load config from the given path (any supported format), with `${ENV_VAR}`
/// substitution applied to the raw text before parsing.
pub fn load_config(path: &Path) -> Result<StewardConfig, LoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Resolve the config path: an explicit `--config` argument wins, otherwise
/// the standard locations are searched. Missing config is an error; the bot
/// cannot run on defaults (no token, no servers), so it refuses to start
/// rather than failing per-request later.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, LoadError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    find_config_file().ok_or(LoadError::NotFound)
}

/// Find the first config file in standard locations.
///
/// Search order:
/// 1. `./steward.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/steward/steward.{toml,yaml,yml,json}` (user-global)
pub fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/steward/
    if let Some(dirs) = directories::ProjectDirs::from("", "", "steward") {
        let config_dir = dirs.config_dir();
        for name in CONFIG_FILENAMES {
            let p = config_dir.join(name);
            if p.exists() {
                debug!(path = %p.display(), "using user-global config");
                return Some(p);
            }
        }
    }

    None
}

fn parse_config(raw: &str, path: &Path) -> Result<StewardConfig, LoadError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    let parsed = match ext {
        "toml" => toml::from_str(raw).map_err(|e| e.to_string()),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| e.to_string()),
        "json" => serde_json::from_str(raw).map_err(|e| e.to_string()),
        _ => return Err(LoadError::UnsupportedFormat(ext.to_string())),
    };

    parsed.map_err(|message| LoadError::Parse {
        path: path.to_path_buf(),
        message,
    })
}
