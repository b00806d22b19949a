use serde::{Deserialize, Deserializer};

/// Crafty wraps every response in `{"status": "...", "data": ...}`; only
/// `data` matters here.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginData {
    pub token: String,
}

/// One entry from `GET /api/v2/servers`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSummary {
    /// Crafty returns numeric ids on older installs and UUIDs on newer ones.
    #[serde(deserialize_with = "string_or_number")]
    pub server_id: String,
    pub server_name: String,
}

/// The slice of `GET /api/v2/servers/{id}/stats` the bot cares about.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ServerStats {
    #[serde(default)]
    pub running: bool,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number for server_id, got {other}"
        ))),
    }
}
