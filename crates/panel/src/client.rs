use std::time::Duration;

use {
    async_trait::async_trait,
    reqwest::{Method, StatusCode},
    secrecy::{ExposeSecret, Secret},
    serde_json::json,
    tokio::sync::RwLock,
    tracing::{debug, info, warn},
};

use {
    steward_config::PanelConfig,
    steward_core::{PanelClient, PanelError, PowerState},
};

use crate::types::{ApiEnvelope, LoginData, ServerStats, ServerSummary};

struct Credentials {
    username: String,
    password: Secret<String>,
}

/// HTTP client for a single Crafty Controller instance.
///
/// Safe for concurrent use: the session token sits behind an async `RwLock`
/// and reqwest's client is internally pooled. A 401 on a credential-based
/// session triggers exactly one re-login and replay; a 401 on a static
/// bearer token is terminal.
pub struct CraftyClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
    static_token: Option<Secret<String>>,
    session_token: RwLock<Option<String>>,
}

impl CraftyClient {
    pub fn new(cfg: &PanelConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .danger_accept_invalid_certs(!cfg.verify_ssl)
            .build()?;

        let credentials = match (&cfg.username, &cfg.password) {
            (Some(username), Some(password)) => Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            credentials,
            static_token: cfg.bearer_token.clone(),
            session_token: RwLock::new(None),
        })
    }

    /// Log in with the configured credentials and cache the session token.
    ///
    /// With a static bearer token this is a no-op.
    pub async fn login(&self) -> Result<(), PanelError> {
        if self.static_token.is_some() {
            return Ok(());
        }
        self.session_login().await.map(drop)
    }

    async fn session_login(&self) -> Result<String, PanelError> {
        let Some(creds) = &self.credentials else {
            return Err(PanelError::Auth);
        };

        let url = format!("{}/api/v2/auth/login", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&json!({
                "username": creds.username,
                "password": creds.password.expose_secret(),
            }))
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "control panel login failed");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PanelError::Auth,
                _ => PanelError::Status(status.as_u16()),
            });
        }

        let envelope: ApiEnvelope<LoginData> =
            response.json().await.map_err(|_| PanelError::Malformed)?;
        let token = envelope
            .data
            .map(|d| d.token)
            .filter(|t| !t.is_empty())
            .ok_or(PanelError::Malformed)?;

        *self.session_token.write().await = Some(token.clone());
        info!("logged in to control panel");
        Ok(token)
    }

    /// Current bearer token: the static one, the cached session token, or a
    /// fresh login.
    async fn bearer(&self) -> Result<String, PanelError> {
        if let Some(token) = &self.static_token {
            return Ok(token.expose_secret().clone());
        }
        if let Some(token) = self.session_token.read().await.clone() {
            return Ok(token);
        }
        self.session_login().await
    }

    async fn request(&self, method: Method, path: &str) -> Result<serde_json::Value, PanelError> {
        let token = self.bearer().await?;
        let response = self.send(method.clone(), path, &token).await?;

        // Expired session token: re-login once and replay the request once.
        if response.status() == StatusCode::UNAUTHORIZED && self.static_token.is_none() {
            debug!(path, "session token rejected, re-logging in");
            *self.session_token.write().await = None;
            let token = self.session_login().await?;
            let response = self.send(method, path, &token).await?;
            return decode(response).await;
        }

        decode(response).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        token: &str,
    ) -> Result<reqwest::Response, PanelError> {
        let url = format!("{}{path}", self.base_url);
        self.http
            .request(method, &url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(map_send_error)
    }

    /// All servers the panel knows about. Used by the connectivity probe,
    /// not by the command path.
    pub async fn list_servers(&self) -> Result<Vec<ServerSummary>, PanelError> {
        let value = self.request(Method::GET, "/api/v2/servers").await?;
        let envelope: ApiEnvelope<Vec<ServerSummary>> =
            serde_json::from_value(value).map_err(|_| PanelError::Malformed)?;
        Ok(envelope.data.unwrap_or_default())
    }

    async fn action(&self, server_id: &str, action: &str) -> Result<(), PanelError> {
        self.request(
            Method::POST,
            &format!("/api/v2/servers/{server_id}/action/{action}"),
        )
        .await
        .map(drop)
    }

    async fn stats(&self, server_id: &str) -> Result<ServerStats, PanelError> {
        let value = self
            .request(Method::GET, &format!("/api/v2/servers/{server_id}/stats"))
            .await?;
        let envelope: ApiEnvelope<ServerStats> =
            serde_json::from_value(value).map_err(|_| PanelError::Malformed)?;
        envelope.data.ok_or(PanelError::Malformed)
    }
}

#[async_trait]
impl PanelClient for CraftyClient {
    async fn start(&self, server_id: &str) -> Result<(), PanelError> {
        self.action(server_id, "start_server").await
    }

    async fn stop(&self, server_id: &str) -> Result<(), PanelError> {
        self.action(server_id, "stop_server").await
    }

    async fn restart(&self, server_id: &str) -> Result<(), PanelError> {
        self.action(server_id, "restart_server").await
    }

    async fn status(&self, server_id: &str) -> Result<PowerState, PanelError> {
        let stats = self.stats(server_id).await?;
        Ok(if stats.running {
            PowerState::Running
        } else {
            PowerState::Stopped
        })
    }
}

async fn decode(response: reqwest::Response) -> Result<serde_json::Value, PanelError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(PanelError::Auth);
    }
    if !status.is_success() {
        // Payloads stay in the log, they never reach the actor.
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %body, "control panel error response");
        return Err(PanelError::Status(status.as_u16()));
    }
    response.json().await.map_err(|e| {
        debug!(error = %e, "control panel response was not JSON");
        PanelError::Malformed
    })
}

fn map_send_error(e: reqwest::Error) -> PanelError {
    if e.is_timeout() {
        PanelError::Timeout
    } else {
        PanelError::Unreachable
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_credentials(base_url: &str) -> CraftyClient {
        let cfg = PanelConfig {
            base_url: base_url.to_string(),
            username: Some("bot".into()),
            password: Some(Secret::new("hunter2".into())),
            ..Default::default()
        };
        CraftyClient::new(&cfg).unwrap()
    }

    fn client_with_bearer(base_url: &str, token: &str) -> CraftyClient {
        let cfg = PanelConfig {
            base_url: base_url.to_string(),
            bearer_token: Some(Secret::new(token.into())),
            ..Default::default()
        };
        CraftyClient::new(&cfg).unwrap()
    }

    const LOGIN_BODY: &str = r#"{"status":"ok","data":{"token":"session-abc"}}"#;

    #[tokio::test]
    async fn login_token_is_used_as_bearer() {
        let mut server = mockito::Server::new_async().await;
        let login = server
            .mock("POST", "/api/v2/auth/login")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(LOGIN_BODY)
            .create_async()
            .await;
        let stats = server
            .mock("GET", "/api/v2/servers/id-1/stats")
            .match_header("authorization", "Bearer session-abc")
            .with_status(200)
            .with_body(r#"{"status":"ok","data":{"running":true}}"#)
            .create_async()
            .await;

        let client = client_with_credentials(&server.url());
        let state = client.status("id-1").await.unwrap();

        assert_eq!(state, PowerState::Running);
        login.assert_async().await;
        stats.assert_async().await;
    }

    #[tokio::test]
    async fn static_bearer_skips_login() {
        let mut server = mockito::Server::new_async().await;
        let action = server
            .mock("POST", "/api/v2/servers/id-1/action/start_server")
            .match_header("authorization", "Bearer static-tok")
            .with_status(200)
            .with_body(r#"{"status":"ok","data":{}}"#)
            .create_async()
            .await;

        let client = client_with_bearer(&server.url(), "static-tok");
        client.start("id-1").await.unwrap();

        action.assert_async().await;
    }

    #[tokio::test]
    async fn not_running_maps_to_stopped() {
        let mut server = mockito::Server::new_async().await;
        let _login = server
            .mock("POST", "/api/v2/auth/login")
            .with_status(200)
            .with_body(LOGIN_BODY)
            .create_async()
            .await;
        let _stats = server
            .mock("GET", "/api/v2/servers/id-1/stats")
            .with_status(200)
            .with_body(r#"{"status":"ok","data":{"running":false}}"#)
            .create_async()
            .await;

        let client = client_with_credentials(&server.url());
        assert_eq!(client.status("id-1").await.unwrap(), PowerState::Stopped);
    }

    #[tokio::test]
    async fn server_error_maps_to_status_kind() {
        let mut server = mockito::Server::new_async().await;
        let _action = server
            .mock("POST", "/api/v2/servers/id-1/action/stop_server")
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;

        let client = client_with_bearer(&server.url(), "tok");
        assert_eq!(client.stop("id-1").await.unwrap_err(), PanelError::Status(500));
    }

    #[tokio::test]
    async fn non_json_body_maps_to_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _stats = server
            .mock("GET", "/api/v2/servers/id-1/stats")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let client = client_with_bearer(&server.url(), "tok");
        assert_eq!(client.status("id-1").await.unwrap_err(), PanelError::Malformed);
    }

    #[tokio::test]
    async fn missing_data_maps_to_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _stats = server
            .mock("GET", "/api/v2/servers/id-1/stats")
            .with_status(200)
            .with_body(r#"{"status":"ok"}"#)
            .create_async()
            .await;

        let client = client_with_bearer(&server.url(), "tok");
        assert_eq!(client.status("id-1").await.unwrap_err(), PanelError::Malformed);
    }

    #[tokio::test]
    async fn expired_session_relogs_in_once() {
        let mut server = mockito::Server::new_async().await;
        // Both the initial call and the replay hit a 401, so the client
        // must log in twice (initial + refresh) and then give up with Auth.
        let login = server
            .mock("POST", "/api/v2/auth/login")
            .with_status(200)
            .with_body(LOGIN_BODY)
            .expect(2)
            .create_async()
            .await;
        let action = server
            .mock("POST", "/api/v2/servers/id-1/action/restart_server")
            .with_status(401)
            .expect(2)
            .create_async()
            .await;

        let client = client_with_credentials(&server.url());
        assert_eq!(client.restart("id-1").await.unwrap_err(), PanelError::Auth);

        login.assert_async().await;
        action.assert_async().await;
    }

    #[tokio::test]
    async fn static_bearer_401_is_terminal() {
        let mut server = mockito::Server::new_async().await;
        let action = server
            .mock("POST", "/api/v2/servers/id-1/action/start_server")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let client = client_with_bearer(&server.url(), "revoked");
        assert_eq!(client.start("id-1").await.unwrap_err(), PanelError::Auth);

        action.assert_async().await;
    }

    #[tokio::test]
    async fn list_servers_parses_mixed_ids() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/api/v2/servers")
            .with_status(200)
            .with_body(
                r#"{"status":"ok","data":[
                    {"server_id": "d4f3c9b0", "server_name": "smp"},
                    {"server_id": 3, "server_name": "creative"}
                ]}"#,
            )
            .create_async()
            .await;

        let client = client_with_bearer(&server.url(), "tok");
        let servers = client.list_servers().await.unwrap();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].server_id, "d4f3c9b0");
        assert_eq!(servers[1].server_id, "3");
    }

    #[tokio::test]
    async fn unreachable_panel_maps_to_unreachable() {
        // Port 9 is the discard service; nothing listens there.
        let client = client_with_bearer("http://127.0.0.1:9", "tok");
        assert_eq!(
            client.start("id-1").await.unwrap_err(),
            PanelError::Unreachable
        );
    }
}
