use {async_trait::async_trait, thiserror::Error};

/// Observed power state of a managed server.
///
/// `Unknown` is both the initial state and the recovery state after any
/// failed poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Running,
    Stopped,
    Unknown,
}

impl PowerState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a control-panel call failed. Kinds only: raw upstream payloads are
/// logged by the client, never carried here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PanelError {
    #[error("control panel unreachable")]
    Unreachable,

    #[error("control panel request timed out")]
    Timeout,

    #[error("control panel returned HTTP {0}")]
    Status(u16),

    #[error("control panel authentication failed")]
    Auth,

    #[error("control panel response was malformed")]
    Malformed,
}

/// Capability wrapper over the remote control panel.
///
/// `start`/`stop`/`restart` are fire-and-forget: the panel acknowledges the
/// request and performs the actual bring-up/tear-down asynchronously.
/// Every call carries the client's own bounded timeout. Implementations must
/// be safe for concurrent use.
#[async_trait]
pub trait PanelClient: Send + Sync {
    async fn start(&self, server_id: &str) -> Result<(), PanelError>;

    async fn stop(&self, server_id: &str) -> Result<(), PanelError>;

    async fn restart(&self, server_id: &str) -> Result<(), PanelError>;

    async fn status(&self, server_id: &str) -> Result<PowerState, PanelError>;
}
