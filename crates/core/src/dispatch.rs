use std::sync::Arc;

use {
    thiserror::Error,
    tracing::{debug, warn},
};

use crate::{
    access::{AccessPolicy, Actor},
    panel::{PanelClient, PowerState},
    registry::ServerRegistry,
};

/// What the actor asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Start,
    Stop,
    Restart,
    Status,
}

/// Successful command result, handed back to the chat adapter verbatim.
/// Reply formatting is the adapter's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Started { server: String },
    Stopped { server: String },
    Restarted { server: String },
    Status { server: String, state: PowerState },
}

/// Why a command was refused. `Display` is the stable, user-safe message;
/// upstream detail is logged, never shown to the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("you are not allowed to manage game servers")]
    Unauthorized,

    #[error("unknown server")]
    NotFound,

    #[error("the control panel did not accept the request")]
    Upstream,
}

/// Routes a single chat command through authorization, name resolution and
/// the control panel.
///
/// Invocations are independent and may run concurrently; the dispatcher only
/// holds read-only state. No retries: start/stop are user-triggered and
/// at-most-once is preferred over silent duplicates.
pub struct Dispatcher {
    policy: Arc<dyn AccessPolicy>,
    registry: Arc<ServerRegistry>,
    panel: Arc<dyn PanelClient>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        policy: Arc<dyn AccessPolicy>,
        registry: Arc<ServerRegistry>,
        panel: Arc<dyn PanelClient>,
    ) -> Self {
        Self {
            policy,
            registry,
            panel,
        }
    }

    pub async fn handle(
        &self,
        actor: &Actor,
        intent: Intent,
        server_name: &str,
    ) -> Result<Outcome, CommandError> {
        // Authorization comes before name resolution so a denied actor
        // learns nothing about registry contents.
        if !self.policy.allows(actor, server_name) {
            debug!(user_id = actor.user_id, "command denied");
            return Err(CommandError::Unauthorized);
        }

        let Some(server) = self.registry.resolve(server_name) else {
            debug!(server = server_name, "unknown server name");
            return Err(CommandError::NotFound);
        };

        let result = match intent {
            Intent::Start => self.panel.start(&server.panel_id).await.map(|()| {
                Outcome::Started {
                    server: server.name.clone(),
                }
            }),
            Intent::Stop => self.panel.stop(&server.panel_id).await.map(|()| {
                Outcome::Stopped {
                    server: server.name.clone(),
                }
            }),
            Intent::Restart => self.panel.restart(&server.panel_id).await.map(|()| {
                Outcome::Restarted {
                    server: server.name.clone(),
                }
            }),
            Intent::Status => {
                self.panel
                    .status(&server.panel_id)
                    .await
                    .map(|state| Outcome::Status {
                        server: server.name.clone(),
                        state,
                    })
            },
        };

        result.map_err(|e| {
            warn!(server = %server.name, error = %e, "control panel request failed");
            CommandError::Upstream
        })
    }
}
