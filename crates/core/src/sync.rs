//! Periodic status reconciliation: poll every managed server, reflect the
//! aggregate into the chat surface name.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use {
    tokio::time::{self, MissedTickBehavior},
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use steward_config::SyncConfig;

use crate::{
    panel::{PanelClient, PowerState},
    registry::ServerRegistry,
    surface::StatusSurface,
};

/// Floor on the surface update interval.
///
/// Discord allows roughly 2 channel renames per 10 minutes per channel, so
/// the loop never runs faster than one cycle per 5 minutes and never issues
/// two renames closer together than that.
pub const MIN_UPDATE_INTERVAL: Duration =
    Duration::from_secs(steward_config::MIN_UPDATE_INTERVAL_SECS);

/// Synchronizer timing knobs, from config.
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub interval: Duration,
}

impl From<&SyncConfig> for SyncOptions {
    fn from(cfg: &SyncConfig) -> Self {
        Self {
            interval: Duration::from_secs(cfg.update_interval_secs),
        }
    }
}

/// Most recently observed state of one managed server. Kept only to detect
/// changes; there is no history.
#[derive(Debug, Clone, Copy)]
pub struct StatusSnapshot {
    pub state: PowerState,
    pub captured_at: Instant,
}

/// Polls every registered server on a fixed interval and renames the chat
/// surface when the aggregate label changes.
///
/// Runs as a single task; ticks never overlap because the loop awaits each
/// cycle's network calls before the timer can fire again.
pub struct Synchronizer {
    registry: Arc<ServerRegistry>,
    panel: Arc<dyn PanelClient>,
    surface: Arc<dyn StatusSurface>,
    interval: Duration,
    rename_cooldown: Duration,
    snapshots: HashMap<String, StatusSnapshot>,
    /// Label most recently written to the surface.
    last_label: Option<String>,
    last_rename: Option<Instant>,
}

impl Synchronizer {
    #[must_use]
    pub fn new(
        registry: Arc<ServerRegistry>,
        panel: Arc<dyn PanelClient>,
        surface: Arc<dyn StatusSurface>,
        options: SyncOptions,
    ) -> Self {
        let interval = options.interval.max(MIN_UPDATE_INTERVAL);
        if interval != options.interval {
            warn!(
                configured_secs = options.interval.as_secs(),
                floor_secs = MIN_UPDATE_INTERVAL.as_secs(),
                "update interval below the platform floor, clamping"
            );
        }
        Self {
            registry,
            panel,
            surface,
            interval,
            rename_cooldown: MIN_UPDATE_INTERVAL,
            snapshots: HashMap::new(),
            last_label: None,
            last_rename: None,
        }
    }

    /// Run until cancelled. Cancellation is observed between ticks; an
    /// in-flight tick finishes its snapshot writes first.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_secs = self.interval.as_secs(),
            servers = self.registry.len(),
            "status synchronizer started"
        );
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("status synchronizer stopped");
                    return;
                }
                _ = ticker.tick() => self.tick().await,
            }
        }
    }

    /// One reconciliation cycle: poll every server, then push the label.
    ///
    /// A poll failure degrades that server to `Unknown` and moves on; one
    /// unreachable server must not abort the cycle or disturb the others.
    async fn tick(&mut self) {
        let registry = Arc::clone(&self.registry);
        for server in registry.servers() {
            let state = match self.panel.status(&server.panel_id).await {
                Ok(state) => state,
                Err(e) => {
                    debug!(server = %server.name, error = %e, "status poll failed");
                    PowerState::Unknown
                },
            };

            let previous = self.snapshots.get(&server.name).map(|s| s.state);
            if previous != Some(state) {
                info!(server = %server.name, state = %state, "server state changed");
            }
            self.snapshots.insert(server.name.clone(), StatusSnapshot {
                state,
                captured_at: Instant::now(),
            });
        }

        self.push_label().await;
    }

    /// Write the aggregate label to the surface: at most one rename per
    /// tick no matter how many servers changed, skipped entirely when the
    /// label is unchanged, and deferred while the platform cooldown holds
    /// (a later tick picks the change up).
    async fn push_label(&mut self) {
        let states: Vec<PowerState> = self
            .registry
            .servers()
            .map(|server| {
                self.snapshots
                    .get(&server.name)
                    .map_or(PowerState::Unknown, |snap| snap.state)
            })
            .collect();
        let label = render_label(&states);

        if self.last_label.as_deref() == Some(label.as_str()) {
            return;
        }
        if let Some(last) = self.last_rename {
            if last.elapsed() < self.rename_cooldown {
                debug!(label = %label, "rename cooldown not reached, deferring");
                return;
            }
        }

        match self.surface.rename(&label).await {
            Ok(()) => {
                debug!(label = %label, "status surface renamed");
                self.last_label = Some(label);
                self.last_rename = Some(Instant::now());
            },
            Err(e) => {
                // last_label stays stale so the next tick retries.
                warn!(error = %e, "status surface rename failed");
            },
        }
    }
}

/// Aggregate label across all managed servers, e.g. "🟢 2/5 online".
#[must_use]
pub fn render_label(states: &[PowerState]) -> String {
    let total = states.len();
    let running = states
        .iter()
        .filter(|s| **s == PowerState::Running)
        .count();
    let unknown = states
        .iter()
        .filter(|s| **s == PowerState::Unknown)
        .count();

    if total > 0 && unknown == total {
        return "🔄 checking servers".to_string();
    }
    let icon = if running > 0 {
        "🟢"
    } else {
        "🔴"
    };
    if unknown > 0 {
        format!("{icon} {running}/{total} online ({unknown} unknown)")
    } else {
        format!("{icon} {running}/{total} online")
    }
}
