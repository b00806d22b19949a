use std::sync::Arc;

use {
    async_trait::async_trait,
    serenity::all::{ChannelId, EditChannel},
    serenity::http::Http,
};

use steward_core::{StatusSurface, SurfaceError};

/// Status surface backed by a Discord channel or category: the aggregate
/// label becomes the channel name.
pub struct ChannelSurface {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl ChannelSurface {
    #[must_use]
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl StatusSurface for ChannelSurface {
    async fn rename(&self, label: &str) -> Result<(), SurfaceError> {
        self.channel_id
            .edit(&self.http, EditChannel::new().name(label))
            .await
            .map(drop)
            .map_err(|e| SurfaceError::external("rename status channel", e))
    }
}
