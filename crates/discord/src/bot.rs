use std::sync::Arc;

use {
    secrecy::ExposeSecret,
    serenity::all::{ChannelId, Client, GatewayIntents, GuildId},
    tokio_util::sync::CancellationToken,
    tracing::info,
};

use {
    steward_config::StewardConfig,
    steward_core::{Dispatcher, PanelClient, ServerRegistry, SyncOptions},
};

use crate::{
    error::{Context as _, Result},
    handler::Handler,
};

/// Connect to the Discord gateway and run until the token is cancelled or
/// the gateway connection dies.
///
/// Slash commands are the only inbound surface, so the `GUILDS` intent is
/// enough; role resolution comes from the guild cache it populates.
pub async fn run(
    config: &StewardConfig,
    dispatcher: Arc<Dispatcher>,
    registry: Arc<ServerRegistry>,
    panel: Arc<dyn PanelClient>,
    cancel: CancellationToken,
) -> Result<()> {
    let sync_options = config
        .sync
        .enabled
        .then(|| SyncOptions::from(&config.sync));
    let handler = Handler::new(
        dispatcher,
        registry,
        panel,
        sync_options,
        config.discord.status_channel_id.map(ChannelId::new),
        config.discord.guild_id.map(GuildId::new),
        cancel.clone(),
    );

    let mut client = Client::builder(config.discord.token.expose_secret(), GatewayIntents::GUILDS)
        .event_handler(handler)
        .await
        .context("failed to build discord client")?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        cancel.cancelled().await;
        info!("shutting down discord gateway");
        shard_manager.shutdown_all().await;
    });

    client.start().await?;
    Ok(())
}
