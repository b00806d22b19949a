//! Discord event handler: command registration, interaction dispatch, and
//! the synchronizer's lifecycle.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use {
    serenity::all::{
        ChannelId, Command, CommandDataOptionValue, CommandInteraction, Context,
        CreateInteractionResponse, CreateInteractionResponseMessage, EventHandler, GuildId,
        Interaction, Ready,
    },
    serenity::async_trait,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use steward_core::{Actor, Dispatcher, PanelClient, ServerRegistry, SyncOptions, Synchronizer};

use crate::{commands, surface::ChannelSurface};

/// Handler for Discord gateway events.
pub struct Handler {
    dispatcher: Arc<Dispatcher>,
    registry: Arc<ServerRegistry>,
    panel: Arc<dyn PanelClient>,
    /// `None` disables the status loop.
    sync_options: Option<SyncOptions>,
    status_channel_id: Option<ChannelId>,
    /// Guild-scoped command registration when set; global otherwise.
    guild_id: Option<GuildId>,
    cancel: CancellationToken,
    /// `ready` fires again after gateway resumes; the synchronizer must
    /// only be spawned once.
    sync_started: AtomicBool,
}

impl Handler {
    #[must_use]
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        registry: Arc<ServerRegistry>,
        panel: Arc<dyn PanelClient>,
        sync_options: Option<SyncOptions>,
        status_channel_id: Option<ChannelId>,
        guild_id: Option<GuildId>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            dispatcher,
            registry,
            panel,
            sync_options,
            status_channel_id,
            guild_id,
            cancel,
            sync_started: AtomicBool::new(false),
        }
    }

    async fn register_commands(&self, ctx: &Context) {
        let definitions = commands::command_definitions(&self.registry.names());
        let result = match self.guild_id {
            Some(guild) => guild.set_commands(&ctx.http, definitions).await,
            None => Command::set_global_commands(&ctx.http, definitions).await,
        };
        match result {
            Ok(registered) => info!(count = registered.len(), "slash commands registered"),
            Err(e) => error!(error = %e, "failed to register slash commands"),
        }
    }

    fn spawn_synchronizer(&self, ctx: &Context) {
        let (Some(options), Some(channel_id)) = (self.sync_options, self.status_channel_id) else {
            debug!("status synchronizer disabled");
            return;
        };
        if self.sync_started.swap(true, Ordering::SeqCst) {
            return;
        }
        let surface = Arc::new(ChannelSurface::new(ctx.http.clone(), channel_id));
        let sync = Synchronizer::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.panel),
            surface,
            options,
        );
        tokio::spawn(sync.run(self.cancel.clone()));
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord bot ready"
        );
        self.register_commands(&ctx).await;
        self.spawn_synchronizer(&ctx);
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };
        let Some(intent) = commands::parse_intent(&command.data.name) else {
            debug!(name = %command.data.name, "ignoring unknown command");
            return;
        };
        let Some(server) = server_option(&command) else {
            // The option is marked required, so this only happens when the
            // registered definitions are stale.
            respond(&ctx, &command, "❌ missing server option".into(), true).await;
            return;
        };

        let actor = Actor::new(command.user.id.get(), member_role_names(&ctx, &command));
        let (content, ephemeral) = match self.dispatcher.handle(&actor, intent, &server).await {
            Ok(outcome) => (commands::format_outcome(&outcome), false),
            Err(err) => (commands::format_error(&err), true),
        };
        respond(&ctx, &command, content, ephemeral).await;
    }
}

/// The required `server` string option.
fn server_option(command: &CommandInteraction) -> Option<String> {
    command
        .data
        .options
        .iter()
        .find(|o| o.name == "server")
        .and_then(|o| match &o.value {
            CommandDataOptionValue::String(s) => Some(s.clone()),
            _ => None,
        })
}

/// Resolve the invoking member's role names from the guild cache.
///
/// DMs and cache misses yield an empty set, which the policy treats as
/// "no roles"; the user-id list still applies.
fn member_role_names(ctx: &Context, command: &CommandInteraction) -> Vec<String> {
    let (Some(guild_id), Some(member)) = (command.guild_id, command.member.as_deref()) else {
        return Vec::new();
    };
    let Some(guild) = ctx.cache.guild(guild_id) else {
        warn!(guild_id = guild_id.get(), "guild not in cache, roles unresolved");
        return Vec::new();
    };
    member
        .roles
        .iter()
        .filter_map(|id| guild.roles.get(id).map(|role| role.name.clone()))
        .collect()
}

async fn respond(ctx: &Context, command: &CommandInteraction, content: String, ephemeral: bool) {
    let message = CreateInteractionResponseMessage::new()
        .content(content)
        .ephemeral(ephemeral);
    if let Err(e) = command
        .create_response(&ctx.http, CreateInteractionResponse::Message(message))
        .await
    {
        warn!(error = %e, "failed to respond to interaction");
    }
}
