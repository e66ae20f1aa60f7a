use anyhow::Result;
use dotenvy::dotenv;
use log::{debug, error, info, warn};
use serenity::async_trait;
use serenity::model::application::command::CommandPermission;
use serenity::model::application::interaction::Interaction;
use serenity::model::gateway::Ready;
use serenity::model::guild::Guild;
use serenity::prelude::*;
use std::sync::Arc;

use slasher::commands::slash::SlashCommandCategory;
use slasher::core::response::ResponseModifier;
use slasher::model::{ApplicationCommandOptionChoice, ApplicationCommandTargetType};
use slasher::serenity_api::{command_permission, interaction_event, HttpDiscordApi};
use slasher::{
    Arguments, BotConfig, CustomIdCommand, InteractionContext, ParameterConverter, ParameterType,
    Slasher, SlasherConfig, SlashCommand, SlashCommandFunction,
};

const FLOWERS: &[&str] = &["sunflower", "hydrangea", "lily of the valley", "morning glory", "rose"];

struct Handler {
    slasher: Slasher,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());

        let guild_ids: Vec<u64> = ready.guilds.iter().map(|guild| guild.id.0).collect();
        let slasher = self.slasher.clone();
        tokio::spawn(async move {
            slasher.on_ready(guild_ids).await;
        });
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, is_new: bool) {
        debug!("Guild available: {} ({}, new: {is_new})", guild.name, guild.id);
        self.slasher.on_guild_join(guild.id.0).await;
    }

    async fn application_command_permissions_update(
        &self,
        _ctx: Context,
        permission: CommandPermission,
    ) {
        match command_permission(&permission) {
            Ok(permission) => self
                .slasher
                .on_application_command_permission_update(permission),
            Err(e) => warn!("Failed to read permission update: {e}"),
        }
    }

    async fn interaction_create(&self, _ctx: Context, interaction: Interaction) {
        match interaction_event(&interaction) {
            Ok(event) => self.slasher.dispatch(event).await,
            Err(e) => error!("❌ Failed to read interaction: {e}"),
        }
    }
}

fn yuuka() -> Result<SlashCommand> {
    let mut command = SlashCommand::new("yuuka", "Visit the flower garden")?;

    let wriggle = SlashCommandFunction::new(
        "wriggle",
        "Call a firefly over",
        |ctx: InteractionContext, _args: Arguments| async move {
            let caller = ctx
                .user_id()
                .map(|id| format!("<@{id}>"))
                .unwrap_or_else(|| "someone".to_string());
            anyhow::Ok(Some(format!("🐛 Wriggle flies over to {caller}")))
        },
    )?;
    command.add_function(None, wriggle)?;

    let garden = command.add_category(None, SlashCommandCategory::new("garden", "Tend the garden")?)?;
    let plant = SlashCommandFunction::new(
        "plant",
        "Plant a flower",
        |_ctx: InteractionContext, args: Arguments| async move {
            let flower = args.string("flower").unwrap_or("sunflower").to_string();
            let count = args.integer("count").unwrap_or(1);
            anyhow::Ok(Some(format!("🌻 Planted {count} {flower}")))
        },
    )?
    .parameter(ParameterConverter::new("flower", ParameterType::String, "What to plant")?)?
    .parameter(
        ParameterConverter::new("count", ParameterType::Integer, "How many")?
            .optional()
            .value_range(Some(1.0), Some(25.0)),
    )?;
    command.add_function(Some(garden), plant)?;

    let water = SlashCommandFunction::new(
        "water",
        "Water the garden",
        |_ctx: InteractionContext, _args: Arguments| async move {
            anyhow::Ok(Some("💧 The garden is watered".to_string()))
        },
    )?
    .response_modifier(ResponseModifier::ephemeral());
    command.add_function(Some(garden), water)?;

    Ok(command.global())
}

fn wave() -> Result<SlashCommand> {
    let command = SlashCommand::context(
        ApplicationCommandTargetType::User,
        "Wave",
        |ctx: InteractionContext, _args: Arguments| async move {
            let target = ctx
                .target_id()
                .map(|id| format!("<@{id}>"))
                .unwrap_or_default();
            anyhow::Ok(Some(format!("👋 Waving at {target}")))
        },
    )?;
    Ok(command.global())
}

fn register(slasher: &Slasher, guild_id: Option<u64>) -> Result<()> {
    slasher.auto_complete(&["flower"], |_ctx: InteractionContext, value: String| async move {
        let value = value.to_lowercase();
        anyhow::Ok(
            FLOWERS
                .iter()
                .filter(|flower| flower.contains(value.as_str()))
                .map(|flower| ApplicationCommandOptionChoice::named(*flower))
                .collect::<Vec<_>>(),
        )
    })?;

    let yuuka = slasher.add_command(yuuka()?);
    info!("🌸 Registered {}", yuuka.mention());
    slasher.add_command(wave()?);

    if let Some(guild_id) = guild_id {
        let ping = SlashCommand::from_function(SlashCommandFunction::new(
            "ping",
            "Check that the bot answers",
            |_ctx: InteractionContext, _args: Arguments| async move {
                anyhow::Ok(Some("🏓 Pong".to_string()))
            },
        )?);
        slasher.add_command(ping.guilds([guild_id]));
        info!("🔧 Development command registered in guild {guild_id}");
    }

    slasher.add_component_command(
        CustomIdCommand::new("page", |_ctx: InteractionContext, captures: Vec<String>| async move {
            anyhow::Ok(Some(format!("📄 Page {}", captures[0])))
        })
        .pattern(r"page_(\d+)")?,
    )?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = BotConfig::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting slasher demo bot...");

    let slasher_config = match SlasherConfig::load(&config.slasher_config_path) {
        Ok(slasher_config) => slasher_config,
        Err(e) => {
            if std::path::Path::new(&config.slasher_config_path).exists() {
                error!("❌ Failed to load {}: {e}", config.slasher_config_path);
                return Err(e);
            }
            info!(
                "📄 No slasher config found at {} - using defaults",
                config.slasher_config_path
            );
            SlasherConfig::default()
        }
    };

    let api = HttpDiscordApi::new(
        config.discord_token.clone(),
        config.application_id,
        config.client_secret.clone(),
    )?;
    let slasher = Slasher::new(Arc::new(api), slasher_config);
    register(&slasher, config.discord_guild_id)?;

    let intents = GatewayIntents::GUILDS;
    let mut client = Client::builder(&config.discord_token, intents)
        .application_id(config.application_id)
        .event_handler(Handler { slasher })
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Establishing WebSocket connection to Discord gateway...");
    if let Err(e) = client.start().await {
        error!("❌ Client error: {e}");
        return Err(e.into());
    }

    Ok(())
}
