//! Binary entry flow: validate config, init logging, declare commands, run until Ctrl-C.

use anyhow::Result;
use chrono::Local;
use command_registry::{CommandRegistry, HelpHandler};
use dbot_core::{init_tracing, CommandHandler, OutboundMessage};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::bot::TelegramBot;
use crate::config::BotConfig;
use crate::greetings::{declare_greetings, ByeHandler, HelloHandler};

/// Registry with the demo commands and `/help`, all in the configured menu.
pub fn build_registry(config: &BotConfig) -> Result<Arc<CommandRegistry>> {
    let registry = Arc::new(CommandRegistry::new());
    declare_greetings(&registry, &config.menu_command)?;
    HelpHandler::declare(&registry, Some(&config.menu_command))?;
    Ok(registry)
}

/// Main entry: validate, init logging, start the workers, greet the default chat, then stop on
/// Ctrl-C and wait for the workers to drain.
#[instrument(skip(config))]
pub async fn run_bot(config: BotConfig) -> Result<()> {
    config.validate()?;
    init_tracing(config.log_file())?;

    let token: String = config.bot_token().chars().take(10).collect();
    info!(
        start_time = %Local::now().format("%Y-%m-%d %H:%M:%S"),
        token = %format!("{}...", token),
        chat_id = %config.chat_id,
        log_file = %config.log_file(),
        "Initializing bot"
    );

    let registry = build_registry(&config)?;
    let handlers: Vec<Arc<dyn CommandHandler>> = vec![
        Arc::new(HelloHandler),
        Arc::new(ByeHandler),
        Arc::new(HelpHandler::new(registry.clone())),
    ];
    let bot = TelegramBot::new(&config, registry, handlers)?;
    bot.start();
    bot.send_message(
        OutboundMessage::text(format!(
            "Bot started. Send {} to see the available commands.",
            config.menu_command
        ))
        .with_chat_id(config.chat_id.clone()),
    );
    info!("Bot started successfully");

    tokio::signal::ctrl_c().await?;
    info!("step: Ctrl-C received, stopping");
    bot.stop();
    bot.join().await;
    Ok(())
}
