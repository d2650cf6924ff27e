//! Core plugin - bot information, plugin listing and presence

use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::application::commands::CommandInvocation;
use crate::application::errors::{BotError, HandlerResult};
use crate::application::isolation::recover;
use crate::application::scheduler::SetPresence;
use crate::domain::entities::{Event, EventType};
use crate::domain::Permission;
use crate::plugins::{Plugin, PluginContext, PluginState};

pub const MODULE: &str = "core";

const PRESENCE_DELAY: Duration = Duration::from_secs(10);

#[derive(Default)]
pub struct CorePlugin {
    started: Arc<Mutex<Option<Instant>>>,
}

impl CorePlugin {
    pub fn new() -> Self {
        Self::default()
    }
}

fn presence_text(ctx: &PluginContext) -> String {
    format!("{} v{}", ctx.config().bot.name, env!("CARGO_PKG_VERSION"))
}

fn schedule_presence(ctx: &PluginContext) -> HandlerResult {
    ctx.add_task(PRESENCE_DELAY, SetPresence::new(ctx.gateway(), presence_text(ctx)))
}

/// "1 days, 2 hours, 3 minutes, and 4 seconds"
pub fn format_uptime(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let (days, rest) = (total / 86_400, total % 86_400);
    let (hours, rest) = (rest / 3_600, rest % 3_600);
    let (minutes, seconds) = (rest / 60, rest % 60);
    format!(
        "{} days, {} hours, {} minutes, and {} seconds",
        days, hours, minutes, seconds
    )
}

fn info_text(ctx: &PluginContext) -> String {
    let plugins = ctx.plugin_summaries();
    let enabled = plugins.iter().filter(|p| p.state == PluginState::Enabled).count();
    let bot = ctx.gateway().bot_info();
    format!(
        "```{} version {}\nConnected as {} ({}).\n{} plugins installed, {} enabled.```",
        ctx.config().bot.name,
        env!("CARGO_PKG_VERSION"),
        bot.name,
        bot.id,
        plugins.len(),
        enabled
    )
}

fn plugins_text(ctx: &PluginContext) -> String {
    let mut message = String::from("```\n");
    for plugin in ctx.plugin_summaries() {
        let _ = writeln!(message, "{}", plugin.name);
        let _ = writeln!(message, "\tVersion: {}", plugin.version);
        let _ = writeln!(message, "\tDeveloper: {}", plugin.developer);
        let _ = writeln!(message, "\tDependencies: {}", plugin.dependencies.join(", "));
        match plugin.reason {
            Some(reason) => {
                let _ = writeln!(message, "\tState: {} ({})", plugin.state, reason);
            }
            None => {
                let _ = writeln!(message, "\tState: {}", plugin.state);
            }
        }
    }
    message.push_str("```");
    message
}

#[async_trait]
impl Plugin for CorePlugin {
    async fn enable(&self, ctx: &PluginContext) -> HandlerResult {
        *recover(self.started.lock()) = Some(Instant::now());
        let owner = Permission::owner(ctx.config().bot.owner_id.clone());

        let on_ready = ctx.clone();
        ctx.register_handler(EventType::Ready, move |_event: Arc<Event>| {
            let ctx = on_ready.clone();
            async move { schedule_presence(&ctx) }
        })?;

        let info_ctx = ctx.clone();
        ctx.register_command(
            "info",
            "Gets general information about the bot.",
            Permission::Public,
            move |_inv: CommandInvocation| {
                let text = info_text(&info_ctx);
                async move { Ok::<_, BotError>(Some(text)) }
            },
        )?;

        let plugins_ctx = ctx.clone();
        ctx.register_command(
            "plugins",
            "Views the currently installed plugins.",
            Permission::Public,
            move |_inv: CommandInvocation| {
                let text = plugins_text(&plugins_ctx);
                async move { Ok::<_, BotError>(Some(text)) }
            },
        )?;

        let started = Arc::clone(&self.started);
        ctx.register_command(
            "uptime",
            "Displays the bot's uptime.",
            Permission::Public,
            move |_inv: CommandInvocation| {
                let elapsed = recover(started.lock())
                    .map(|at| at.elapsed())
                    .unwrap_or_default();
                async move {
                    Ok::<_, BotError>(Some(format!("The bot has been up for {}.", format_uptime(elapsed))))
                }
            },
        )?;

        let commands_ctx = ctx.clone();
        ctx.register_command(
            "commands",
            "Displays what commands you have access to.",
            Permission::Public,
            move |inv: CommandInvocation| {
                let prefix = commands_ctx.command_prefix().to_string();
                let lines: Vec<String> = commands_ctx
                    .available_commands(&inv.actor)
                    .into_iter()
                    .map(|c| format!("{}{}: {}", prefix, c.name, c.description))
                    .collect();
                async move { Ok::<_, BotError>(Some(format!("```\n{}\n```", lines.join("\n")))) }
            },
        )?;

        let reset_ctx = ctx.clone();
        ctx.register_command(
            "resetgame",
            "Resets the presence line to the default one.",
            owner,
            move |_inv: CommandInvocation| {
                let scheduled = schedule_presence(&reset_ctx);
                async move { scheduled.map(|()| None::<String>) }
            },
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_is_split_into_units() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0 days, 0 hours, 0 minutes, and 0 seconds");
        assert_eq!(
            format_uptime(Duration::from_secs(86_400 + 2 * 3_600 + 3 * 60 + 4)),
            "1 days, 2 hours, 3 minutes, and 4 seconds"
        );
    }
}
