//! Reminders - one-shot and repeating messages through the scheduler

use async_trait::async_trait;
use std::time::Duration;

use crate::application::commands::CommandInvocation;
use crate::application::errors::{BotError, HandlerResult};
use crate::application::scheduler::SendMessage;
use crate::domain::entities::Capability;
use crate::domain::Permission;
use crate::plugins::{Plugin, PluginContext};

pub const MODULE: &str = "reminders";

#[derive(Default)]
pub struct RemindersPlugin;

impl RemindersPlugin {
    pub fn new() -> Self {
        Self
    }
}

/// `<seconds> <text...>` into a delay and the text
pub fn parse_schedule(args: &[String]) -> Result<(Duration, String), BotError> {
    let [seconds, text @ ..] = args else {
        return Err(BotError::InvalidArgs("expected <seconds> <text>".to_string()));
    };
    let seconds: u64 = seconds
        .parse()
        .map_err(|_| BotError::InvalidArgs(format!("{:?} is not a number of seconds", seconds)))?;
    if seconds == 0 || text.is_empty() {
        return Err(BotError::InvalidArgs("expected <seconds> <text>".to_string()));
    }
    Ok((Duration::from_secs(seconds), text.join(" ")))
}

#[async_trait]
impl Plugin for RemindersPlugin {
    async fn enable(&self, ctx: &PluginContext) -> HandlerResult {
        let remind_ctx = ctx.clone();
        ctx.register_command(
            "remind",
            "Sends a message after a number of seconds.",
            Permission::Public,
            move |inv: CommandInvocation| {
                let reply = match parse_schedule(&inv.args) {
                    Ok((delay, text)) => {
                        let task = SendMessage::new(remind_ctx.gateway(), inv.message.channel.id.clone(), text);
                        remind_ctx
                            .add_task(delay, task)
                            .map(|()| format!("I'll remind you in {} seconds.", delay.as_secs()))
                    }
                    Err(e) => Ok(e.to_string()),
                };
                async move { reply.map(Some) }
            },
        )?;

        let every_ctx = ctx.clone();
        ctx.register_command(
            "every",
            "Sends a message repeatedly, every number of seconds.",
            Permission::any_of([
                Permission::Capability(Capability::ManageMessages),
                Permission::owner(ctx.config().bot.owner_id.clone()),
            ]),
            move |inv: CommandInvocation| {
                let reply = match parse_schedule(&inv.args) {
                    Ok((interval, text)) => {
                        let task = SendMessage::new(every_ctx.gateway(), inv.message.channel.id.clone(), text);
                        every_ctx
                            .add_repeating_task(interval, task)
                            .map(|()| format!("Repeating every {} seconds.", interval.as_secs()))
                    }
                    Err(e) => Ok(e.to_string()),
                };
                async move { reply.map(Some) }
            },
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::CommandParser;

    fn args(text: &str) -> Vec<String> {
        CommandParser::new("!").parse(text).unwrap().args
    }

    #[test]
    fn schedule_arguments_parse() {
        let (delay, text) = parse_schedule(&args("!remind 30 stand up")).unwrap();
        assert_eq!(delay, Duration::from_secs(30));
        assert_eq!(text, "stand up");

        let (_, text) = parse_schedule(&args("!every 5 \"drink water\" now")).unwrap();
        assert_eq!(text, "drink water now");
    }

    #[test]
    fn bad_schedule_arguments_are_rejected() {
        for bad in ["!remind", "!remind soon x", "!remind 0 x", "!remind 5"] {
            assert!(matches!(parse_schedule(&args(bad)), Err(BotError::InvalidArgs(_))));
        }
    }
}
