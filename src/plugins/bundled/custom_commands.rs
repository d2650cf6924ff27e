//! Custom commands - chat-managed commands that reply with stored text

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::application::commands::CommandInvocation;
use crate::application::errors::{BotError, HandlerResult};
use crate::application::isolation::recover;
use crate::domain::entities::Capability;
use crate::domain::traits::{Row, RowStore};
use crate::domain::Permission;
use crate::infrastructure::storage::JsonRowStore;
use crate::plugins::{Plugin, PluginContext};

pub const MODULE: &str = "custom_commands";

const STORE_FILE: &str = "commands.json";
const CUSTOM_DESCRIPTION: &str = "A custom command from the Custom Commands plugin.";

#[derive(Default)]
pub struct CustomCommandsPlugin {
    store: Mutex<Option<Arc<dyn RowStore>>>,
}

impl CustomCommandsPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `store` instead of the JSON file in the plugin directory
    pub fn with_store(store: Arc<dyn RowStore>) -> Self {
        Self {
            store: Mutex::new(Some(store)),
        }
    }

    async fn store(&self, ctx: &PluginContext) -> HandlerResult<Arc<dyn RowStore>> {
        if let Some(store) = recover(self.store.lock()).clone() {
            return Ok(store);
        }
        let opened: Arc<dyn RowStore> = Arc::new(JsonRowStore::open(ctx.data_dir().join(STORE_FILE)).await?);
        *recover(self.store.lock()) = Some(Arc::clone(&opened));
        Ok(opened)
    }
}

fn command_row(name: &str, message: &str) -> Row {
    let mut row = Row::new();
    row.insert("command".to_string(), Value::String(name.to_string()));
    row.insert("message".to_string(), Value::String(message.to_string()));
    row
}

fn register_stored(ctx: &PluginContext, name: &str, message: String) -> HandlerResult {
    ctx.register_command(name, CUSTOM_DESCRIPTION, Permission::Public, move |_inv: CommandInvocation| {
        let reply = message.clone();
        async move { Ok::<_, BotError>(Some(reply)) }
    })
}

const USAGE: &str = "Usage: customcommand add <name> <message> | customcommand remove <name>";

async fn manage(ctx: &PluginContext, store: &dyn RowStore, args: &[String]) -> HandlerResult<Option<String>> {
    match args {
        [action, name, message @ ..] if action == "add" && !message.is_empty() => {
            if ctx.command_exists(name) {
                return Ok(Some("That command is already registered in the command registry.".to_string()));
            }
            let message = message.join(" ");
            if let Err(e) = register_stored(ctx, name, message.clone()) {
                return Ok(Some(format!("Command '{}' not created: {}", name, e)));
            }
            if let Err(e) = store.insert(command_row(name, &message)).await {
                ctx.unregister_command(name);
                return Err(e.into());
            }
            Ok(Some(format!("Command '{}' created.", name)))
        }
        [action, name] if action == "remove" => {
            let removed = store.remove_eq("command", &Value::String(name.clone())).await?;
            if removed == 0 {
                return Ok(Some("That command does not exist.".to_string()));
            }
            ctx.unregister_command(name);
            Ok(Some(format!("Command '{}' removed.", name)))
        }
        _ => Ok(Some(USAGE.to_string())),
    }
}

#[async_trait]
impl Plugin for CustomCommandsPlugin {
    async fn enable(&self, ctx: &PluginContext) -> HandlerResult {
        let store = self.store(ctx).await?;

        let manage_ctx = ctx.clone();
        let manage_store = Arc::clone(&store);
        ctx.register_command(
            "customcommand",
            "Manage custom commands.",
            Permission::any_of([
                Permission::Capability(Capability::ManageMessages),
                Permission::owner(ctx.config().bot.owner_id.clone()),
            ]),
            move |inv: CommandInvocation| {
                let ctx = manage_ctx.clone();
                let store = Arc::clone(&manage_store);
                async move { manage(&ctx, store.as_ref(), &inv.args).await }
            },
        )?;

        for row in store.select_all().await? {
            let (Some(Value::String(name)), Some(Value::String(message))) = (row.get("command"), row.get("message")) else {
                tracing::warn!(plugin = %ctx.plugin_id(), "skipping malformed custom command row");
                continue;
            };
            if let Err(e) = register_stored(ctx, name, message.clone()) {
                tracing::warn!(plugin = %ctx.plugin_id(), command = %name, "custom command not registered: {}", e);
            }
        }

        Ok(())
    }
}
