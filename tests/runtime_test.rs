//! End-to-end scenarios through the public runtime API

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use switchyard::application::commands::{CommandInvocation, RouteOutcome};
use switchyard::application::events::GatewayNotification;
use switchyard::domain::entities::{Actor, Channel, ChatMessage, Event, EventType, PluginId};
use switchyard::domain::Permission;
use switchyard::infrastructure::adapters::MemoryGateway;
use switchyard::infrastructure::plugins::{Discovery, PluginManifest, PluginRegistry, MANIFEST_FILE};
use switchyard::plugins::{bundled, Plugin, PluginContext, PluginState};
use switchyard::{Bot, BotError, Config, HandlerResult};

/// Registers `ping` replying with its text, ignoring a rejected registration
struct Pinger(&'static str);

#[async_trait]
impl Plugin for Pinger {
    async fn enable(&self, ctx: &PluginContext) -> HandlerResult {
        let reply = self.0;
        let _ = ctx.register_command("ping", "Replies.", Permission::Public, move |_inv: CommandInvocation| async move {
            Ok::<_, BotError>(Some(reply.to_string()))
        });
        Ok(())
    }
}

/// Counts every MessageSent event and schedules a repeating tick
struct Listener {
    messages: Arc<AtomicUsize>,
    ticks: Arc<AtomicUsize>,
}

#[async_trait]
impl Plugin for Listener {
    async fn enable(&self, ctx: &PluginContext) -> HandlerResult {
        let messages = Arc::clone(&self.messages);
        ctx.register_handler(EventType::MessageSent, move |_e: Arc<Event>| {
            let messages = Arc::clone(&messages);
            async move {
                messages.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BotError>(())
            }
        })?;

        let ticks = Arc::clone(&self.ticks);
        ctx.add_repeating_task(Duration::from_secs(1), move || {
            let ticks = Arc::clone(&ticks);
            async move {
                ticks.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BotError>(())
            }
        })
    }
}

struct Harness {
    bot: Bot,
    gateway: Arc<MemoryGateway>,
    messages: Arc<AtomicUsize>,
    ticks: Arc<AtomicUsize>,
}

fn harness(manifests: Vec<PluginManifest>) -> Harness {
    let messages = Arc::new(AtomicUsize::new(0));
    let ticks = Arc::new(AtomicUsize::new(0));

    let mut registry = PluginRegistry::new();
    registry.register("pinger_a", |_m: &PluginManifest| Ok(Arc::new(Pinger("pong")) as Arc<dyn Plugin>));
    registry.register("pinger_b", |_m: &PluginManifest| Ok(Arc::new(Pinger("impostor")) as Arc<dyn Plugin>));
    let (m, t) = (Arc::clone(&messages), Arc::clone(&ticks));
    registry.register("listener", move |_m: &PluginManifest| {
        Ok(Arc::new(Listener {
            messages: Arc::clone(&m),
            ticks: Arc::clone(&t),
        }) as Arc<dyn Plugin>)
    });

    let gateway = Arc::new(MemoryGateway::new());
    let bot = Bot::new(Config::default(), gateway.clone(), registry);
    bot.plugins().load_all(Discovery {
        manifests,
        invalid: Vec::new(),
    });

    Harness {
        bot,
        gateway,
        messages,
        ticks,
    }
}

fn plugin(name: &str, module: &str, deps: &[&str]) -> PluginManifest {
    PluginManifest::new(name)
        .with_module(module)
        .with_dependencies(deps.iter().copied())
}

fn channel_message(author: &Actor, text: &str) -> ChatMessage {
    ChatMessage::new(Channel::text("general", "guild-1"), author.clone(), text)
}

#[tokio::test]
async fn first_ping_registration_wins() {
    let h = harness(vec![plugin("first", "pinger_a", &[]), plugin("second", "pinger_b", &[])]);
    assert_eq!(h.bot.plugins().enable_all().await, 2);
    assert_eq!(
        h.bot.router().describe("ping").map(|c| c.owner),
        Some(PluginId::from("first"))
    );

    let actor = Actor::new("42", "anyone");
    let outcome = h.bot.router().route("!ping", &actor, &channel_message(&actor, "!ping"));
    let RouteOutcome::Dispatched(task) = outcome else {
        panic!("ping was not dispatched");
    };
    assert_eq!(task.reply().await.as_deref(), Some("pong"));
}

#[tokio::test]
async fn command_reply_reaches_the_gateway() {
    let h = harness(vec![plugin("first", "pinger_a", &[])]);
    h.bot.plugins().enable_all().await;

    let actor = Actor::new("42", "anyone");
    for dispatch in h.bot.handle(GatewayNotification::MessageCreated(channel_message(&actor, "!ping"))) {
        dispatch.finished().await;
    }
    tokio::time::timeout(Duration::from_secs(5), h.gateway.wait_for_messages(1))
        .await
        .expect("reply was not sent");
    assert_eq!(h.gateway.texts_for("general"), vec!["pong".to_string()]);
}

#[tokio::test]
async fn disabled_plugin_receives_no_events() {
    let h = harness(vec![plugin("listener", "listener", &[])]);
    h.bot.plugins().enable("listener").await.unwrap();

    let actor = Actor::new("1", "someone");
    let notification = GatewayNotification::MessageCreated(channel_message(&actor, "hello"));
    let dispatches = h.bot.handle(notification.clone());
    assert!(dispatches[0].owners().contains(&PluginId::from("listener")));
    for dispatch in dispatches {
        dispatch.finished().await;
    }
    assert_eq!(h.messages.load(Ordering::SeqCst), 1);

    h.bot.plugins().disable("listener").await.unwrap();
    let dispatches = h.bot.handle(notification);
    assert!(!dispatches[0].owners().contains(&PluginId::from("listener")));
    for dispatch in dispatches {
        dispatch.finished().await;
    }
    assert_eq!(h.messages.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cycle_fails_while_independent_plugin_loads() {
    let h = harness(vec![
        plugin("a", "pinger_a", &["b"]),
        plugin("b", "pinger_b", &["a"]),
        plugin("c", "listener", &[]),
    ]);

    assert_eq!(h.bot.plugins().state("a"), Some(PluginState::Failed));
    assert_eq!(h.bot.plugins().state("b"), Some(PluginState::Failed));
    assert_eq!(h.bot.plugins().state("c"), Some(PluginState::Loaded));
    assert_eq!(h.bot.plugins().enable_all().await, 1);
    assert!(!h.bot.router().contains("ping"));
}

#[tokio::test(start_paused = true)]
async fn repeating_task_stops_after_disable() {
    let h = harness(vec![plugin("listener", "listener", &[])]);
    h.bot.plugins().enable("listener").await.unwrap();
    let scheduler = h.bot.scheduler();

    for expected in 1..=3 {
        tokio::time::advance(Duration::from_secs(1)).await;
        for handle in scheduler.poll_once(tokio::time::Instant::now()) {
            handle.await.unwrap();
        }
        assert_eq!(h.ticks.load(Ordering::SeqCst), expected);
        assert_eq!(scheduler.pending_for(&PluginId::from("listener")), 1);
    }

    h.bot.plugins().disable("listener").await.unwrap();
    assert_eq!(scheduler.pending_count(), 0);

    for _ in 0..3 {
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(scheduler.poll_once(tokio::time::Instant::now()).is_empty());
    }
    assert_eq!(h.ticks.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn disabling_one_plugin_leaves_others_registered() {
    let h = harness(vec![plugin("pinger", "pinger_a", &[]), plugin("listener", "listener", &[])]);
    h.bot.plugins().enable_all().await;
    let router_handlers = 1;
    assert_eq!(h.bot.bus().handler_count(EventType::MessageSent), router_handlers + 1);

    h.bot.plugins().disable("pinger").await.unwrap();
    assert!(!h.bot.router().contains("ping"));
    assert_eq!(h.bot.bus().handler_count(EventType::MessageSent), router_handlers + 1);
    assert_eq!(h.bot.scheduler().pending_for(&PluginId::from("listener")), 1);
    assert_eq!(h.bot.plugins().state("listener"), Some(PluginState::Enabled));
}

fn write_manifest(root: &std::path::Path, dir: &str, yaml: &str) {
    let path = root.join(dir);
    std::fs::create_dir_all(&path).unwrap();
    std::fs::write(path.join(MANIFEST_FILE), yaml).unwrap();
}

#[tokio::test]
async fn bundled_plugins_from_a_plugin_directory() {
    let tmp = tempfile::tempdir().unwrap();
    write_manifest(tmp.path(), "core", "name: core\nversion: 1.0.0\n");
    write_manifest(
        tmp.path(),
        "custom_commands",
        "name: custom_commands\ndependencies: [core]\n",
    );
    write_manifest(tmp.path(), "reminders", "name: reminders\ndependencies: [core]\n");

    let mut config = Config::default();
    config.bot.owner_id = "owner-1".to_string();
    config.plugins.directory = tmp.path().to_path_buf();
    let gateway = Arc::new(MemoryGateway::new());
    let bot = Bot::new(config, gateway.clone(), bundled::registry());
    bot.start().await.unwrap();
    assert_eq!(bot.plugins().order()[0], "core");
    assert_eq!(bot.plugins().state("custom_commands"), Some(PluginState::Enabled));

    let owner = Actor::new("owner-1", "owner");
    let stranger = Actor::new("2", "stranger");
    let route = |actor: &Actor, text: &str| bot.router().route(text, actor, &channel_message(actor, text));

    assert!(matches!(route(&stranger, "!customcommand add hi x"), RouteOutcome::Denied(_)));

    let RouteOutcome::Dispatched(task) = route(&owner, "!customcommand add hi \"hello there\"") else {
        panic!("customcommand was not dispatched");
    };
    assert_eq!(task.reply().await.as_deref(), Some("Command 'hi' created."));
    assert!(tmp.path().join("custom_commands").join("commands.json").exists());

    let RouteOutcome::Dispatched(task) = route(&stranger, "!hi") else {
        panic!("custom command was not registered");
    };
    assert_eq!(task.reply().await.as_deref(), Some("hello there"));

    let RouteOutcome::Dispatched(task) = route(&stranger, "!commands") else {
        panic!("commands was not dispatched");
    };
    let listing = task.reply().await.unwrap_or_default();
    assert!(listing.contains("!hi"));
    assert!(!listing.contains("!resetgame"));

    bot.shutdown().await;
    assert_eq!(bot.plugins().state("core"), Some(PluginState::Disabled));
    assert!(bot.router().is_empty());
}
