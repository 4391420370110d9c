//! Chat command handlers and the default command set

use std::fmt::Write;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::application::services::AddOutcome;
use crate::domain::entities::{Command, CommandContext, CommandRegistry, MoAttributes};
use super::parser::{self, SubscriptionAction};

/// Name of the command used as the global fallback
pub const HELP_COMMAND: &str = "/help";

pub fn greeting(sender: &str) -> String {
    format!("Hi {} 🤖 !", sender)
}

/// Reply used whenever the controller cannot be queried
pub fn unreachable(sender: &str) -> String {
    format!("{}. I could not reach the APIC... Are there any issues?", greeting(sender))
}

/// Reply for a known verb with arguments that did not parse
pub fn usage(sender: &str, command: &Command) -> String {
    format!(
        "Hi {} 🤖 \n I could not fully understand the input\n Please check the usage of the <code>{}</code> command:\n <ul><li>{}</li></ul>\n",
        sender, command.name, command.help
    )
}

/// Listing of every command, in the order given
pub fn render_help(sender: &str, listing: &[(String, String)]) -> String {
    let mut res = format!("Hello {}, How can I help you?\n\n<ul>", sender);
    for (name, help) in listing {
        let _ = write!(res, "<li><code>{}</code>\t->\t{}</li>", name, help);
    }
    res.push_str("</ul>");
    res
}

/// Build the registry with every supported command
pub fn default_commands() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    tracing::info!("Adding `/info` command");
    registry.register(Command::new("/info", "Get Fabric Information ℹ️", "^/info", "$", info));
    tracing::info!("Adding `/cpu` command");
    registry.register(Command::new("/cpu", "Get APIC CPU Information 💾", "^/cpu", "$", cpu));
    tracing::info!("Adding `/ep` command");
    registry.register(Command::new(
        "/ep",
        "Get APIC Endpoint Information 💻. Usage <code>/ep [ep_mac] </code>",
        "^/ep",
        " ([[:xdigit:]]{2}[:.-]?){5}[[:xdigit:]]{2}$",
        endpoint,
    ));
    tracing::info!("Adding `/neigh` command");
    registry.register(Command::new(
        "/neigh",
        "Get Fabric Topology Information 🔢. Usage <code>/neigh [node_id] </code>",
        "^/neigh",
        "( [0-9]+| all)?$",
        neighbors,
    ));
    tracing::info!("Adding `/faults` command");
    registry.register(Command::new(
        "/faults",
        "Get Fabric latest faults ⚠️. Usage <code>/faults [count(1-10):opt] </code>",
        "^/faults",
        "( [^ ]+)?$",
        faults,
    ));
    tracing::info!("Adding `/events` command");
    registry.register(Command::new(
        "/events",
        "Get Fabric latest events ❎. Usage <code>/events [user:opt] [count(1-10):opt] </code>",
        "^/events",
        "( [A-Za-z0-9_.@-]+)?( [0-9]+)?$",
        events,
    ));
    tracing::info!("Adding `/websocket` command");
    registry.register(Command::new(
        "/websocket",
        "Subscribe to Fabric events 📩. Usage <code>/websocket [class|list] [rm:opt] </code>",
        "^/websocket",
        " (list|[a-zA-Z][a-zA-Z0-9]*( rm)?)$",
        websocket,
    ));

    tracing::info!("Adding `/help` command");
    let help_text = "Chatbot Help ❔";
    let mut listing = registry.listing();
    listing.push((HELP_COMMAND.to_string(), help_text.to_string()));
    listing.sort();
    let listing = Arc::new(listing);
    registry.register(Command::new(HELP_COMMAND, help_text, "^/help", "$", move |ctx| {
        let listing = listing.clone();
        Box::pin(async move { render_help(&ctx.message.sender_name, &listing) })
    }));

    registry
}

/// /info
pub fn info(ctx: CommandContext) -> BoxFuture<'static, String> {
    Box::pin(async move {
        let sender = &ctx.message.sender_name;
        let info = match ctx.controller.fabric_summary().await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!("Error while connecting to the APIC: {}", e);
                return unreachable(sender);
            }
        };

        let mut res = format!(
            "\nThis is the general information of the Fabric <code>{}</code> ({}): \n\n",
            info.name, info.url
        );
        let _ = write!(res, "<ul><li>Current Health Score: <strong>{}</strong></li>", info.health);
        res.push_str("<li><strong>APIC Controllers</strong><ul>");
        for apic in &info.controllers {
            let _ = write!(res, "<li>{} (<strong>{}</strong>)</li>", apic.name, apic.version);
        }
        res.push_str("</ul></li><li><strong>Pods</strong><ul>");
        for pod in &info.pods {
            let _ = write!(res, "<li>Pod{} <em>{}</em></li>", pod.id, pod.kind);
        }
        res.push_str("</ul></li><li><strong>Switches</strong><ul>");
        let _ = write!(res, "<li># of Spines : <strong>{}</strong></li>", info.spines.len());
        let _ = write!(res, "<li># of Leafs : <strong>{}</strong></li>", info.leafs.len());
        res.push_str("</ul></li></ul>");

        format!("{}\n\n{}", greeting(sender), res)
    })
}

/// /cpu
pub fn cpu(ctx: CommandContext) -> BoxFuture<'static, String> {
    Box::pin(async move {
        let sender = &ctx.message.sender_name;
        let procs = match ctx.controller.process_entities().await {
            Ok(procs) => procs,
            Err(e) => {
                tracing::warn!("Error while connecting to the APIC: {}", e);
                return unreachable(sender);
            }
        };
        if procs.is_empty() {
            return format!("{}\n I could not find any controller CPU information", greeting(sender));
        }

        let mut res = String::from("\nThis is the CPU information of the controllers: \n\n<ul>");
        for p in &procs {
            let mem = p
                .mem_free_pct()
                .map(|pct| format!("{:.2}", pct))
                .unwrap_or_else(|| "n/a".to_string());
            let _ = write!(
                res,
                "<li><code>APIC {}</code> -> \t💻 <strong>CPU: </strong>{}\t💾 <strong>Memory %: </strong> {}</li>",
                p.node, p.cpu_pct, mem
            );
        }
        res.push_str("</ul>");

        format!("{}\n\n{}", greeting(sender), res)
    })
}

/// /ep <mac>
pub fn endpoint(ctx: CommandContext) -> BoxFuture<'static, String> {
    Box::pin(async move {
        let sender = &ctx.message.sender_name;
        let args = parser::endpoint_args(&ctx.message.text);
        let endpoints = match ctx.controller.endpoint_info(&args.mac).await {
            Ok(endpoints) => endpoints,
            Err(e) => {
                tracing::warn!("Error while connecting to the APIC: {}", e);
                return unreachable(sender);
            }
        };
        if endpoints.is_empty() {
            return format!(
                "{}\n I could not find the Endpoint <code>{}</code> in the Fabric",
                greeting(sender),
                args.mac
            );
        }

        let mut res = format!(
            "\nThis is the information for the Endpoint <code>{}</code><ul>",
            args.mac
        );
        for ep in &endpoints {
            let _ = write!(res, "<li><strong>Tenant</strong>: {}</li>", ep.tenant);
            let _ = write!(res, "<li><strong>Application Profile</strong>: {}</li>", ep.app);
            let _ = write!(res, "<li><strong>EPG</strong>: {}</li>", ep.epg);
            for (idx, loc) in ep.locations.iter().enumerate() {
                let _ = write!(
                    res,
                    "<li><strong>Location {}</strong>: </li><ul><li><strong>Pod</strong>: {}  <strong>Node</strong>: {}  <strong>Type</strong>: {}  <strong>Port</strong>: {}</li></ul>",
                    idx + 1,
                    loc.pod,
                    loc.nodes,
                    loc.kind,
                    loc.port
                );
            }
            if !ep.ips.is_empty() {
                res.push_str("<li><strong>IPs</strong>: </li><ul>");
                for ip in &ep.ips {
                    let _ = write!(res, "<li><strong>IP</strong>: {}</li>", ip);
                }
                res.push_str("</ul>");
            }
        }
        res.push_str("</ul>");

        format!("{}\n\n{}", greeting(sender), res)
    })
}

/// /neigh [node]
pub fn neighbors(ctx: CommandContext) -> BoxFuture<'static, String> {
    Box::pin(async move {
        let sender = &ctx.message.sender_name;
        let args = parser::neighbor_args(&ctx.message.text);
        let neighbors = match ctx.controller.neighbors(&args.node).await {
            Ok(neighbors) => neighbors,
            Err(e) => {
                tracing::warn!("Error while connecting to the APIC: {}", e);
                return unreachable(sender);
            }
        };

        if neighbors.is_empty() {
            return if args.is_all() {
                format!("{}\n Sorry.. I could not discover the Topology of the Fabric", greeting(sender))
            } else {
                format!(
                    "{}\n It seems there are no Neighbors for Node <code>{}</code>",
                    greeting(sender),
                    args.node
                )
            };
        }

        let mut names: Vec<&String> = neighbors.keys().collect();
        names.sort();

        let mut res = if args.is_all() {
            String::from("\nThis is the Topology information of the Fabric : \n\n")
        } else {
            format!("\nThese are the Neighbors of the Node <code>{}</code>: \n\n", args.node)
        };
        res.push_str("<ul>");
        for name in names {
            let _ = write!(res, "<li><strong>{}</strong>:\t", name);
            for iface in &neighbors[name] {
                let _ = write!(res, "{}   ", iface);
            }
            res.push_str("</li>");
        }
        res.push_str("</ul>");

        format!("{}\n\n{}", greeting(sender), res)
    })
}

fn fault_severity_icon(severity: &str) -> &'static str {
    match severity {
        "critical" => "📛",
        "major" => "☢️",
        "minor" => "⚠️",
        "warning" => "🌀",
        "cleared" => "❎",
        _ => "",
    }
}

fn fault_lifecycle_icon(lc: &str) -> &'static str {
    match lc {
        "raised" => "❌",
        "retaining" => "✅",
        "soaking" | "soaking-clearing" | "raised-clearing" => "♻️",
        _ => "",
    }
}

fn event_kind_icon(kind: &str) -> &'static str {
    match kind {
        "creation" => "🆕",
        "modification" => "🔄",
        "deletion" => "🗑️",
        _ => "",
    }
}

fn attr<'a>(mo: &'a MoAttributes, key: &str) -> &'a str {
    mo.get(key).map(String::as_str).unwrap_or_default()
}

/// /faults [count]
pub fn faults(ctx: CommandContext) -> BoxFuture<'static, String> {
    Box::pin(async move {
        let sender = &ctx.message.sender_name;
        let args = parser::count_args(&ctx.message.text);
        let faults = match ctx.controller.latest_faults(args.count).await {
            Ok(faults) => faults,
            Err(e) => {
                tracing::warn!("Error while connecting to the APIC: {}", e);
                return unreachable(sender);
            }
        };
        if faults.is_empty() {
            return format!("{}. There are no faults", greeting(sender));
        }

        let mut res = format!("\nThese are the latest {} faults in the Fabric : \n\n<ul>", args.count);
        for f in &faults {
            let severity = attr(f, "severity");
            let lc = attr(f, "lc");
            let _ = write!(
                res,
                "<li><strong>{}</strong> - <em>{}</em><ul>",
                attr(f, "code"),
                attr(f, "dn")
            );
            let _ = write!(res, "<li>{}</li>", attr(f, "descr"));
            let _ = write!(
                res,
                "<li><strong>Severity</strong>: {} {}</li>",
                severity,
                fault_severity_icon(severity)
            );
            let _ = write!(
                res,
                "<li><strong>Current Lifecycle</strong>: {} {}</li>",
                lc,
                fault_lifecycle_icon(lc)
            );
            let _ = write!(res, "<li><strong>Type</strong>: {}</li>", attr(f, "type"));
            let _ = write!(res, "<li><strong>Created</strong>: {}</li></ul></li>", attr(f, "created"));
        }
        res.push_str("</ul>");

        format!("{}\n\n{}", greeting(sender), res)
    })
}

/// /events [user] [count]
pub fn events(ctx: CommandContext) -> BoxFuture<'static, String> {
    Box::pin(async move {
        let sender = &ctx.message.sender_name;
        let args = parser::count_args(&ctx.message.text);
        let events = match ctx
            .controller
            .latest_events(args.count, args.user.as_deref())
            .await
        {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("Error while connecting to the APIC: {}", e);
                return unreachable(sender);
            }
        };
        if events.is_empty() {
            return format!("{}. There are no events", greeting(sender));
        }

        let mut res = match &args.user {
            Some(user) => format!(
                "\nThese are the latest {} events of the user <code>{}</code> in the Fabric : \n\n<ul>",
                args.count, user
            ),
            None => format!("\nThese are the latest {} events in the Fabric : \n\n<ul>", args.count),
        };
        for e in &events {
            let kind = attr(e, "ind");
            let _ = write!(
                res,
                "<li><strong>{}</strong> - <em>{}</em><ul>",
                attr(e, "code"),
                attr(e, "affected")
            );
            let _ = write!(res, "<li>{}</li>", attr(e, "descr"));
            let _ = write!(res, "<li><strong>User</strong>: {}</li>", attr(e, "user"));
            let _ = write!(res, "<li><strong>Type</strong>: {} {}</li>", kind, event_kind_icon(kind));
            let _ = write!(res, "<li><strong>Created</strong>: {}</li></ul></li>", attr(e, "created"));
        }
        res.push_str("</ul>");

        format!("{}\n\n{}", greeting(sender), res)
    })
}

fn already_subscribed(sender: &str, class: &str) -> String {
    format!(
        "{}\n\n You are already subscribed to MO/Class <code>{}</code>",
        greeting(sender),
        class
    )
}

/// /websocket <class> | list | <class> rm
pub fn websocket(ctx: CommandContext) -> BoxFuture<'static, String> {
    Box::pin(async move {
        let sender = &ctx.message.sender_name;
        let room = &ctx.message.room_id;
        let table = &ctx.subscriptions;

        match parser::subscription_args(&ctx.message.text) {
            SubscriptionAction::List => {
                let classes = table.classes_for(room);
                if classes.is_empty() {
                    return format!("{}\n You are not subscribed to any class", greeting(sender));
                }
                let mut res = format!("{}\n Here is the list of subscribed classes:\n <ul>", greeting(sender));
                for class in classes {
                    let _ = write!(res, "<li><code>{}</code></li>", class);
                }
                res.push_str("</ul>");
                res
            }
            SubscriptionAction::Subscribe(class) => {
                if table.contains(&class, room) {
                    return already_subscribed(sender, &class);
                }
                let subscription_id = match table.subscription_id(&class) {
                    Some(id) => id,
                    None => match ctx.controller.subscribe_to_class(&class).await {
                        Ok(id) => id,
                        Err(e) => {
                            tracing::warn!("Could not subscribe to class {}: {}", class, e);
                            return unreachable(sender);
                        }
                    },
                };
                match table.add(&class, &subscription_id, room) {
                    AddOutcome::AlreadySubscribed => {
                        return already_subscribed(sender, &class);
                    }
                    AddOutcome::Added(held) => {
                        if held != subscription_id {
                            tracing::warn!(
                                "Class {} already held by subscription {}, letting {} expire",
                                class,
                                held,
                                subscription_id
                            );
                        }
                        tracing::info!("Room {} subscribed to class {} ({})", room, class, held);
                    }
                }
                format!(
                    "{}\n\n Websocket subscription to MO/Class <code>{}</code> configured 🔧 !",
                    greeting(sender),
                    class
                )
            }
            SubscriptionAction::Unsubscribe(class) => {
                if !table.contains(&class, room) {
                    return format!(
                        "{}\n\n You are not subscribed to MO/Class <code>{}</code>",
                        greeting(sender),
                        class
                    );
                }
                tracing::info!("Room {} unsubscribed from class {}", room, class);
                table.remove(&class, room);
                format!(
                    "{}\n\n Websocket subscription to MO/Class <code>{}</code> deleted 🔧 !",
                    greeting(sender),
                    class
                )
            }
        }
    })
}
