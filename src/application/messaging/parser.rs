//! Message parser - Turns chat text into command arguments

use regex_lite::Regex;

use crate::domain::traits::ALL_NODES;

/// Largest number of records a user may ask for
pub const MAX_COUNT: u32 = 10;

/// Report whether `text` satisfies `pattern`. Invalid patterns never match.
pub fn match_command(text: &str, pattern: &str) -> bool {
    match Regex::new(pattern) {
        Ok(re) => re.is_match(text),
        Err(e) => {
            tracing::warn!("Invalid command pattern {:?}: {}", pattern, e);
            false
        }
    }
}

/// Drop every whitespace-separated token equal to `bot_name` and rejoin
/// the rest with single spaces
pub fn clean_command(bot_name: &str, text: &str) -> String {
    text.split_whitespace()
        .filter(|w| *w != bot_name)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Arguments of `/ep <mac>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointArgs {
    pub mac: String,
}

pub fn endpoint_args(text: &str) -> EndpointArgs {
    EndpointArgs {
        mac: text.split_whitespace().nth(1).unwrap_or_default().to_string(),
    }
}

/// Arguments of `/neigh [node]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborArgs {
    pub node: String,
}

impl NeighborArgs {
    pub fn is_all(&self) -> bool {
        self.node == ALL_NODES
    }
}

pub fn neighbor_args(text: &str) -> NeighborArgs {
    NeighborArgs {
        node: text
            .split_whitespace()
            .nth(1)
            .unwrap_or(ALL_NODES)
            .to_string(),
    }
}

/// Arguments of `/faults [count]` and `/events [user] [count]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountArgs {
    pub user: Option<String>,
    pub count: u32,
}

/// A single argument is a count when it is a positive number and a user
/// otherwise. Missing or unusable counts fall back to [`MAX_COUNT`] and
/// larger ones are capped to it.
pub fn count_args(text: &str) -> CountArgs {
    let words: Vec<&str> = text.split_whitespace().collect();
    match words.as_slice() {
        [_, user, count, ..] => CountArgs {
            user: Some(user.to_string()),
            count: parse_count(count).unwrap_or(MAX_COUNT),
        },
        [_, arg] => match parse_count(arg) {
            Some(count) => CountArgs { user: None, count },
            None => CountArgs {
                user: Some(arg.to_string()),
                count: MAX_COUNT,
            },
        },
        _ => CountArgs {
            user: None,
            count: MAX_COUNT,
        },
    }
}

fn parse_count(s: &str) -> Option<u32> {
    match s.parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n.min(MAX_COUNT)),
    }
}

/// What `/websocket` was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionAction {
    List,
    Subscribe(String),
    Unsubscribe(String),
}

pub fn subscription_args(text: &str) -> SubscriptionAction {
    let words: Vec<&str> = text.split_whitespace().collect();
    match words.as_slice() {
        [_, "list"] | [_] => SubscriptionAction::List,
        [_, class, "rm", ..] => SubscriptionAction::Unsubscribe(class.to_string()),
        [_, class, ..] => SubscriptionAction::Subscribe(class.to_string()),
        [] => SubscriptionAction::List,
    }
}
