//! Chat commands. The transport black box hands us `(chat_id, text)`;
//! we hand back the reply text. Routing raw platform updates to here is
//! the transport's problem, not ours.

use anyhow::Result;

use crate::config::Config;
use crate::store::SubscriberStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Subscribe,
    Unsubscribe,
    Status,
    Ping,
}

impl Command {
    /// Parse the first whitespace token, case-insensitive, with an optional
    /// `@botname` suffix stripped (group chats address commands that way).
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.trim().split_whitespace().next()?;
        let bare = first.split('@').next().unwrap_or(first);
        match bare.to_ascii_lowercase().as_str() {
            "/start" => Some(Self::Start),
            "/subscribe" => Some(Self::Subscribe),
            "/unsubscribe" => Some(Self::Unsubscribe),
            "/status" => Some(Self::Status),
            "/ping" => Some(Self::Ping),
            _ => None,
        }
    }
}

const GREETING: &str = "Hi! I'm a macro-release bot (no trade advice).\n\
I'll ping you with an interpretation when an important data point drops.\n\n\
Commands:\n\
/subscribe – receive updates\n\
/unsubscribe – stop updates\n\
/status – current state\n\
/ping – quick check\n";

/// Execute a command for `chat_id` and return the reply text.
pub async fn execute(
    cmd: Command,
    chat_id: i64,
    subscribers: &SubscriberStore,
    cfg: &Config,
) -> Result<String> {
    let reply = match cmd {
        Command::Start => GREETING.to_string(),
        Command::Subscribe => {
            if subscribers.add(chat_id).await? {
                format!(
                    "Subscribed to macro updates ({}, high-impact: {}).",
                    cfg.country, cfg.high_impact_only
                )
            } else {
                "You were already subscribed.".to_string()
            }
        }
        Command::Unsubscribe => {
            if subscribers.remove(chat_id).await? {
                "Removed from the update list.".to_string()
            } else {
                "You were not subscribed.".to_string()
            }
        }
        Command::Status => format!(
            "Subscribers: {}\nCountry: {}\nHigh-impact only: {}\nPolling: every {}s; window={}m\n",
            subscribers.len(),
            cfg.country,
            cfg.high_impact_only,
            cfg.poll_interval_secs,
            cfg.window_minutes
        ),
        Command::Ping => "pong".to_string(),
    };
    Ok(reply)
}
