//! Delivery fanout: push a digest to a set of independently-configured
//! channels concurrently and report per-channel plus aggregate outcomes.

pub mod email;
pub mod serverchan;
pub mod telegram;

pub use email::EmailChannel;
pub use serverchan::ServerChanChannel;
pub use telegram::TelegramChannel;

use crate::config::AppConfig;
use crate::types::{DigestItem, Result};
use async_trait::async_trait;
use futures::future;
use std::collections::HashMap;
use tracing::{error, info};

/// One delivery destination. Implementations render the digest into their
/// own wire format and perform the outbound call.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, digest: &[DigestItem]) -> Result<()>;
}

/// Registry mapping channel ids to implementations; the id set is open and
/// configuration-driven.
pub struct ChannelRegistry {
    channels: HashMap<String, Box<dyn Channel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
        }
    }

    pub fn register(&mut self, channel: Box<dyn Channel>) {
        self.channels.insert(channel.name().to_string(), channel);
    }

    pub fn get(&self, id: &str) -> Option<&dyn Channel> {
        self.channels.get(id).map(|c| c.as_ref())
    }

    pub fn ids(&self) -> Vec<&str> {
        self.channels.keys().map(String::as_str).collect()
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ServerChanChannel::new(config)));
        registry.register(Box::new(TelegramChannel::new(config)));
        registry.register(Box::new(EmailChannel::new(config)));
        registry
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    pub per_channel: HashMap<String, bool>,
    pub all_ok: bool,
}

/// Push `digest` to every channel in `channel_ids` concurrently.
///
/// Empty digest is a trivial success; an empty channel set is a failure
/// (a delivery attempt with no destination). Unknown ids and per-channel
/// errors become `false` results; every channel is attempted regardless of
/// its siblings' outcomes.
pub async fn deliver(
    registry: &ChannelRegistry,
    digest: &[DigestItem],
    channel_ids: &[String],
) -> DeliveryReport {
    if digest.is_empty() {
        info!("delivery: nothing to deliver");
        return DeliveryReport {
            per_channel: HashMap::new(),
            all_ok: true,
        };
    }
    if channel_ids.is_empty() {
        error!("delivery: no channels requested");
        return DeliveryReport {
            per_channel: HashMap::new(),
            all_ok: false,
        };
    }

    info!(
        "delivery: sending {} items via {:?}",
        digest.len(),
        channel_ids
    );

    let attempts = channel_ids.iter().map(|id| async move {
        let ok = match registry.get(id) {
            Some(channel) => match channel.send(digest).await {
                Ok(()) => {
                    info!("delivery [{}]: ok", id);
                    true
                }
                Err(e) => {
                    error!("delivery [{}] failed: {}", id, e);
                    false
                }
            },
            None => {
                error!(
                    "delivery: unknown channel '{}', available: {:?}",
                    id,
                    registry.ids()
                );
                false
            }
        };
        (id.clone(), ok)
    });

    let results: Vec<(String, bool)> = future::join_all(attempts).await;
    let all_ok = results.iter().all(|(_, ok)| *ok);
    DeliveryReport {
        per_channel: results.into_iter().collect(),
        all_ok,
    }
}
