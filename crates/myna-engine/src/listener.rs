//! Message pipeline that turns chat messages into macro triggers

#[path = "listener_tests.rs"]
mod listener_tests;

use std::sync::Arc;

use myna_gateway::{display_channel, Clock, Gateway};
use myna_types::{BotConfig, Member, MessageEvent, OutgoingMessage};
use tokio::time::Duration;
use tracing::{debug, warn};

use crate::cooldown::{CooldownKey, CooldownTracker};
use crate::persist::MacroRepository;
use crate::resolver::Resolver;

/// Reaction confirming a trigger whose message was kept.
pub const ACK_EMOJI: &str = "👀";

/// Reaction telling the author the macro is cooling down.
pub const COOLDOWN_EMOJI: &str = "🕓";

/// What one message event amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Not an eligible trigger, nothing visible happened
    Ignored,
    /// A known macro inside its cooldown window, trigger swallowed
    CoolingDown,
    /// The macro fired
    Fired,
}

/// Watches guild messages for prefixed macro invocations.
pub struct TriggerListener<G, R, C> {
    gateway: Arc<G>,
    resolver: Resolver<R>,
    cooldowns: CooldownTracker<C>,
    config: Arc<BotConfig>,
}

impl<G, R, C> TriggerListener<G, R, C>
where
    G: Gateway,
    R: MacroRepository,
    C: Clock + Clone,
{
    pub fn new(
        gateway: Arc<G>,
        resolver: Resolver<R>,
        cooldowns: CooldownTracker<C>,
        config: Arc<BotConfig>,
    ) -> Self {
        Self {
            gateway,
            resolver,
            cooldowns,
            config,
        }
    }

    /// Run one message through the trigger pipeline.
    ///
    /// Ineligible messages fall out silently at whichever step disqualifies
    /// them. Only an armed cooldown answers with a visible reaction.
    pub async fn handle_message(&self, event: &MessageEvent) -> anyhow::Result<TriggerOutcome> {
        let Some(guild_id) = event.guild_id else {
            return Ok(TriggerOutcome::Ignored);
        };
        let Some(author) = &event.author else {
            return Ok(TriggerOutcome::Ignored);
        };
        if author.bot || self.config.is_ignored(author.id) {
            return Ok(TriggerOutcome::Ignored);
        }
        let Some(guild) = self.config.guild(guild_id) else {
            return Ok(TriggerOutcome::Ignored);
        };
        if guild.prefix.is_empty() {
            return Ok(TriggerOutcome::Ignored);
        }
        let Some(rest) = event.content.strip_prefix(&guild.prefix) else {
            return Ok(TriggerOutcome::Ignored);
        };
        // a doubled prefix keeps the invoking message instead of deleting it
        let (rest, keep_message) = match rest.strip_prefix(&guild.prefix) {
            Some(rest) => (rest, true),
            None => (rest, false),
        };
        let Some(token) = rest.split_whitespace().next() else {
            return Ok(TriggerOutcome::Ignored);
        };
        let token = token.to_lowercase();

        let Some(found) = self
            .resolver
            .lookup(guild_id, event.channel_id, &token)
            .await
        else {
            return Ok(TriggerOutcome::Ignored);
        };

        if let Some(secs) = guild.channel_cooldown_secs {
            // gate before counting, so throttled repeats never inflate uses
            let key = CooldownKey::new(guild_id, event.channel_id, found.key());
            if !self.cooldowns.try_begin(key, Duration::from_secs(secs)) {
                self.gateway
                    .add_reaction(event.channel_id, event.message_id, COOLDOWN_EMOJI)
                    .await?;
                return Ok(TriggerOutcome::CoolingDown);
            }
        }

        let Some(fired) = self
            .resolver
            .resolve(guild_id, event.channel_id, &token)
            .await
        else {
            // removed between lookup and resolve
            return Ok(TriggerOutcome::Ignored);
        };

        if keep_message {
            self.gateway
                .add_reaction(event.channel_id, event.message_id, ACK_EMOJI)
                .await?;
        } else {
            self.gateway
                .delete_message(event.channel_id, event.message_id)
                .await?;
        }
        self.gateway
            .send_message(event.channel_id, OutgoingMessage::text(&fired.contents))
            .await?;
        debug!(
            "Macro {} fired in guild {} channel {}",
            fired.name, guild_id, event.channel_id
        );

        if let Some(log_channel) = guild.log_channel {
            self.audit(log_channel, author, &token, event.channel_id)
                .await;
        }
        Ok(TriggerOutcome::Fired)
    }

    /// Best-effort audit line; a failed send never blocks the trigger
    async fn audit(&self, log_channel: u64, author: &Member, token: &str, channel_id: u64) {
        let channel = display_channel(self.gateway.as_ref(), channel_id).await;
        let line = format!(
            "{} :: {} invoked {} in {}",
            author.username, author.id, token, channel
        );
        if let Err(e) = self
            .gateway
            .send_message(log_channel, OutgoingMessage::Text(line))
            .await
        {
            warn!(
                "Failed to write audit line to channel {}: {}",
                log_channel, e
            );
        }
    }
}
