//! Per-channel trigger throttling

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use myna_gateway::Clock;
use myna_types::MacroKey;
use tokio::time::{Duration, Instant};
use tracing::trace;

/// One throttled trigger: a macro fired in one channel of one guild.
/// Other channels and other macros throttle independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CooldownKey {
    pub guild_id: u64,
    pub channel_id: u64,
    pub macro_key: MacroKey,
}

impl CooldownKey {
    pub fn new(guild_id: u64, channel_id: u64, macro_key: MacroKey) -> Self {
        Self {
            guild_id,
            channel_id,
            macro_key,
        }
    }
}

/// Active cooldown windows keyed by trigger.
///
/// `try_begin` tests and arms the window under one lock, so two concurrent
/// triggers for the same key can never both pass. Expired entries are purged
/// on access, the spawned task only reclaims memory for keys nobody touches
/// again.
pub struct CooldownTracker<C> {
    clock: C,
    active: Arc<Mutex<HashMap<CooldownKey, Instant>>>,
}

impl<C: Clock + Clone> CooldownTracker<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether `key` sits inside an unexpired window
    pub fn is_active(&self, key: &CooldownKey) -> bool {
        let now = self.clock.now();
        let active = self.active.lock().unwrap();
        active.get(key).is_some_and(|deadline| *deadline > now)
    }

    /// Test and arm the window for `key` in one step.
    /// True means the caller owns this trigger, false means it is throttled.
    pub fn try_begin(&self, key: CooldownKey, window: Duration) -> bool {
        if window.is_zero() {
            return true;
        }
        let now = self.clock.now();
        let deadline = now + window;
        {
            let mut active = self.active.lock().unwrap();
            active.retain(|_, d| *d > now);
            if active.contains_key(&key) {
                return false;
            }
            active.insert(key.clone(), deadline);
        }
        self.spawn_expiry(key, deadline, window);
        true
    }

    /// Reclaim the entry once its window has truly passed. The deadline
    /// comparison keeps a stale task from clearing a newer window that was
    /// re-armed under the same key.
    fn spawn_expiry(&self, key: CooldownKey, deadline: Instant, window: Duration) {
        let clock = self.clock.clone();
        let active = self.active.clone();
        tokio::spawn(async move {
            clock.sleep(window).await;
            let mut active = active.lock().unwrap();
            if active.get(&key) == Some(&deadline) && clock.now() >= deadline {
                active.remove(&key);
                trace!("Cooldown expired for {:?}", key);
            }
        });
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.active.lock().unwrap().len()
    }
}
