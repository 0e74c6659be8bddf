//! Macro records and the per-guild macro table

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// A stored macro: a named canned reply, guild-scoped and optionally channel-scoped
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Macro {
    pub name: String,
    pub contents: String,
    /// None = global (usable in every channel of the guild)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u64>,
    pub category: String,
    /// Extra trigger tokens resolving to this macro
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub aliases: BTreeSet<String>,
    /// Successful trigger count
    #[serde(default)]
    pub uses: u64,
}

impl Macro {
    /// Create a macro with a normalized (lowercase) name and category
    pub fn new(
        name: impl Into<String>,
        contents: impl Into<String>,
        channel: Option<u64>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().to_lowercase(),
            contents: contents.into(),
            channel,
            category: category.into().to_lowercase(),
            aliases: BTreeSet::new(),
            uses: 0,
        }
    }

    /// The key this macro is stored under
    pub fn key(&self) -> MacroKey {
        MacroKey {
            name: self.name.clone(),
            channel: self.channel,
        }
    }

    pub fn is_global(&self) -> bool {
        self.channel.is_none()
    }

    /// True when `token` equals the primary name or any alias
    pub fn answers_to(&self, token: &str) -> bool {
        self.name == token || self.aliases.contains(token)
    }

    /// Primary name with aliases appended: `name (a, b)`
    pub fn display_names(&self) -> String {
        if self.aliases.is_empty() {
            self.name.clone()
        } else {
            let aliases: Vec<&str> = self.aliases.iter().map(String::as_str).collect();
            format!("{} ({})", self.name, aliases.join(", "))
        }
    }
}

/// Scoped lookup key: primary name plus channel scope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MacroKey {
    pub name: String,
    /// None = global
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u64>,
}

impl MacroKey {
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channel: None,
        }
    }

    pub fn in_channel(name: impl Into<String>, channel_id: u64) -> Self {
        Self {
            name: name.into(),
            channel: Some(channel_id),
        }
    }

    pub fn scoped(name: impl Into<String>, channel: Option<u64>) -> Self {
        Self {
            name: name.into(),
            channel,
        }
    }
}

/// All macros of one guild, keyed by scoped name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuildMacros {
    macros: HashMap<MacroKey, Macro>,
}

impl GuildMacros {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the table from stored records (each record carries its own key)
    pub fn from_records(records: Vec<Macro>) -> Self {
        let macros = records.into_iter().map(|m| (m.key(), m)).collect();
        Self { macros }
    }

    /// The stored records in unspecified order, for persistence
    pub fn records(&self) -> Vec<&Macro> {
        self.macros.values().collect()
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    pub fn get(&self, key: &MacroKey) -> Option<&Macro> {
        self.macros.get(key)
    }

    pub fn get_mut(&mut self, key: &MacroKey) -> Option<&mut Macro> {
        self.macros.get_mut(key)
    }

    /// Insert under the macro's own key, returning the displaced entry if any
    pub fn insert(&mut self, m: Macro) -> Option<Macro> {
        self.macros.insert(m.key(), m)
    }

    pub fn remove(&mut self, key: &MacroKey) -> Option<Macro> {
        self.macros.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Macro> {
        self.macros.values()
    }

    /// Exact-match lookup of a lowercase `token` (name or alias) within one scope
    pub fn find_token(&self, token: &str, channel: Option<u64>) -> Option<&Macro> {
        self.macros
            .values()
            .find(|m| m.channel == channel && m.answers_to(token))
    }

    /// Resolve a lowercase `token` with channel-over-global precedence
    pub fn resolve_key(&self, token: &str, channel_id: u64) -> Option<MacroKey> {
        self.find_token(token, Some(channel_id))
            .or_else(|| self.find_token(token, None))
            .map(Macro::key)
    }

    /// Macros usable in `channel_id`: its channel-scoped macros plus every
    /// global macro not shadowed by a channel-scoped one of the same name
    pub fn available_in(&self, channel_id: u64) -> Vec<&Macro> {
        self.macros
            .values()
            .filter(|m| match m.channel {
                Some(c) => c == channel_id,
                None => !self
                    .macros
                    .contains_key(&MacroKey::in_channel(m.name.clone(), channel_id)),
            })
            .collect()
    }
}
