//! Command surface for managing and browsing macros

#[path = "service_tests.rs"]
mod service_tests;

use std::collections::BTreeMap;
use std::sync::Arc;

use myna_gateway::{display_channel, Gateway};
use myna_types::{
    level_for, BotConfig, Macro, Member, OutgoingMessage, Page, PageField, PermissionLevel,
};
use tracing::{error, info, warn};

use crate::error::MacroError;
use crate::persist::MacroRepository;
use crate::resolver::Resolver;
use crate::search::{self, LexicalSimilarity, Similarity, DEFAULT_LIMIT, DEFAULT_THRESHOLD};
use crate::store::MacroStore;

/// Level required to create, edit, or delete macros. Reads are open.
const MANAGE_LEVEL: PermissionLevel = PermissionLevel::Staff;

/// Category fields per listing page.
const CATEGORIES_PER_PAGE: usize = 25;

/// Names per field in the all-macros listing.
const NAMES_PER_FIELD: usize = 15;

/// Entries per group in the usage statistics.
const STATS_PER_GROUP: usize = 10;

const NOT_FOUND: &str = "Cannot find a macro by that name. If it is a channel specific macro you need to provide the channel as well.";
const NO_PERMISSION: &str = "You do not have permission to manage macros.";
const SAVE_FAILED: &str = "Something went wrong while saving macros. Please try again.";

/// Macro management and browsing commands, returning user-facing replies.
///
/// Mutations answer with plain strings, browse operations with paged
/// listings. Every reply is ready to hand to the gateway as-is.
pub struct MacroService<R, S = LexicalSimilarity> {
    store: Arc<MacroStore<R>>,
    resolver: Resolver<R>,
    similarity: S,
    config: Arc<BotConfig>,
}

impl<R: MacroRepository> MacroService<R> {
    pub fn new(store: Arc<MacroStore<R>>, config: Arc<BotConfig>) -> Self {
        Self::with_similarity(store, config, LexicalSimilarity)
    }
}

impl<R: MacroRepository, S: Similarity> MacroService<R, S> {
    pub fn with_similarity(
        store: Arc<MacroStore<R>>,
        config: Arc<BotConfig>,
        similarity: S,
    ) -> Self {
        Self {
            resolver: Resolver::new(store.clone()),
            store,
            similarity,
            config,
        }
    }

    // ── Mutations ──────────────────────────────────────────────────────────

    pub async fn add_macro(
        &self,
        actor: &Member,
        guild_id: u64,
        name: &str,
        category: &str,
        channel: Option<u64>,
        contents: &str,
    ) -> String {
        if let Some(refusal) = self.check_manage(actor, guild_id) {
            return refusal;
        }
        match self
            .store
            .add(guild_id, name, category, channel, contents)
            .await
        {
            Ok(m) => format!(
                "Success. Macro `{}` is now available {} and will respond with ```\n{}\n```",
                m.name,
                scope_phrase(channel),
                m.contents
            ),
            Err(MacroError::ReservedName { .. }) => {
                "A command with that name already exists.".to_string()
            }
            Err(MacroError::Duplicate { .. }) => {
                "A macro or alias with that name already exists.".to_string()
            }
            Err(e) => save_failure(guild_id, &e),
        }
    }

    pub async fn remove_macro(
        &self,
        actor: &Member,
        guild_id: u64,
        name: &str,
        channel: Option<u64>,
    ) -> String {
        if let Some(refusal) = self.check_manage(actor, guild_id) {
            return refusal;
        }
        match self.store.remove(guild_id, name, channel).await {
            Ok(m) => format!("Success. Macro `{}` has been removed", m.display_names()),
            Err(MacroError::NotFound { .. }) => NOT_FOUND.to_string(),
            Err(e) => save_failure(guild_id, &e),
        }
    }

    pub async fn edit_macro(
        &self,
        actor: &Member,
        guild_id: u64,
        name: &str,
        channel: Option<u64>,
        contents: &str,
    ) -> String {
        if let Some(refusal) = self.check_manage(actor, guild_id) {
            return refusal;
        }
        match self
            .store
            .edit_contents(guild_id, name, channel, contents)
            .await
        {
            Ok(m) => format!(
                "Success. Macro `{}` available {} will now respond with ```\n{}\n```",
                m.display_names(),
                scope_phrase(channel),
                m.contents
            ),
            Err(MacroError::NotFound { .. }) => NOT_FOUND.to_string(),
            Err(e) => save_failure(guild_id, &e),
        }
    }

    pub async fn edit_category(
        &self,
        actor: &Member,
        guild_id: u64,
        name: &str,
        channel: Option<u64>,
        category: &str,
    ) -> String {
        if let Some(refusal) = self.check_manage(actor, guild_id) {
            return refusal;
        }
        match self
            .store
            .edit_category(guild_id, name, channel, category)
            .await
        {
            Ok(m) => format!(
                "Success. Macro `{}` available {} is now in category `{}`",
                m.display_names(),
                scope_phrase(channel),
                m.category
            ),
            Err(MacroError::NotFound { .. }) => NOT_FOUND.to_string(),
            Err(e) => save_failure(guild_id, &e),
        }
    }

    pub async fn add_alias(
        &self,
        actor: &Member,
        guild_id: u64,
        name: &str,
        channel: Option<u64>,
        alias: &str,
    ) -> String {
        if let Some(refusal) = self.check_manage(actor, guild_id) {
            return refusal;
        }
        match self.store.add_alias(guild_id, name, channel, alias).await {
            Ok(m) => format!(
                "Success. Macro `{}` now has the alias `{}` {}",
                m.name,
                alias.to_lowercase(),
                scope_phrase(channel)
            ),
            Err(MacroError::ReservedName { .. }) => {
                "A command with that alias already exists.".to_string()
            }
            Err(MacroError::Duplicate { .. }) => {
                "A macro or alias already exists by that name.".to_string()
            }
            Err(MacroError::NotFound { .. }) => NOT_FOUND.to_string(),
            Err(e) => save_failure(guild_id, &e),
        }
    }

    pub async fn remove_alias(
        &self,
        actor: &Member,
        guild_id: u64,
        name: &str,
        channel: Option<u64>,
        alias: &str,
    ) -> String {
        if let Some(refusal) = self.check_manage(actor, guild_id) {
            return refusal;
        }
        match self.store.remove_alias(guild_id, name, channel, alias).await {
            Ok(m) => format!(
                "Success. Macro `{}` no longer has the alias `{}` {}",
                m.name,
                alias.to_lowercase(),
                scope_phrase(channel)
            ),
            Err(MacroError::AliasNotFound { alias, .. }) => format!(
                "Cannot find the alias `{}` of the macro. \
                 If it is a channel specific macro you need to provide the channel as well",
                alias
            ),
            Err(MacroError::NotFound { .. }) => NOT_FOUND.to_string(),
            Err(e) => save_failure(guild_id, &e),
        }
    }

    // ── Browse operations ──────────────────────────────────────────────────

    /// Structured view of one macro, addressed by name or alias
    pub async fn macro_info(
        &self,
        guild_id: u64,
        name: &str,
        channel: Option<u64>,
    ) -> OutgoingMessage {
        let token = name.to_lowercase();
        let Some(m) = self
            .store
            .find_by_name_or_alias(guild_id, &token, channel)
            .await
        else {
            return OutgoingMessage::text(NOT_FOUND);
        };
        let aliases = if m.aliases.is_empty() {
            "None".to_string()
        } else {
            m.aliases.iter().cloned().collect::<Vec<_>>().join("\n")
        };
        let scope = match m.channel {
            None => "Global Macro".to_string(),
            Some(id) => format!("<#{}>", id),
        };
        let page = Page::new(format!("Macro - {}", token))
            .with_field(PageField::new("Contents", &m.contents))
            .with_field(PageField::new("Macro Name", &m.name).inline())
            .with_field(PageField::new("Aliases", aliases).inline())
            .with_field(PageField::new("Uses", m.uses.to_string()))
            .with_field(PageField::new("Category", &m.category).inline())
            .with_field(PageField::new("Channel", scope).inline());
        OutgoingMessage::Pages(vec![page])
    }

    /// Macros usable in `channel_id`, grouped by category.
    /// Larger categories come first, names are sorted within each.
    pub async fn list_macros<G: Gateway>(
        &self,
        gateway: &G,
        guild_id: u64,
        channel_id: u64,
    ) -> OutgoingMessage {
        let visible = self.resolver.available_in(guild_id, channel_id).await;
        let title = format!(
            "Macros available in {}",
            display_channel(gateway, channel_id).await
        );

        let mut by_category: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for m in &visible {
            by_category
                .entry(m.category.clone())
                .or_default()
                .push(m.display_names());
        }
        let mut groups: Vec<(String, Vec<String>)> = by_category.into_iter().collect();
        for (_, names) in &mut groups {
            names.sort();
        }
        groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(&b.0)));

        let pages: Vec<Page> = groups
            .chunks(CATEGORIES_PER_PAGE)
            .map(|chunk| {
                let mut page = Page::new(&title);
                for (category, names) in chunk {
                    page = page.with_field(
                        PageField::new(format!("**{}**", category), names.join("\n")).inline(),
                    );
                }
                page
            })
            .collect();

        OutgoingMessage::Pages(non_empty(pages, &title))
    }

    /// Every macro in the guild, one page per channel group
    pub async fn list_all_macros<G: Gateway>(&self, gateway: &G, guild_id: u64) -> OutgoingMessage {
        const TITLE: &str = "All available macros";
        let groups = self.channel_groups(gateway, guild_id).await;

        let pages: Vec<Page> = groups
            .into_iter()
            .map(|(label, macros)| {
                let mut names: Vec<String> = macros.iter().map(Macro::display_names).collect();
                names.sort();
                let mut page = Page::new(TITLE);
                for chunk in names.chunks(NAMES_PER_FIELD) {
                    page = page.with_field(
                        PageField::new(format!("**{}**", label), chunk.join("\n")).inline(),
                    );
                }
                page
            })
            .collect();

        OutgoingMessage::Pages(non_empty(pages, TITLE))
    }

    /// Use counts per channel group, best used first (or least used when
    /// `ascending`)
    pub async fn macro_stats<G: Gateway>(
        &self,
        gateway: &G,
        guild_id: u64,
        ascending: bool,
    ) -> OutgoingMessage {
        let title = if ascending {
            "Least used macros"
        } else {
            "Top Used Macros"
        };
        let groups = self.channel_groups(gateway, guild_id).await;

        let pages: Vec<Page> = groups
            .into_iter()
            .map(|(label, mut macros)| {
                if ascending {
                    macros.sort_by(|a, b| a.uses.cmp(&b.uses).then(a.name.cmp(&b.name)));
                } else {
                    macros.sort_by(|a, b| b.uses.cmp(&a.uses).then(a.name.cmp(&b.name)));
                }
                let lines: Vec<String> = macros
                    .iter()
                    .take(STATS_PER_GROUP)
                    .enumerate()
                    .map(|(i, m)| format!("{}. {} - {} uses", i + 1, m.name, m.uses))
                    .collect();
                Page::new(title)
                    .with_field(PageField::new(format!("**{}**", label), lines.join("\n")).inline())
            })
            .collect();

        OutgoingMessage::Pages(non_empty(pages, title))
    }

    /// Fuzzy search over the names, aliases and contents of the macros
    /// visible in `channel_id`
    pub async fn search_macros(
        &self,
        guild_id: u64,
        channel_id: u64,
        query: &str,
    ) -> OutgoingMessage {
        let visible = self.resolver.available_in(guild_id, channel_id).await;
        let names = search::by_name_or_alias(
            &self.similarity,
            query,
            &visible,
            DEFAULT_THRESHOLD,
            DEFAULT_LIMIT,
        );
        let contents = search::by_contents(
            &self.similarity,
            query,
            &visible,
            DEFAULT_THRESHOLD,
            DEFAULT_LIMIT,
        );

        if names.is_empty() && contents.is_empty() {
            return OutgoingMessage::text("No results found");
        }

        let name_lines = if names.is_empty() {
            "No results found".to_string()
        } else {
            names
                .iter()
                .enumerate()
                .map(|(i, m)| format!("{}. {}", i + 1, m.token))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let content_lines = if contents.is_empty() {
            "No results found".to_string()
        } else {
            contents
                .iter()
                .enumerate()
                .map(|(i, m)| format!("{}. {}", i + 1, m.entry.name))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let page = Page::new(format!("Search Results - '{}'", query))
            .with_field(PageField::new(
                "Top Results - By names and aliases",
                name_lines,
            ))
            .with_field(PageField::new("Top Results - By contents", content_lines).inline());
        OutgoingMessage::Pages(vec![page])
    }

    // ── Helpers ────────────────────────────────────────────────────────────

    fn check_manage(&self, actor: &Member, guild_id: u64) -> Option<String> {
        let level = level_for(actor, &self.config, guild_id);
        if level.allows(MANAGE_LEVEL) {
            return None;
        }
        info!(
            "User {} denied macro management in guild {}",
            actor.id, guild_id
        );
        Some(NO_PERMISSION.to_string())
    }

    /// All of the guild's macros grouped by channel display name, largest
    /// group first; read failures degrade to no groups
    async fn channel_groups<G: Gateway>(
        &self,
        gateway: &G,
        guild_id: u64,
    ) -> Vec<(String, Vec<Macro>)> {
        let all: Vec<Macro> = match self
            .store
            .for_guild(guild_id, |t| {
                t.records().into_iter().cloned().collect::<Vec<_>>()
            })
            .await
        {
            Ok(all) => all,
            Err(e) => {
                warn!("Macro listing failed for guild {}: {}", guild_id, e);
                Vec::new()
            }
        };

        let mut by_label: BTreeMap<String, Vec<Macro>> = BTreeMap::new();
        for m in all {
            let label = match m.channel {
                None => "Global Macros".to_string(),
                Some(id) => display_channel(gateway, id).await,
            };
            by_label.entry(label).or_default().push(m);
        }
        let mut groups: Vec<(String, Vec<Macro>)> = by_label.into_iter().collect();
        groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(&b.0)));
        groups
    }
}

fn scope_phrase(channel: Option<u64>) -> String {
    match channel {
        None => "globally".to_string(),
        Some(id) => format!("in channel <#{}>", id),
    }
}

fn save_failure(guild_id: u64, err: &MacroError) -> String {
    error!("Macro mutation failed for guild {}: {}", guild_id, err);
    SAVE_FAILED.to_string()
}

/// An empty listing still answers with one titled page
fn non_empty(pages: Vec<Page>, title: &str) -> Vec<Page> {
    if pages.is_empty() {
        vec![Page::new(title)]
    } else {
        pages
    }
}
