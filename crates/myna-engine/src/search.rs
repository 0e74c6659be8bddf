//! Fuzzy matching over macro names, aliases and contents

use std::collections::BTreeSet;

use myna_types::Macro;

/// Minimum score (0 to 100) for a candidate to count as a match.
pub const DEFAULT_THRESHOLD: u8 = 70;

/// Matches returned per search facet.
pub const DEFAULT_LIMIT: usize = 5;

/// A candidate index paired with its similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedMatch {
    pub index: usize,
    pub score: u8,
}

/// Ranking seam, so tests and future scorers can swap the algorithm.
pub trait Similarity: Send + Sync {
    /// Indexes of `candidates` scoring at least `threshold`, best first.
    /// Equal scores keep candidate order.
    fn rank(&self, query: &str, candidates: &[String], threshold: u8) -> Vec<RankedMatch>;
}

/// Edit-distance scorer that also tolerates reordered words.
///
/// The score is the better of a plain normalized Levenshtein ratio and a
/// token-set ratio computed on sorted unique words, both case-insensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalSimilarity;

impl LexicalSimilarity {
    fn score(query: &str, candidate: &str) -> u8 {
        let a = query.to_lowercase();
        let b = candidate.to_lowercase();
        let plain = strsim::normalized_levenshtein(&a, &b);
        let tokens = token_set_ratio(&a, &b);
        (plain.max(tokens) * 100.0).round() as u8
    }
}

impl Similarity for LexicalSimilarity {
    fn rank(&self, query: &str, candidates: &[String], threshold: u8) -> Vec<RankedMatch> {
        let mut out: Vec<RankedMatch> = candidates
            .iter()
            .enumerate()
            .map(|(index, c)| RankedMatch {
                index,
                score: Self::score(query, c),
            })
            .filter(|m| m.score >= threshold)
            .collect();
        out.sort_by(|a, b| b.score.cmp(&a.score).then(a.index.cmp(&b.index)));
        out
    }
}

/// Compare sorted unique word sets, scoring the shared core against each
/// side's remainder and the remainders against each other
fn token_set_ratio(a: &str, b: &str) -> f64 {
    let words_a: BTreeSet<&str> = a.split_whitespace().collect();
    let words_b: BTreeSet<&str> = b.split_whitespace().collect();

    let common = join_words(words_a.intersection(&words_b));
    let only_a = join_words(words_a.difference(&words_b));
    let only_b = join_words(words_b.difference(&words_a));

    let with_a = join_nonempty(&common, &only_a);
    let with_b = join_nonempty(&common, &only_b);

    strsim::normalized_levenshtein(&common, &with_a)
        .max(strsim::normalized_levenshtein(&common, &with_b))
        .max(strsim::normalized_levenshtein(&with_a, &with_b))
}

fn join_words<'a>(words: impl Iterator<Item = &'a &'a str>) -> String {
    words.copied().collect::<Vec<_>>().join(" ")
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{} {}", a, b),
    }
}

// ── Macro-level search ─────────────────────────────────────────────────────

/// A name or alias hit: the token that matched and the macro owning it.
#[derive(Debug, Clone)]
pub struct NameMatch {
    pub token: String,
    pub score: u8,
    pub entry: Macro,
}

/// A contents hit.
#[derive(Debug, Clone)]
pub struct ContentMatch {
    pub score: u8,
    pub entry: Macro,
}

/// Rank macros by name and alias. Aliases compete as tokens of their own
/// but report the macro that owns them.
pub fn by_name_or_alias(
    provider: &impl Similarity,
    query: &str,
    candidates: &[Macro],
    threshold: u8,
    limit: usize,
) -> Vec<NameMatch> {
    let mut tokens = Vec::new();
    let mut owners = Vec::new();
    for (i, m) in candidates.iter().enumerate() {
        tokens.push(m.name.clone());
        owners.push(i);
        for alias in &m.aliases {
            tokens.push(alias.clone());
            owners.push(i);
        }
    }
    provider
        .rank(query, &tokens, threshold)
        .into_iter()
        .take(limit)
        .map(|r| NameMatch {
            token: tokens[r.index].clone(),
            score: r.score,
            entry: candidates[owners[r.index]].clone(),
        })
        .collect()
}

/// Rank macros by their contents.
pub fn by_contents(
    provider: &impl Similarity,
    query: &str,
    candidates: &[Macro],
    threshold: u8,
    limit: usize,
) -> Vec<ContentMatch> {
    let contents: Vec<String> = candidates.iter().map(|m| m.contents.clone()).collect();
    provider
        .rank(query, &contents, threshold)
        .into_iter()
        .take(limit)
        .map(|r| ContentMatch {
            score: r.score,
            entry: candidates[r.index].clone(),
        })
        .collect()
}
