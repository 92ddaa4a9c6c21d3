//! Team name normalization and matching.
//!
//! Slip text ("Lakers -3.5", "OKC @ Orlando Magic") and feed names
//! ("Los Angeles Lakers") rarely agree, so matching goes through a
//! canonical alias table plus a deliberately loose containment policy.
//! The loose policy over-matches short tokens by design; callers must use
//! `team_matches` rather than raw set equality.

use std::collections::BTreeSet;

/// Canonical name → known aliases, for the leagues the ledger sees most.
/// Abbreviations mirror the scoreboard feed's team codes.
const NBA_ALIASES: &[(&str, &[&str])] = &[
    ("atlanta hawks", &["hawks", "atl"]),
    ("boston celtics", &["celtics", "bos"]),
    ("brooklyn nets", &["nets", "bkn"]),
    ("charlotte hornets", &["hornets", "cha"]),
    ("chicago bulls", &["bulls", "chi"]),
    ("cleveland cavaliers", &["cavaliers", "cavs", "cle"]),
    ("dallas mavericks", &["mavericks", "mavs", "dal"]),
    ("denver nuggets", &["nuggets", "den"]),
    ("detroit pistons", &["pistons", "det"]),
    ("golden state warriors", &["warriors", "gsw"]),
    ("houston rockets", &["rockets", "hou"]),
    ("indiana pacers", &["pacers", "ind"]),
    ("la clippers", &["clippers", "lac"]),
    ("los angeles lakers", &["lakers", "lal"]),
    ("memphis grizzlies", &["grizzlies", "mem"]),
    ("miami heat", &["heat", "mia"]),
    ("milwaukee bucks", &["bucks", "mil"]),
    ("minnesota timberwolves", &["timberwolves", "wolves", "min"]),
    ("new orleans pelicans", &["pelicans", "nop"]),
    ("new york knicks", &["knicks", "nyk"]),
    ("oklahoma city thunder", &["thunder", "okc"]),
    ("orlando magic", &["magic", "orl"]),
    ("philadelphia 76ers", &["76ers", "sixers", "phi"]),
    ("phoenix suns", &["suns", "phx"]),
    ("portland trail blazers", &["trail blazers", "blazers", "por"]),
    ("sacramento kings", &["kings", "sac"]),
    ("san antonio spurs", &["spurs", "sas"]),
    ("toronto raptors", &["raptors", "tor"]),
    ("utah jazz", &["jazz", "uta"]),
    ("washington wizards", &["wizards", "was"]),
];

/// Immutable alias reference data, injected at construction.
#[derive(Debug, Clone)]
pub struct AliasTable {
    entries: Vec<(String, Vec<String>)>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::nba_defaults()
    }
}

impl AliasTable {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Built-in table covering the NBA, the league the ledger sees most
    pub fn nba_defaults() -> Self {
        Self::from_entries(
            NBA_ALIASES
                .iter()
                .map(|(canonical, aliases)| (*canonical, aliases.iter().copied())),
        )
    }

    pub fn from_entries<'a, I, A>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, A)>,
        A: IntoIterator<Item = &'a str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(canonical, aliases)| {
                    (
                        canonical.trim().to_lowercase(),
                        aliases
                            .into_iter()
                            .map(|a| a.trim().to_lowercase())
                            .collect(),
                    )
                })
                .collect(),
        }
    }

    /// Deduplicated lowercase variants for a team string: the raw name,
    /// every alias of a canonical entry that containment-matches the input
    /// (either direction), and the final whitespace token (the short name,
    /// e.g. "lakers" from "Los Angeles Lakers").
    pub fn normalize(&self, name: &str) -> BTreeSet<String> {
        let raw = name.trim().to_lowercase();
        let mut variants = BTreeSet::new();
        if raw.is_empty() {
            return variants;
        }
        variants.insert(raw.clone());

        for (canonical, aliases) in &self.entries {
            if raw.contains(canonical.as_str()) || canonical.contains(raw.as_str()) {
                variants.insert(canonical.clone());
                variants.extend(aliases.iter().cloned());
            }
        }

        if let Some(last) = raw.split_whitespace().last() {
            variants.insert(last.to_string());
        }

        variants
    }

    /// Symmetric team match: exact equality after trim/lowercase, containment
    /// in either direction, first-word equality when that word is longer than
    /// 3 characters (guards against one-letter false positives), or any
    /// alias-set intersection.
    pub fn team_matches(&self, a: &str, b: &str) -> bool {
        let a = a.trim().to_lowercase();
        let b = b.trim().to_lowercase();
        if a.is_empty() || b.is_empty() {
            return false;
        }
        if a == b || a.contains(b.as_str()) || b.contains(a.as_str()) {
            return true;
        }

        if let (Some(first_a), Some(first_b)) =
            (a.split_whitespace().next(), b.split_whitespace().next())
        {
            if first_a.len() > 3 && first_a == first_b {
                return true;
            }
        }

        !self.normalize(&a).is_disjoint(&self.normalize(&b))
    }
}

/// Separators tried in strict priority order when splitting an event label
const EVENT_SEPARATORS: &[&str] = &[" @ ", " vs ", " v ", " at ", " - "];

/// Split "Lakers vs Celtics" into its two team strings.
///
/// Returns a single-element vec holding the trimmed original when no
/// separator applies; callers must treat that as "could not split", not as
/// a valid one-team event.
pub fn split_event_label(label: &str) -> Vec<String> {
    let trimmed = label.trim();
    for sep in EVENT_SEPARATORS {
        if let Some(idx) = find_ignore_ascii_case(trimmed, sep) {
            let left = trimmed[..idx].trim();
            let right = trimmed[idx + sep.len()..].trim();
            if !left.is_empty() && !right.is_empty() {
                return vec![left.to_string(), right.to_string()];
            }
        }
    }
    vec![trimmed.to_string()]
}

/// Byte-wise case-insensitive find; separators are pure ASCII so byte
/// offsets are valid char boundaries in the haystack.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}
