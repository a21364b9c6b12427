//! Ranking of catalog display texts against a typed query.
//!
//! Rows are compared case-insensitively and placed into tiers:
//!
//! | tier | rule                                               | order within |
//! |------|----------------------------------------------------|--------------|
//! | 0    | row equals the query                               | catalog      |
//! | 1    | row starts with the query                          | catalog      |
//! | 2    | query starts a later word of the row               | position     |
//! | 3    | every query token starts some word, in any order   | catalog      |
//! | 4    | query occurs anywhere                              | position     |
//!
//! Only when no row reaches any tier, rows whose characters follow the query's
//! characters roughly in order are returned instead, best score first.

use std::collections::HashMap;

use super::adapter::{BlockOption, LegacyOption, to_option};
use crate::parser::recognize_literal;

/// Default cap on the number of options returned for one query.
pub const MAX_MATCHES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    Exact,
    Prefix,
    WordBoundary,
    AllTokens,
    Substring,
    Similar,
}

/// Rank `rows` against `query` and return at most `limit` row texts.
///
/// If the query is a literal shorthand (`42`, `"hi"`) that no row spells
/// exactly, the query itself is returned first.
pub fn matching_rows(rows: &[&str], query: &str, limit: usize) -> Vec<String> {
    let query = query.trim();
    if query.is_empty() || limit == 0 {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    let tokens: Vec<&str> = needle.split_whitespace().collect();

    let mut ranked: Vec<(Tier, usize, usize)> = rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| {
            rank(&row.to_lowercase(), &needle, &tokens).map(|(tier, pos)| (tier, pos, index))
        })
        .collect();
    if ranked.is_empty() {
        ranked = rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| {
                similarity(&row.to_lowercase(), &needle).map(|score| (Tier::Similar, score, index))
            })
            .collect();
    }
    ranked.sort();

    let mut out = Vec::with_capacity(ranked.len().min(limit) + 1);
    if recognize_literal(query).is_some() && !rows.contains(&query) {
        out.push(query.to_string());
    }
    out.extend(ranked.into_iter().map(|(_, _, index)| rows[index].to_string()));
    out.truncate(limit);
    out
}

fn rank(row: &str, needle: &str, tokens: &[&str]) -> Option<(Tier, usize)> {
    if row == needle {
        return Some((Tier::Exact, 0));
    }
    if row.starts_with(needle) {
        return Some((Tier::Prefix, 0));
    }
    if let Some(pos) = row
        .match_indices(needle)
        .map(|(i, _)| i)
        .find(|&i| row[..i].chars().next_back().is_some_and(|c| !is_word_char(c)))
    {
        return Some((Tier::WordBoundary, pos));
    }
    if !tokens.is_empty() {
        let words: Vec<&str> = row
            .split(|c: char| c.is_whitespace() || c == '.')
            .filter(|w| !w.is_empty())
            .collect();
        if tokens.iter().all(|t| words.iter().any(|w| w.starts_with(t))) {
            return Some((Tier::AllTokens, 0));
        }
    }
    row.find(needle).map(|pos| (Tier::Substring, pos))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Character-order similarity score; lower is better. Rows scoring
/// `6 × query length` or worse are rejected.
fn similarity(row: &str, needle: &str) -> Option<usize> {
    let chars: Vec<char> = row.chars().collect();
    let mut score = 0usize;
    let mut last: isize = -1;
    let mut penalty = 10usize;
    for c in needle.chars() {
        let pos = chars.iter().position(|&x| x == c).map_or(-1, |p| p as isize);
        if pos > last {
            let gap = (pos - last - 1) as usize;
            score += gap.min(penalty - 5);
            last = pos;
        } else {
            score += penalty;
            penalty += 5;
        }
    }
    (score < needle.chars().count() * 6).then_some(score)
}

/// Match `query` against the display texts of `options`, capped at
/// [`MAX_MATCHES`].
pub fn match_options(options: &[BlockOption], query: &str) -> Vec<BlockOption> {
    match_options_limited(options, query, MAX_MATCHES)
}

/// Like [`match_options`] with an explicit cap.
///
/// Each matched text resolves to the catalog option with that display text,
/// or failing that to a synthesized literal option; anything else is
/// discarded.
pub fn match_options_limited(options: &[BlockOption], query: &str, limit: usize) -> Vec<BlockOption> {
    let index: HashMap<&str, &BlockOption> = options
        .iter()
        .map(|o| (o.display_text.as_str(), o))
        .collect();
    let rows: Vec<&str> = options.iter().map(|o| o.display_text.as_str()).collect();
    matching_rows(&rows, query, limit)
        .into_iter()
        .filter_map(|text| {
            if let Some(option) = index.get(text.as_str()) {
                return Some((*option).clone());
            }
            let literal = recognize_literal(&text)?;
            to_option(&text, &LegacyOption::from(&literal)).ok()
        })
        .collect()
}
