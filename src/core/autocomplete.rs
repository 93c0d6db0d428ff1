// src/core/autocomplete.rs

//! Prefix-based completion over command names, option trees and remote lookups.
//!
//! All functions here are pure. The controller decides which partial token to
//! complete and what to do with the returned [`Completion`].

use crate::models::OptionNode;

/// Outcome of completing a partial token against a candidate set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Nothing matched. The input is left untouched.
    None,
    /// Exactly one candidate matched.
    Single(String),
    /// Several candidates matched.
    Multiple {
        /// Characters shared by every match beyond the partial. May be empty.
        extension: String,
        /// Every match, in candidate order.
        candidates: Vec<String>,
    },
}

impl Completion {
    /// Text that should replace `partial` in the input, if any.
    ///
    /// A single match is followed by a space so the next token can be typed directly.
    pub fn replacement(&self, partial: &str) -> Option<String> {
        match self {
            Self::None => None,
            Self::Single(word) => Some(format!("{} ", word)),
            Self::Multiple { extension, .. } if extension.is_empty() => None,
            Self::Multiple { extension, .. } => Some(format!("{}{}", partial, extension)),
        }
    }

    /// Candidates that should be listed to the user.
    pub fn listing(&self) -> &[String] {
        match self {
            Self::Multiple { candidates, .. } => candidates,
            _ => &[],
        }
    }
}

/// Candidates having `partial` as a literal prefix. No case folding.
pub fn prefix_matches<'a, I>(partial: &str, candidates: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .filter(|candidate| candidate.starts_with(partial))
        .collect()
}

/// The longest extension beyond `partial` shared by every match.
///
/// Characters are compared position by position starting right after the
/// partial; the first mismatch (or the end of any match) stops the scan.
pub fn common_extension(partial: &str, matches: &[&str]) -> String {
    let Some((first, rest)) = matches.split_first() else {
        return String::new();
    };
    let Some(first_tail) = first.strip_prefix(partial) else {
        return String::new();
    };
    let mut tails: Vec<std::str::Chars<'_>> = rest
        .iter()
        .filter_map(|m| m.strip_prefix(partial))
        .map(str::chars)
        .collect();
    if tails.len() != rest.len() {
        return String::new();
    }

    let mut extension = String::new();
    for expected in first_tail.chars() {
        let all_agree = tails.iter_mut().all(|tail| tail.next() == Some(expected));
        if !all_agree {
            break;
        }
        extension.push(expected);
    }
    extension
}

/// Completes `partial` against `candidates` using the single/multiple/none policy.
pub fn complete<'a, I>(partial: &str, candidates: I) -> Completion
where
    I: IntoIterator<Item = &'a str>,
{
    let matches = prefix_matches(partial, candidates);
    match matches.as_slice() {
        [] => Completion::None,
        [only] => Completion::Single((*only).to_string()),
        many => Completion::Multiple {
            extension: common_extension(partial, many),
            candidates: many.iter().map(|m| (*m).to_string()).collect(),
        },
    }
}

/// Completes the last token of an option path.
///
/// `typed` holds the complete option tokens typed after the command name; the
/// node they lead to provides the candidates for `partial`. A path leaving the
/// tree or reaching a leaf yields [`Completion::None`].
pub fn complete_option(tree: &OptionNode, typed: &[&str], partial: &str) -> Completion {
    match tree.descend(typed.iter().copied()) {
        Some(node) if !node.is_leaf() => complete(partial, node.keys()),
        _ => Completion::None,
    }
}

/// Splits an input buffer into its complete tokens and the partial token under completion.
///
/// A buffer ending in whitespace has an empty partial.
pub fn split_partial(buffer: &str) -> (Vec<&str>, &str) {
    let mut tokens: Vec<&str> = buffer.split_whitespace().collect();
    let ends_open = buffer.is_empty() || buffer.ends_with(char::is_whitespace);
    if ends_open {
        return (tokens, "");
    }
    let partial = tokens.pop().unwrap_or("");
    (tokens, partial)
}
