//! Rule-based query routing.
//!
//! A stateless classifier over the lowercased query: keyword families are
//! checked in a fixed precedence order and the first match wins, so ties
//! are impossible. Anything unmatched defers to the LLM fallback agent.

use rand::seq::SliceRandom;

use crate::search::SearchField;

/// Canned replies for greeting queries. Choice is random; callers should
/// only rely on membership in this set.
pub const GREETINGS: [&str; 4] = [
    "Hello! Ask me about any of my projects.",
    "Hi there! I can search projects by keyword, frontend, backend, database, or hardware.",
    "Hey! What would you like to know about my portfolio?",
    "Greetings! Ask away about the projects in this portfolio.",
];

/// The classified intent of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Search(SearchField),
    /// No rule matched: defer to the fallback agent.
    None,
}

/// Classify a raw query. Precedence: greeting, then frontend, backend,
/// database, hardware; first substring match short-circuits.
pub fn classify(query: &str) -> Intent {
    let q = query.to_lowercase();

    const GREETING_WORDS: [&str; 4] = ["hi", "hello", "hey", "greetings"];
    if q.split_whitespace()
        .any(|word| GREETING_WORDS.contains(&word.trim_matches(|c: char| !c.is_alphanumeric())))
    {
        return Intent::Greeting;
    }

    if q.contains("frontend") {
        return Intent::Search(SearchField::Frontend);
    }
    if q.contains("backend") {
        return Intent::Search(SearchField::Backend);
    }
    if q.contains("database") {
        return Intent::Search(SearchField::Database);
    }
    if q.contains("hardware") {
        return Intent::Search(SearchField::Hardware);
    }

    Intent::None
}

/// One of the canned greeting replies.
pub fn greeting_reply() -> String {
    GREETINGS
        .choose(&mut rand::thread_rng())
        .unwrap_or(&GREETINGS[0])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greetings_match_first() {
        assert_eq!(classify("hi"), Intent::Greeting);
        assert_eq!(classify("Hello, what frontend do you use?"), Intent::Greeting);
        assert_eq!(classify("HEY!"), Intent::Greeting);
    }

    #[test]
    fn frontend_beats_backend() {
        // First-match-wins precedence
        assert_eq!(
            classify("compare frontend and backend stacks"),
            Intent::Search(SearchField::Frontend)
        );
    }

    #[test]
    fn each_family_routes_to_its_field() {
        assert_eq!(
            classify("which backend tech?"),
            Intent::Search(SearchField::Backend)
        );
        assert_eq!(
            classify("projects using a database"),
            Intent::Search(SearchField::Database)
        );
        assert_eq!(
            classify("any hardware projects?"),
            Intent::Search(SearchField::Hardware)
        );
    }

    #[test]
    fn unmatched_query_defers() {
        assert_eq!(classify("tell me about digital medics"), Intent::None);
    }

    #[test]
    fn greeting_reply_is_from_the_fixed_set() {
        for _ in 0..20 {
            let reply = greeting_reply();
            assert!(GREETINGS.contains(&reply.as_str()));
        }
    }
}
