// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic request classification.
//!
//! Classifies user requests with zero-cost rules: memory-command prefix,
//! question markers, and a word-count shortness threshold. No LLM
//! pre-call, no network, no latency.

use mnemos_config::model::RouterConfig;

/// Signals derived from one request by the fast classifier.
#[derive(Debug, Clone)]
pub struct RequestSignals {
    /// When the request is an explicit memory command, the payload to
    /// store verbatim (prefix stripped).
    pub memory_payload: Option<String>,
    /// Whether the request is question-shaped.
    pub is_question: bool,
    /// Whether the request is below the word-count threshold.
    pub is_short: bool,
    /// Number of whitespace-separated words.
    pub word_count: usize,
}

/// Zero-cost request classifier driven by configured token lists.
pub struct RequestClassifier {
    memory_prefixes: Vec<String>,
    question_words: Vec<String>,
    preference_keywords: Vec<String>,
    short_word_limit: usize,
}

impl RequestClassifier {
    /// Builds a classifier from router configuration, lowercasing all
    /// token lists once up front.
    pub fn new(config: &RouterConfig) -> Self {
        Self {
            memory_prefixes: lowercased(&config.memory_prefixes),
            question_words: lowercased(&config.question_words),
            preference_keywords: lowercased(&config.preference_keywords),
            short_word_limit: config.short_word_limit,
        }
    }

    /// Classifies one request.
    pub fn classify(&self, text: &str) -> RequestSignals {
        let trimmed = text.trim();
        let lower = trimmed.to_lowercase();

        let memory_payload = self.memory_prefixes.iter().find_map(|prefix| {
            lower.strip_prefix(prefix.as_str()).and_then(|rest| {
                // The prefix must end at a word boundary: "remember" must
                // not swallow "remembering".
                if rest.is_empty() || rest.starts_with(|c: char| !c.is_alphanumeric()) {
                    Some(trimmed[prefix.len()..].trim().to_string())
                } else {
                    None
                }
            })
        });

        let word_count = trimmed.split_whitespace().count();
        let is_short = word_count < self.short_word_limit;
        let is_question = trimmed.contains('?')
            || words_of(&lower).any(|w| self.question_words.iter().any(|q| q == w));

        RequestSignals {
            memory_payload,
            is_question,
            is_short,
            word_count,
        }
    }

    /// Whether the request mentions a configured personal-preference
    /// keyword. Gates the semantic-search enrichment source.
    pub fn has_preference_keyword(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        words_of(&lower).any(|w| self.preference_keywords.iter().any(|k| k == w))
    }
}

fn lowercased(tokens: &[String]) -> Vec<String> {
    tokens.iter().map(|t| t.to_lowercase()).collect()
}

/// Words of a lowercased text. Splitting on every non-alphanumeric
/// character also handles French elision ("j'aime" yields "aime").
fn words_of(lower: &str) -> impl Iterator<Item = &str> {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> RequestClassifier {
        RequestClassifier::new(&RouterConfig::default())
    }

    #[test]
    fn memory_command_splits_payload() {
        let signals = classifier().classify("souviens-toi que j'aime le café");
        assert_eq!(
            signals.memory_payload.as_deref(),
            Some("que j'aime le café")
        );
    }

    #[test]
    fn memory_command_english_prefix() {
        let signals = classifier().classify("Remember that I am allergic to peanuts");
        assert_eq!(
            signals.memory_payload.as_deref(),
            Some("that I am allergic to peanuts")
        );
    }

    #[test]
    fn prefix_requires_word_boundary() {
        let signals = classifier().classify("remembering my trip to Rome was fun");
        assert!(signals.memory_payload.is_none());
    }

    #[test]
    fn question_mark_is_a_question() {
        let signals = classifier().classify("tu connais Marie ?");
        assert!(signals.is_question);
    }

    #[test]
    fn interrogative_word_is_a_question() {
        let signals = classifier().classify("où habite Marie");
        assert!(signals.is_question);
        let signals = classifier().classify("what happened yesterday with the heating");
        assert!(signals.is_question);
    }

    #[test]
    fn statement_is_not_a_question() {
        let signals = classifier().classify("il fait beau aujourd'hui dehors");
        assert!(!signals.is_question);
    }

    #[test]
    fn shortness_threshold() {
        let signals = classifier().classify("bonjour");
        assert!(signals.is_short);
        assert_eq!(signals.word_count, 1);

        let signals = classifier().classify("je voudrais savoir quelque chose de précis");
        assert!(!signals.is_short);
    }

    #[test]
    fn preference_keyword_detection() {
        let c = classifier();
        assert!(c.has_preference_keyword("qu'est-ce que j'aime comme musique ?"));
        assert!(c.has_preference_keyword("what food do I like best?"));
        assert!(!c.has_preference_keyword("quelle heure est-il ?"));
    }

    #[test]
    fn preference_keyword_matches_whole_words_only() {
        // "likely" must not match the "like" keyword.
        assert!(!classifier().has_preference_keyword("it will likely rain tomorrow"));
    }
}
