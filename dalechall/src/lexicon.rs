use std::collections::HashMap;

use crate::inflection::{self, related_forms};
use crate::text::normalize;

/// Whether a word is on the easy-word list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DifficultyLabel {
    /// Matches a lexicon entry or one of its inflections
    Easy,
    /// Everything else
    Difficult
}

/// The easy-word list, in file order, with an index over every inflected form of every
/// entry.  Lookups through the index return the same entry a front-to-back scan would.
#[derive(Debug, Clone)]
pub struct Lexicon {
    entries: Vec<String>,
    index: HashMap<String, usize>
}

impl Lexicon {

    /// Builds a lexicon from entries in priority order
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        let entries: Vec<String> = entries.into_iter().map(Into::into).collect();
        let mut index = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            for form in related_forms(&normalize(entry)) {
                index.entry(form).or_insert(i);
            }
        }
        debug!("Indexed {} lexicon entries under {} forms", entries.len(), index.len());
        Lexicon { entries, index }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in their original order
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// First entry that is the same word as `word`, if any
    pub fn find_match(&self, word: &str) -> Option<&str> {
        self.index.get(&normalize(word)).map(|&i| self.entries[i].as_str())
    }

    /// Same as `find_match`, scanning every entry
    pub fn find_match_linear(&self, word: &str) -> Option<&str> {
        inflection::find_match(word, &self.entries).map(String::as_str)
    }

    /// True if the word matches some entry
    pub fn is_easy(&self, word: &str) -> bool {
        self.find_match(word).is_some()
    }

    /// Classifies a word
    pub fn label(&self, word: &str) -> DifficultyLabel {
        if self.is_easy(word) {
            DifficultyLabel::Easy
        } else {
            DifficultyLabel::Difficult
        }
    }
}

#[cfg(test)]
mod lexicon_test {
    use super::*;

    fn lexicon() -> Lexicon {
        Lexicon::new(vec!["the", "cat", "sat", "on", "mat", "it", "was", "taste", "tasted", "Box", "!!"])
    }

    #[test]
    fn test_labels() {
        let lex = lexicon();
        assert_eq!(lex.label("The"), DifficultyLabel::Easy);
        assert_eq!(lex.label("cats"), DifficultyLabel::Easy);
        assert_eq!(lex.label("boxes"), DifficultyLabel::Easy);
        assert_eq!(lex.label("happy"), DifficultyLabel::Difficult);
        assert_eq!(lex.len(), 11);
    }

    #[test]
    fn test_first_entry_wins() {
        let lex = lexicon();
        assert_eq!(lex.find_match("tasted"), Some("taste"));
        assert_eq!(lex.find_match("TASTE."), Some("taste"));
    }

    #[test]
    fn test_index_agrees_with_scan() {
        let lex = lexicon();
        let words = ["the", "thes", "cat's", "sats", "sa", "on", "ons", "o", "mated", "mate",
                      "its", "i", "wa", "was", "waste", "tast", "tasteds", "boxing", "bo",
                      "happy", "s", "ed", "", "!!", "1234", "Cats!"];
        for word in words.iter() {
            assert_eq!(lex.find_match(word), lex.find_match_linear(word), "{:?}", word);
        }
    }

    #[test]
    fn test_empty_lexicon() {
        let lex = Lexicon::new(Vec::<String>::new());
        assert!(lex.is_empty());
        assert_eq!(lex.label("the"), DifficultyLabel::Difficult);
    }
}
