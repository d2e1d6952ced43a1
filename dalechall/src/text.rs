/// Raw tokens of a sentence, split on every whitespace character.  Runs of whitespace
/// yield empty tokens, which normalize to nothing.  Cloning restarts from the current
/// position.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: Option<&'a str>
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        match rest.char_indices().find(|(_, c)| c.is_whitespace()) {
            Some((i, c)) => {
                self.rest = Some(&rest[i + c.len_utf8()..]);
                Some(&rest[..i])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}

/// Splits a sentence into raw tokens
pub fn tokenize(sentence: &str) -> Tokens<'_> {
    Tokens { rest: Some(sentence) }
}

/// Removes the leading and trailing runs of non-alphabetic characters.  Interior
/// characters are kept whatever they are.
pub fn strip_affixes(token: &str) -> &str {
    let start = match token.char_indices().find(|(_, c)| c.is_alphabetic()) {
        Some((i, _)) => i,
        None => return ""
    };
    let end = token.char_indices()
        .rev()
        .find(|(_, c)| c.is_alphabetic())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(start);
    &token[start..end]
}

/// Lowercases a token and strips its non-alphabetic affixes.  Empty when the token has
/// no alphabetic character at all.
pub fn normalize(token: &str) -> String {
    strip_affixes(&token.to_lowercase()).to_owned()
}

/// Normalized, non-empty words of a sentence
pub fn words(sentence: &str) -> impl Iterator<Item = String> + Clone + '_ {
    tokenize(sentence)
        .map(normalize)
        .filter(|w| !w.is_empty())
}
