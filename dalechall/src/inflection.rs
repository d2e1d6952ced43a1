use crate::text::normalize;

/// Suffixes that turn a base word into an inflected form
pub const SUFFIXES: [&str; 6] = ["'s", "s", "es", "ing", "ed", "d"];

// `form` is exactly `base` followed by one suffix
fn is_inflection_of(base: &str, form: &str) -> bool {
    SUFFIXES.iter().any(|suffix| {
        form.len() == base.len() + suffix.len()
            && form.starts_with(base)
            && form.ends_with(suffix)
    })
}

/// Two words are the same when their normalized forms are equal or one is the other
/// plus a single suffix.  Symmetric in its arguments.
/// ```rust
///   use dalechall::inflection::is_same;
///
///   assert!(is_same("taste", "tasted"));
///   assert!(is_same("!!sed", "!S"));
///   assert!(!is_same("taste", "tastes!d"));
/// ```
pub fn is_same(a: &str, b: &str) -> bool {
    let (a, b) = (normalize(a), normalize(b));
    a == b || is_inflection_of(&a, &b) || is_inflection_of(&b, &a)
}

/// Scans `lexicon` in order and returns the first entry that is the same word as `word`
pub fn find_match<'a, S: AsRef<str>>(word: &str, lexicon: &'a [S]) -> Option<&'a S> {
    let word = normalize(word);
    lexicon.iter().find(|entry| {
        let entry = normalize(entry.as_ref());
        word == entry || is_inflection_of(&word, &entry) || is_inflection_of(&entry, &word)
    })
}

/// Every normalized word that `is_same` would accept for an already normalized `word`:
/// itself, itself plus each suffix and itself minus each suffix it ends with.
pub fn related_forms(word: &str) -> Vec<String> {
    let mut forms = vec![word.to_owned()];
    for suffix in SUFFIXES.iter() {
        forms.push(format!("{}{}", word, suffix));
        if let Some(root) = word.strip_suffix(suffix) {
            forms.push(root.to_owned());
        }
    }
    forms
}
