//! Tokenisation shared by indexing and querying.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"))
}

/// English stop words excluded from the vocabulary.
fn stop_words() -> &'static HashSet<&'static str> {
    static STOP_WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    STOP_WORDS.get_or_init(|| {
        [
            "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
            "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
            "amongst", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
            "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
            "becomes", "been", "before", "beforehand", "behind", "being", "below", "beside",
            "besides", "between", "beyond", "both", "but", "by", "can", "cannot", "could", "did",
            "do", "does", "doing", "done", "down", "due", "during", "each", "eg", "either", "else",
            "elsewhere", "enough", "etc", "even", "ever", "every", "everyone", "everything",
            "everywhere", "except", "few", "for", "former", "formerly", "from", "further", "had",
            "has", "have", "he", "hence", "her", "here", "hereafter", "hereby", "herein", "hers",
            "herself", "him", "himself", "his", "how", "however", "ie", "if", "in", "indeed",
            "into", "is", "it", "its", "itself", "just", "last", "latter", "least", "less", "ltd",
            "many", "may", "me", "meanwhile", "might", "mine", "more", "moreover", "most",
            "mostly", "much", "must", "my", "myself", "namely", "neither", "never",
            "nevertheless", "next", "no", "nobody", "none", "nor", "not", "nothing", "now",
            "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto", "or", "other",
            "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "per",
            "perhaps", "please", "rather", "re", "same", "seem", "seemed", "seeming", "seems",
            "several", "she", "should", "since", "so", "some", "somehow", "someone", "something",
            "sometime", "sometimes", "somewhere", "still", "such", "than", "that", "the", "their",
            "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
            "therefore", "therein", "thereupon", "these", "they", "this", "those", "though",
            "through", "throughout", "thru", "thus", "to", "together", "too", "toward",
            "towards", "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well",
            "were", "what", "whatever", "when", "whence", "whenever", "where", "whereafter",
            "whereas", "whereby", "wherein", "whereupon", "wherever", "whether", "which",
            "while", "whither", "who", "whoever", "whole", "whom", "whose", "why", "will", "with",
            "within", "without", "would", "yet", "you", "your", "yours", "yourself",
            "yourselves",
        ]
        .into_iter()
        .collect()
    })
}

/// Strip common inflections so that "claims"/"claim" and "filed"/"file"
/// land on the same term.
fn normalize(word: &str) -> String {
    let mut stem = word;

    if let Some(base) = stem.strip_suffix("ies").filter(|b| b.len() >= 2) {
        return format!("{base}y");
    }
    for suffix in ["ing", "ed"] {
        if let Some(base) = stem.strip_suffix(suffix).filter(|b| b.len() >= 3) {
            stem = base;
            break;
        }
    }
    if stem.len() > 3 && stem.ends_with('s') && !stem.ends_with("ss") && !stem.ends_with("us") {
        stem = &stem[..stem.len() - 1];
    }
    if stem.len() > 3 && stem.ends_with('e') {
        stem = &stem[..stem.len() - 1];
    }

    stem.to_string()
}

/// Lowercase, split into tokens of two or more word characters, drop stop
/// words, and normalise inflections.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let stop = stop_words();

    token_pattern()
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|token| !stop.contains(token))
        .map(normalize)
        .collect()
}
