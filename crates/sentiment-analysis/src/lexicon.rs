use std::collections::HashMap;
use std::sync::OnceLock;

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't",
    "wasn't", "weren't", "won't", "wouldn't", "couldn't", "shouldn't", "hardly",
    "barely", "neither", "nor", "without",
];

const NEGATION_WINDOW: usize = 3;

/// Finance-tuned word weights, -5 (very negative) to +5 (very positive)
const WORD_WEIGHTS: &[(&str, i32)] = &[
    // positive
    ("bullish", 3), ("rally", 3), ("rallies", 3), ("surge", 3), ("surges", 3), ("soar", 4),
    ("soars", 4), ("gain", 2), ("gains", 2), ("profit", 2), ("profits", 2), ("profitable", 2),
    ("growth", 2), ("beat", 2), ("beats", 2), ("upgrade", 3), ("upgraded", 3),
    ("outperform", 3), ("strong", 2), ("positive", 2), ("rise", 1), ("rises", 1),
    ("increase", 1), ("breakthrough", 4), ("innovation", 2), ("success", 2),
    ("exceed", 2), ("exceeds", 2), ("exceeded", 2), ("momentum", 1), ("buy", 2),
    ("recommend", 2), ("optimistic", 2), ("record", 2), ("advance", 1),
    ("dividend", 1), ("buyback", 2), ("repurchase", 1), ("accretive", 2),
    ("upside", 2), ("recovery", 2), ("rebound", 2), ("expansion", 1), ("robust", 2),
    ("accelerating", 2), ("overweight", 2), ("raised", 1), ("outpacing", 2),
    ("tailwind", 2), ("win", 3), ("wins", 3), ("good", 2), ("great", 3), ("excellent", 4),
    ("moon", 3), ("boom", 3), ("approval", 2), ("approved", 2),
    // negative
    ("bearish", -3), ("decline", -2), ("declines", -2), ("loss", -2), ("losses", -2),
    ("fall", -2), ("falls", -2), ("plunge", -4), ("plunges", -4), ("crash", -5),
    ("crashes", -5), ("miss", -2), ("misses", -2), ("missed", -2), ("downgrade", -3),
    ("downgraded", -3), ("underperform", -3), ("weak", -2), ("negative", -2),
    ("drop", -2), ("drops", -2), ("decrease", -1), ("concern", -1), ("concerns", -1),
    ("risk", -1), ("fail", -2), ("fails", -2), ("failed", -2), ("disappoint", -2),
    ("disappointing", -3), ("slump", -3), ("sell", -2), ("warning", -2),
    ("pessimistic", -2), ("retreat", -1), ("fear", -2), ("fears", -2), ("trouble", -2),
    ("dilution", -2), ("dilutive", -2), ("headwind", -2), ("lawsuit", -2),
    ("litigation", -2), ("recall", -2), ("investigation", -2), ("probe", -2),
    ("default", -3), ("bankruptcy", -5), ("restructuring", -1), ("layoff", -2),
    ("layoffs", -2), ("downside", -2), ("overvalued", -2), ("bubble", -2),
    ("underweight", -2), ("lowered", -1), ("suspended", -3), ("fraud", -5),
    ("bad", -2), ("terrible", -3), ("dump", -3), ("scam", -4),
];

fn weights() -> &'static HashMap<&'static str, i32> {
    static WEIGHTS: OnceLock<HashMap<&'static str, i32>> = OnceLock::new();
    WEIGHTS.get_or_init(|| WORD_WEIGHTS.iter().copied().collect())
}

/// Lowercase word tokens; apostrophes and hyphens stay inside words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
        .map(|w| w.trim_matches(|c| c == '\'' || c == '-'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LexiconScore {
    /// Sum of word weights after negation
    pub score: f64,
    /// `score / token_count`
    pub comparative: f64,
    pub token_count: usize,
    pub positive_words: Vec<String>,
    pub negative_words: Vec<String>,
}

pub fn score_tokens(tokens: &[String]) -> LexiconScore {
    let weights = weights();
    let mut result = LexiconScore {
        token_count: tokens.len(),
        ..Default::default()
    };

    for (i, token) in tokens.iter().enumerate() {
        let Some(&weight) = weights.get(token.as_str()) else {
            continue;
        };

        let negated = tokens[i.saturating_sub(NEGATION_WINDOW)..i]
            .iter()
            .any(|w| NEGATION_WORDS.contains(&w.as_str()));
        let weight = if negated { -weight } else { weight };

        result.score += weight as f64;
        if weight > 0 {
            result.positive_words.push(token.clone());
        } else {
            result.negative_words.push(token.clone());
        }
    }

    if result.token_count > 0 {
        result.comparative = result.score / result.token_count as f64;
    }
    result
}

pub fn score_text(text: &str) -> LexiconScore {
    score_tokens(&tokenize(text))
}
