use std::collections::{HashMap, HashSet};

use crate::lexicon::tokenize;
use crate::models::SentimentCategory;

/// Labelled headlines the default classifier is trained on
const TRAINING_CORPUS: &[(&str, SentimentCategory)] = &[
    ("Company beats earnings expectations with record profit", SentimentCategory::Positive),
    ("Stock rallies after strong quarterly revenue growth", SentimentCategory::Positive),
    ("Analysts upgrade shares on robust demand outlook", SentimentCategory::Positive),
    ("Shares surge as guidance raised for the full year", SentimentCategory::Positive),
    ("Board approves buyback and higher dividend", SentimentCategory::Positive),
    ("Breakthrough product launch drives strong sales gains", SentimentCategory::Positive),
    ("Bullish momentum continues as stock hits new high", SentimentCategory::Positive),
    ("Margins expand and profit growth beats estimates", SentimentCategory::Positive),
    ("Regulator grants approval boosting growth prospects", SentimentCategory::Positive),
    ("Investors cheer excellent results and upbeat forecast", SentimentCategory::Positive),
    ("Company misses earnings estimates as losses widen", SentimentCategory::Negative),
    ("Stock plunges after weak guidance and revenue decline", SentimentCategory::Negative),
    ("Analysts downgrade shares citing slowing demand", SentimentCategory::Negative),
    ("Shares crash on fraud investigation and lawsuit", SentimentCategory::Negative),
    ("Layoffs announced as restructuring deepens losses", SentimentCategory::Negative),
    ("Product recall triggers sell off and concern", SentimentCategory::Negative),
    ("Bearish outlook as debt default risk rises", SentimentCategory::Negative),
    ("Margins shrink and profit falls short of estimates", SentimentCategory::Negative),
    ("Regulators open probe into accounting practices", SentimentCategory::Negative),
    ("Investors fear bankruptcy after disappointing results", SentimentCategory::Negative),
    ("Company schedules annual shareholder meeting for Tuesday", SentimentCategory::Neutral),
    ("Shares trade flat ahead of the earnings call", SentimentCategory::Neutral),
    ("Firm names new chief financial officer effective next month", SentimentCategory::Neutral),
    ("Stock will be added to the index next week", SentimentCategory::Neutral),
    ("Company to present at industry conference in March", SentimentCategory::Neutral),
    ("Quarterly report to be released after market close", SentimentCategory::Neutral),
    ("Trading volume was in line with the monthly average", SentimentCategory::Neutral),
    ("Management reiterates existing plans during call", SentimentCategory::Neutral),
    ("The company filed its routine annual report", SentimentCategory::Neutral),
    ("Shares unchanged in early session trading", SentimentCategory::Neutral),
];

const CATEGORIES: [SentimentCategory; 3] = [
    SentimentCategory::Positive,
    SentimentCategory::Negative,
    SentimentCategory::Neutral,
];

#[derive(Debug, Clone, Default)]
struct ClassStats {
    documents: usize,
    token_total: usize,
    token_counts: HashMap<String, usize>,
}

/// Multinomial naive Bayes over word tokens with Laplace smoothing.
#[derive(Debug, Clone)]
pub struct TextClassifier {
    classes: HashMap<SentimentCategory, ClassStats>,
    vocabulary: HashSet<String>,
    documents: usize,
}

impl TextClassifier {
    pub fn train(corpus: &[(&str, SentimentCategory)]) -> Self {
        let mut classes: HashMap<SentimentCategory, ClassStats> = HashMap::new();
        let mut vocabulary = HashSet::new();

        for &(text, category) in corpus {
            let stats = classes.entry(category).or_default();
            stats.documents += 1;
            for token in tokenize(text) {
                stats.token_total += 1;
                *stats.token_counts.entry(token.clone()).or_insert(0) += 1;
                vocabulary.insert(token);
            }
        }

        Self {
            classes,
            vocabulary,
            documents: corpus.len(),
        }
    }

    /// Most likely category and its posterior probability. Untrained
    /// classifiers and empty text come back neutral.
    pub fn classify(&self, text: &str) -> (SentimentCategory, f64) {
        self.classify_tokens(&tokenize(text))
    }

    pub fn classify_tokens(&self, tokens: &[String]) -> (SentimentCategory, f64) {
        if self.documents == 0 || tokens.is_empty() {
            return (SentimentCategory::Neutral, 1.0);
        }

        let vocab = self.vocabulary.len() as f64;
        let log_posteriors: Vec<(SentimentCategory, f64)> = CATEGORIES
            .iter()
            .filter_map(|category| {
                let stats = self.classes.get(category)?;
                let prior = (stats.documents as f64 / self.documents as f64).ln();
                let denominator = stats.token_total as f64 + vocab;
                let likelihood: f64 = tokens
                    .iter()
                    .map(|t| {
                        let count = stats.token_counts.get(t).copied().unwrap_or(0) as f64;
                        ((count + 1.0) / denominator).ln()
                    })
                    .sum();
                Some((*category, prior + likelihood))
            })
            .collect();

        let Some(&(best, best_log)) = log_posteriors
            .iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        else {
            return (SentimentCategory::Neutral, 1.0);
        };

        // softmax over log scores, shifted by the max for stability
        let normaliser: f64 = log_posteriors.iter().map(|(_, l)| (l - best_log).exp()).sum();
        (best, 1.0 / normaliser)
    }
}

impl Default for TextClassifier {
    fn default() -> Self {
        Self::train(TRAINING_CORPUS)
    }
}
