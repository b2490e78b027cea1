pub mod aggregate;
pub mod classifier;
pub mod estimator;
pub mod history;
pub mod keywords;
pub mod lexicon;
pub mod models;
#[cfg(test)]
mod estimator_tests;

pub use aggregate::{generate_signal, overall_sentiment, DEFAULT_SOURCE_WEIGHT};
pub use classifier::TextClassifier;
pub use estimator::{surge_alert, SentimentConfig, SentimentEstimator, SURGE_THRESHOLD};
pub use history::SentimentHistory;
pub use keywords::NewsEventType;
pub use models::*;
