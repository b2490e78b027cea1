pub mod config;
pub mod engine;
pub mod fusion;
pub mod models;


pub use config::EngineConfig;
pub use engine::{AnalysisEngine, AnalysisEngineBuilder};
pub use fusion::{
    generate_combined_signal, CombinedSignal, ComponentScore, FusionComponents, FusionInputs,
    PATTERN_WEIGHT, RISK_WEIGHT, SENTIMENT_WEIGHT,
};
pub use models::*;
