use serde::{Deserialize, Serialize};

/// Finance terms reported back as item keywords
const FINANCE_KEYWORDS: &[&str] = &[
    "earnings", "revenue", "profit", "loss", "guidance", "dividend", "buyback",
    "merger", "acquisition", "ipo", "upgrade", "downgrade", "lawsuit", "bankruptcy",
    "layoffs", "recall", "fda", "sec", "analyst", "forecast", "margin", "margins",
    "debt", "growth", "eps", "valuation", "inflation", "rates", "fed", "short",
    "squeeze", "calls", "puts", "options",
];

/// Distinct finance keywords in order of first appearance
pub fn extract_keywords(tokens: &[String]) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for token in tokens {
        if FINANCE_KEYWORDS.contains(&token.as_str()) && !found.contains(token) {
            found.push(token.clone());
        }
    }
    found
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsEventType {
    Earnings,
    MergersAcquisitions,
    Regulatory,
    AnalystAction,
    Management,
    Product,
    Legal,
    Macro,
    General,
}

/// First matching event bucket for a lowercased headline + body
pub fn classify_event(text: &str) -> NewsEventType {
    let text = text.to_lowercase();
    let has = |needle: &str| text.contains(needle);

    if has("earnings") || has("quarterly") || has("guidance")
        || has("revenue") && (has("beat") || has("miss") || has("report"))
        || has("eps") || has("profit") && has("quarter") {
        NewsEventType::Earnings
    } else if has("acqui") || has("merger") || has("buyout") || has("takeover") || has("spin-off") {
        NewsEventType::MergersAcquisitions
    } else if has("fda") || has("sec ") || has("regulat") || has("approval") || has("antitrust") {
        NewsEventType::Regulatory
    } else if has("upgrade") || has("downgrade") || has("price target") || has("analyst") || has("rating") {
        NewsEventType::AnalystAction
    } else if has("ceo") || has("cfo") || has("board") || has("executive") || has("resign") || has("appoint") {
        NewsEventType::Management
    } else if has("launch") || has("product") || has("recall") || has("patent") {
        NewsEventType::Product
    } else if has("lawsuit") || has("litigation") || has("settlement") || has("sued") || has("court") {
        NewsEventType::Legal
    } else if has("federal reserve") || has("interest rate") || has("inflation") || has("gdp") || has("unemployment") {
        NewsEventType::Macro
    } else {
        NewsEventType::General
    }
}
