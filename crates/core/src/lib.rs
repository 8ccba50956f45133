pub mod intent;
pub mod models;

pub use intent::{
    classify_intent, extract_amount, extract_phone, normalize_text, IntentClassifier,
    RuleIntentClassifier, MONETARY_CONFIDENCE,
};
pub use models::*;
