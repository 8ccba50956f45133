use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Amount, Classification, MoneyTransfer};

/// Confidence reported for every send/withdraw classification.
pub const MONETARY_CONFIDENCE: f64 = 0.9;

static AMOUNT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(send|withdraw)\s+(\d+)").expect("amount pattern is valid"));

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"07\d{8}|2547\d{8}").expect("phone pattern is valid"));

pub trait IntentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Classification;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RuleIntentClassifier;

impl IntentClassifier for RuleIntentClassifier {
    fn classify(&self, text: &str) -> Classification {
        classify_intent(text)
    }

    fn name(&self) -> &'static str {
        "rules"
    }
}

pub fn normalize_text(input: &str) -> String {
    input.to_lowercase()
}

/// Digit run following the first `send`/`withdraw` keyword, in any script.
///
/// Expects normalised text. The value is exact whatever its length.
pub fn extract_amount(text: &str) -> Option<Amount> {
    let captures = AMOUNT_PATTERN.captures(text)?;
    Amount::from_digits(captures.get(2)?.as_str())
}

/// Leftmost `07XXXXXXXX` or `2547XXXXXXXX` sequence, if any.
pub fn extract_phone(text: &str) -> Option<String> {
    PHONE_PATTERN
        .find(text)
        .map(|found| found.as_str().to_string())
}

/// Classifies a message. First matching rule wins; anything unmatched is
/// `Unknown`.
pub fn classify_intent(text: &str) -> Classification {
    let lower = normalize_text(text);

    if lower.contains("balance") {
        return Classification::CheckBalance;
    }

    let Some(amount) = extract_amount(&lower) else {
        return Classification::Unknown;
    };

    let transfer = MoneyTransfer {
        amount,
        phone: extract_phone(&lower),
        confidence: MONETARY_CONFIDENCE,
    };

    // "send" anywhere wins, even when the amount came from a withdraw clause.
    if lower.contains("send") {
        Classification::SendMoney(transfer)
    } else {
        Classification::Withdraw(transfer)
    }
}
