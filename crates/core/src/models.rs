use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

static DECIMAL_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A\d\z").expect("digit pattern is valid"));

/// Label of a classified message, without any of its extracted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    CheckBalance,
    SendMoney,
    Withdraw,
    Unknown,
}

impl Intent {
    pub const ALL: [Intent; 4] = [
        Intent::CheckBalance,
        Intent::SendMoney,
        Intent::Withdraw,
        Intent::Unknown,
    ];

    pub fn as_label(self) -> &'static str {
        match self {
            Self::CheckBalance => "CHECK_BALANCE",
            Self::SendMoney => "SEND_MONEY",
            Self::Withdraw => "WITHDRAW",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn is_monetary(self) -> bool {
        matches!(self, Self::SendMoney | Self::Withdraw)
    }
}

/// Non-negative integer of any magnitude, kept as canonical ASCII digits.
///
/// Serialises as a bare JSON number. Values past `u64` are written verbatim,
/// so only serde_json round-trips them exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Amount(String);

impl Amount {
    /// Parses a run of Unicode decimal digits (`Nd`), e.g. `"0500"` or `"٥٠٠"`.
    pub fn from_digits(digits: &str) -> Option<Self> {
        if digits.is_empty() {
            return None;
        }

        let mut ascii = String::with_capacity(digits.len());
        for ch in digits.chars() {
            let value = decimal_digit_value(ch)?;
            if ascii.is_empty() && value == 0 {
                continue;
            }
            ascii.push(char::from(b'0' + value));
        }

        if ascii.is_empty() {
            ascii.push('0');
        }
        Some(Self(ascii))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(value) = self.to_u64() {
            return serializer.serialize_u64(value);
        }
        let raw = RawValue::from_string(self.0.clone()).map_err(S::Error::custom)?;
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        let text = raw.get().trim();
        if !text.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(D::Error::custom(format!("invalid amount `{text}`")));
        }
        Amount::from_digits(text).ok_or_else(|| D::Error::custom("empty amount"))
    }
}

/// Value of a decimal digit from any script.
///
/// Unicode keeps every `Nd` digit in an ascending 0..9 block and those blocks
/// only ever abut at multiples of ten, so the value is the number of
/// preceding `Nd` code points modulo ten.
fn decimal_digit_value(ch: char) -> Option<u8> {
    if ch.is_ascii_digit() {
        return Some(ch as u8 - b'0');
    }
    if !is_decimal_digit(ch) {
        return None;
    }

    let code = ch as u32;
    let mut preceding = 0u32;
    while code
        .checked_sub(preceding + 1)
        .and_then(char::from_u32)
        .is_some_and(is_decimal_digit)
    {
        preceding += 1;
    }
    Some((preceding % 10) as u8)
}

fn is_decimal_digit(ch: char) -> bool {
    let mut buf = [0u8; 4];
    DECIMAL_DIGIT.is_match(ch.encode_utf8(&mut buf))
}

/// Fields extracted from a send/withdraw message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyTransfer {
    pub amount: Amount,
    pub phone: Option<String>,
    pub confidence: f64,
}

/// Result of classifying one message.
///
/// Serialises with the label under `intent`; only the monetary variants carry
/// `amount`, `phone` and `confidence`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "intent", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    CheckBalance,
    SendMoney(MoneyTransfer),
    Withdraw(MoneyTransfer),
    Unknown,
}

impl Classification {
    pub fn intent(&self) -> Intent {
        match self {
            Self::CheckBalance => Intent::CheckBalance,
            Self::SendMoney(_) => Intent::SendMoney,
            Self::Withdraw(_) => Intent::Withdraw,
            Self::Unknown => Intent::Unknown,
        }
    }

    pub fn transfer(&self) -> Option<&MoneyTransfer> {
        match self {
            Self::SendMoney(transfer) | Self::Withdraw(transfer) => Some(transfer),
            Self::CheckBalance | Self::Unknown => None,
        }
    }
}

// Flat shape read field by field, so `Amount` sees the raw number text
// instead of a buffered copy.
#[derive(Deserialize)]
struct ClassificationWire {
    intent: Intent,
    #[serde(default)]
    amount: Option<Amount>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

impl ClassificationWire {
    fn into_classification(self) -> Result<Classification, String> {
        let label = self.intent.as_label();
        let transfer = |wire: ClassificationWire| -> Result<MoneyTransfer, String> {
            Ok(MoneyTransfer {
                amount: wire
                    .amount
                    .ok_or_else(|| format!("{label} is missing `amount`"))?,
                phone: wire.phone,
                confidence: wire
                    .confidence
                    .ok_or_else(|| format!("{label} is missing `confidence`"))?,
            })
        };

        match self.intent {
            Intent::CheckBalance => Ok(Classification::CheckBalance),
            Intent::Unknown => Ok(Classification::Unknown),
            Intent::SendMoney => transfer(self).map(Classification::SendMoney),
            Intent::Withdraw => transfer(self).map(Classification::Withdraw),
        }
    }
}

impl<'de> Deserialize<'de> for Classification {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = ClassificationWire::deserialize(deserializer)?;
        wire.into_classification().map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRequest {
    pub text: String,
}

impl IntentRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
