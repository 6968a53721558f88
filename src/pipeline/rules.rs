//! Keyword rules that classify a message as a debit or credit.
//!
//! Two independent case-insensitive patterns run over the body. The debit
//! pattern is checked first, so a message mentioning both ("paid ... and
//! received cashback") is classified as a debit. Keywords match anywhere in
//! the text, including inside longer words.

use regex::Regex;
use tracing::trace;

use crate::pipeline::types::TransactionKind;

const DEBIT_PATTERN: &str = r"(?i)debited|spent|purchase|sent|paid";
const CREDIT_PATTERN: &str = r"(?i)credited|received|deposited|added";

/// Outcome of classifying a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Debit,
    Credit,
    None,
}

impl Classification {
    pub fn kind(self) -> Option<TransactionKind> {
        match self {
            Self::Debit => Some(TransactionKind::Debit),
            Self::Credit => Some(TransactionKind::Credit),
            Self::None => None,
        }
    }
}

/// Debit/credit keyword classifier.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    debit: Regex,
    credit: Regex,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self {
            debit: Regex::new(DEBIT_PATTERN).unwrap(),
            credit: Regex::new(CREDIT_PATTERN).unwrap(),
        }
    }
}

impl KeywordClassifier {
    /// Build a classifier from custom debit and credit patterns.
    pub fn with_patterns(debit: &str, credit: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            debit: Regex::new(debit)?,
            credit: Regex::new(credit)?,
        })
    }

    /// Classify a message body. Debit wins when both patterns match.
    pub fn classify(&self, body: &str) -> Classification {
        let result = if self.debit.is_match(body) {
            Classification::Debit
        } else if self.credit.is_match(body) {
            Classification::Credit
        } else {
            Classification::None
        };
        trace!(?result, "Classified message body");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_debit_keywords() {
        let rules = KeywordClassifier::default();
        for body in [
            "Rs. 500 debited from your account",
            "You have SPENT INR 200 on your card",
            "Purchase of Rs.99 at STORE",
            "Rs 10 sent to alice@upi",
            "Paid Rs. 45 to METRO",
        ] {
            assert_eq!(rules.classify(body), Classification::Debit, "{body}");
        }
    }

    #[test]
    fn detects_credit_keywords() {
        let rules = KeywordClassifier::default();
        for body in [
            "Rs. 5,000 credited to a/c XX1234",
            "You have received INR 150",
            "Salary deposited: Rs. 40,000",
            "Rs 20 cashback added to wallet",
        ] {
            assert_eq!(rules.classify(body), Classification::Credit, "{body}");
        }
    }

    #[test]
    fn debit_wins_tie_break() {
        let rules = KeywordClassifier::default();
        let body = "Rs. 100 paid to SHOP; Rs. 5 cashback credited";
        assert_eq!(rules.classify(body), Classification::Debit);
    }

    #[test]
    fn no_keywords_is_none() {
        let rules = KeywordClassifier::default();
        assert_eq!(rules.classify("Hello, your OTP is 4532"), Classification::None);
        assert_eq!(rules.classify(""), Classification::None);
        assert_eq!(Classification::None.kind(), None);
    }

    #[test]
    fn keywords_match_inside_words() {
        // "consent" contains "sent"; plain substring matching is the rule.
        let rules = KeywordClassifier::default();
        assert_eq!(rules.classify("Reply YES to consent"), Classification::Debit);
    }

    #[test]
    fn custom_patterns() {
        let rules = KeywordClassifier::with_patterns(r"(?i)withdrawn", r"(?i)refund").unwrap();
        assert_eq!(rules.classify("Rs 10 withdrawn"), Classification::Debit);
        assert_eq!(rules.classify("Refund of Rs 10"), Classification::Credit);
        assert_eq!(rules.classify("Rs 10 debited"), Classification::None);
        assert!(KeywordClassifier::with_patterns("(", "x").is_err());
    }
}
