//! Message parser: turns one raw bank SMS into a transaction or a rejection.
//!
//! Stages, each short-circuiting:
//! 1. Keyword classification (debit / credit / neither)
//! 2. Amount extraction (must be a positive `Rs.`/`INR` amount)
//! 3. Account suffix (best-effort)
//! 4. Bank identity (best-effort, "Unknown Bank" when unmatched)
//! 5. Description (merchant for debits, fixed literal for credits)
//! 6. Assembly, with the UTC date of the message timestamp
//!
//! The description is always the merchant text, never the bank name.
//! The parser holds only compiled patterns and performs no I/O.

use chrono::DateTime;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::Rejection;
use crate::pipeline::banks::BankDirectory;
use crate::pipeline::extract::FieldExtractor;
use crate::pipeline::rules::KeywordClassifier;
use crate::pipeline::types::{ParsedTransaction, RawMessage};

/// Composes classifier, extractors and bank resolver.
#[derive(Debug, Clone, Default)]
pub struct MessageParser {
    classifier: KeywordClassifier,
    extractor: FieldExtractor,
    banks: BankDirectory,
}

impl MessageParser {
    pub fn new(classifier: KeywordClassifier, extractor: FieldExtractor, banks: BankDirectory) -> Self {
        Self {
            classifier,
            extractor,
            banks,
        }
    }

    /// Parser with default rules and the given description length bound.
    pub fn with_description_max_len(max_len: usize) -> Self {
        Self {
            extractor: FieldExtractor::new(max_len),
            ..Self::default()
        }
    }

    pub fn banks(&self) -> &BankDirectory {
        &self.banks
    }

    /// Parse a message.
    pub fn parse(&self, message: &RawMessage) -> Result<ParsedTransaction, Rejection> {
        let kind = self
            .classifier
            .classify(&message.body)
            .kind()
            .ok_or(Rejection::ClassificationRejected)?;

        let amount = self
            .extractor
            .extract_amount(&message.body)
            .ok_or_else(|| Rejection::ExtractionFailed {
                reason: "no Rs./INR amount found".into(),
            })?;
        if amount <= Decimal::ZERO {
            return Err(Rejection::ExtractionFailed {
                reason: format!("non-positive amount {amount}"),
            });
        }

        let account_suffix = self.extractor.extract_account_suffix(&message.body);
        let bank = self.banks.resolve(&message.sender);
        let description = self.extractor.extract_description(&message.body, kind);

        let occurred_on = DateTime::from_timestamp_millis(message.timestamp_millis)
            .ok_or_else(|| Rejection::ExtractionFailed {
                reason: format!("timestamp {} out of range", message.timestamp_millis),
            })?
            .date_naive();

        debug!(
            sender = %message.sender,
            kind = kind.as_str(),
            %amount,
            bank = bank.display_name(),
            "Parsed bank message"
        );

        Ok(ParsedTransaction {
            amount,
            kind,
            account_suffix,
            occurred_on,
            bank_name: bank.display_name().to_string(),
            description,
            fingerprint: fingerprint(message),
        })
    }
}

/// Stable content fingerprint of a message: SHA-256 over sender, body and
/// timestamp, separated by a unit separator byte.
pub fn fingerprint(message: &RawMessage) -> String {
    let mut hasher = Sha256::new();
    hasher.update(message.sender.as_bytes());
    hasher.update([0x1f]);
    hasher.update(message.body.as_bytes());
    hasher.update([0x1f]);
    hasher.update(message.timestamp_millis.to_be_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::pipeline::banks::UNKNOWN_BANK;
    use crate::pipeline::extract::{CREDIT_DESCRIPTION, DEBIT_FALLBACK_DESCRIPTION};
    use crate::pipeline::types::TransactionKind;

    // 2024-01-12T10:30:00Z
    const T: i64 = 1_705_055_400_000;

    fn msg(sender: &str, body: &str) -> RawMessage {
        RawMessage::new(sender, body, T)
    }

    #[test]
    fn hdfc_amazon_debit() {
        let parser = MessageParser::default();
        let tx = parser
            .parse(&msg(
                "HDFCBK",
                "Rs. 2,500.00 debited from a/c XX1234 at AMAZON on 12-01",
            ))
            .unwrap();

        assert_eq!(tx.amount, dec!(2500.00));
        assert_eq!(tx.kind, TransactionKind::Debit);
        assert_eq!(tx.account_suffix.as_deref(), Some("1234"));
        assert_eq!(tx.bank_name, "HDFC Bank");
        assert_eq!(tx.description, "AMAZON");
        assert_eq!(tx.occurred_on, NaiveDate::from_ymd_opt(2024, 1, 12).unwrap());
    }

    #[test]
    fn otp_message_is_rejected() {
        let parser = MessageParser::default();
        let result = parser.parse(&msg("HDFCBK", "Hello, your OTP is 4532"));
        assert_eq!(result, Err(Rejection::ClassificationRejected));
    }

    #[test]
    fn missing_amount_is_extraction_failure() {
        let parser = MessageParser::default();
        let result = parser.parse(&msg("SBIINB", "Your account was debited"));
        assert!(matches!(result, Err(Rejection::ExtractionFailed { .. })));
    }

    #[test]
    fn zero_amount_is_rejected() {
        let parser = MessageParser::default();
        let result = parser.parse(&msg("SBIINB", "Rs. 0.00 debited from a/c XX1234"));
        assert!(matches!(result, Err(Rejection::ExtractionFailed { .. })));
    }

    #[test]
    fn credit_uses_fixed_description() {
        let parser = MessageParser::default();
        let tx = parser
            .parse(&msg("AX-SBIINB", "INR 40,000 credited to A/c 5678 from ACME CORP"))
            .unwrap();
        assert_eq!(tx.kind, TransactionKind::Credit);
        assert_eq!(tx.amount, dec!(40000));
        assert_eq!(tx.bank_name, "SBI");
        assert_eq!(tx.description, CREDIT_DESCRIPTION);
        assert_eq!(tx.account_suffix.as_deref(), Some("5678"));
    }

    #[test]
    fn unknown_sender_still_parses() {
        let parser = MessageParser::default();
        let tx = parser.parse(&msg("FEDBNK", "Rs. 99 debited")).unwrap();
        assert_eq!(tx.bank_name, UNKNOWN_BANK);
        assert_eq!(tx.description, DEBIT_FALLBACK_DESCRIPTION);
        assert!(tx.account_suffix.is_none());
    }

    #[test]
    fn date_is_utc_calendar_day() {
        let parser = MessageParser::default();
        // 2024-01-12T23:59:59.999Z
        let late = RawMessage::new("HDFCBK", "Rs 10 spent", 1_705_103_999_999);
        assert_eq!(
            parser.parse(&late).unwrap().occurred_on,
            NaiveDate::from_ymd_opt(2024, 1, 12).unwrap()
        );
        let next = RawMessage::new("HDFCBK", "Rs 10 spent", 1_705_104_000_000);
        assert_eq!(
            parser.parse(&next).unwrap().occurred_on,
            NaiveDate::from_ymd_opt(2024, 1, 13).unwrap()
        );
    }

    #[test]
    fn out_of_range_timestamp_is_rejected() {
        let parser = MessageParser::default();
        let result = parser.parse(&RawMessage::new("HDFCBK", "Rs 10 spent", i64::MAX));
        assert!(matches!(result, Err(Rejection::ExtractionFailed { .. })));
    }

    #[test]
    fn adversarial_input_never_panics() {
        let parser = MessageParser::default();
        let bodies = [
            String::new(),
            "Rs.".into(),
            "INR ,".into(),
            "debited ".repeat(10_000),
            "paid to \u{0}\u{ffff} on".into(),
            format!("Rs. {} debited", ",".repeat(5_000)),
        ];
        for body in bodies {
            let _ = parser.parse(&RawMessage::new("HDFCBK", body, 0));
        }
    }

    #[test]
    fn custom_description_bound() {
        let parser = MessageParser::with_description_max_len(5);
        let tx = parser.parse(&msg("HDFCBK", "Rs 10 paid to SUPERMARKET")).unwrap();
        assert_eq!(tx.description, "SUPER");
    }

    #[test]
    fn fingerprint_is_stable_and_content_sensitive() {
        let a = msg("HDFCBK", "Rs 10 spent");
        assert_eq!(fingerprint(&a), fingerprint(&a.clone()));
        assert_eq!(fingerprint(&a).len(), 64);

        let other_time = RawMessage::new("HDFCBK", "Rs 10 spent", T + 1);
        assert_ne!(fingerprint(&a), fingerprint(&other_time));

        // Field boundaries are part of the digest.
        let shifted = msg("HDFCBKRs", " 10 spent");
        assert_ne!(fingerprint(&a), fingerprint(&shifted));
    }
}
