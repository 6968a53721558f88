//! Field extractors: amount, account suffix, merchant description.
//!
//! Patterns are deliberately narrow. A missed amount drops one transaction;
//! a spurious one invents money, so only fixed currency markers count.

use regex::Regex;
use rust_decimal::Decimal;

use crate::config::DEFAULT_DESCRIPTION_MAX_LEN;
use crate::pipeline::types::TransactionKind;

/// Description used for debits with no recognizable merchant.
pub const DEBIT_FALLBACK_DESCRIPTION: &str = "Debit Transaction";

/// Description used for every credit.
pub const CREDIT_DESCRIPTION: &str = "Bank Credit";

const AMOUNT_PATTERN: &str = r"(?i)\b(?:Rs\.?|INR)\s*([\d,]+(?:\.\d{1,2})?)";
const ACCOUNT_PATTERN: &str = r"[Aa]/c\s*[Xx*]*(\d{3,4})";
const MERCHANT_PATTERN: &str =
    r"(?i)\b(?:at|to|info)\b[:\s]*(.*?)(?:\s+(?:on|from|thru|using|ref|avl)\b|\r?\n|$)";

/// Compiled extraction patterns plus the description length bound.
///
/// Every description, fallback literals included, is at most
/// `description_max_len` characters. A bound of 0 is raised to 1.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    amount: Regex,
    account: Regex,
    merchant: Regex,
    description_max_len: usize,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_DESCRIPTION_MAX_LEN)
    }
}

impl FieldExtractor {
    pub fn new(description_max_len: usize) -> Self {
        Self {
            amount: Regex::new(AMOUNT_PATTERN).unwrap(),
            account: Regex::new(ACCOUNT_PATTERN).unwrap(),
            merchant: Regex::new(MERCHANT_PATTERN).unwrap(),
            description_max_len: description_max_len.max(1),
        }
    }

    /// First `Rs.`/`INR` amount in the body, with thousands separators removed.
    ///
    /// Literals that `Decimal` cannot hold without rounding yield `None`.
    pub fn extract_amount(&self, body: &str) -> Option<Decimal> {
        let caps = self.amount.captures(body)?;
        let digits = caps[1].replace(',', "");
        Decimal::from_str_exact(&digits).ok()
    }

    /// Trailing digit group of an `a/c XX1234` style account reference.
    pub fn extract_account_suffix(&self, body: &str) -> Option<String> {
        self.account
            .captures(body)
            .map(|caps| caps[1].to_string())
    }

    /// Merchant name for debits, fixed literals otherwise.
    pub fn extract_description(&self, body: &str, kind: TransactionKind) -> String {
        let text = match kind {
            TransactionKind::Credit => CREDIT_DESCRIPTION,
            TransactionKind::Debit => self.merchant(body).unwrap_or(DEBIT_FALLBACK_DESCRIPTION),
        };
        self.bounded(text)
    }

    fn merchant<'b>(&self, body: &'b str) -> Option<&'b str> {
        let caps = self.merchant.captures(body)?;
        let name = caps.get(1)?.as_str().trim();
        (!name.is_empty()).then_some(name)
    }

    fn bounded(&self, text: &str) -> String {
        let truncated: String = text.chars().take(self.description_max_len).collect();
        truncated.trim_end().to_string()
    }
}
