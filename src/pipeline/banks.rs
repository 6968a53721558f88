//! Bank identity resolution from SMS sender headers.
//!
//! Indian banks send notifications from short alphanumeric headers such as
//! `VM-HDFCBK` or `AD-SBIINB`. A sender is recognized when one of the known
//! header tokens appears anywhere in it. Tokens are tried in declaration
//! order and the first hit wins, even if a later token would match more
//! specifically.

use std::collections::HashMap;

/// Display name used when no header token matches.
pub const UNKNOWN_BANK: &str = "Unknown Bank";

/// Known sender header tokens, in resolution order.
pub const DEFAULT_HEADERS: &[&str] = &[
    "HDFCBK", "SBIINB", "ICICIB", "AXISBK", "KOTAKB", "INDUSB", "BOITXT", "PNBSMS", "CANARA",
    "UNIONB", "YESBNK", "BOIIND",
];

const DEFAULT_DISPLAY_NAMES: &[(&str, &str)] = &[
    ("HDFCBK", "HDFC Bank"),
    ("SBIINB", "SBI"),
    ("ICICIB", "ICICI Bank"),
    ("AXISBK", "Axis Bank"),
    ("KOTAKB", "Kotak Bank"),
    ("INDUSB", "IndusInd Bank"),
    ("CANARA", "Canara Bank"),
    ("UNIONB", "Union Bank"),
    ("YESBNK", "Yes Bank"),
];

/// Suffixes stripped from tokens that have no display name.
const HEADER_SUFFIXES: &[&str] = &["BK", "BNK", "SMS"];

/// Result of resolving a sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankIdentity {
    Known { header: String, name: String },
    Unknown,
}

impl BankIdentity {
    /// Human-readable bank name, or the "Unknown Bank" sentinel.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Known { name, .. } => name,
            Self::Unknown => UNKNOWN_BANK,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known { .. })
    }
}

/// Ordered set of bank header tokens with their display names.
#[derive(Debug, Clone)]
pub struct BankDirectory {
    headers: Vec<String>,
    display_names: HashMap<String, String>,
}

impl Default for BankDirectory {
    fn default() -> Self {
        Self::new(
            DEFAULT_HEADERS.iter().copied(),
            DEFAULT_DISPLAY_NAMES.iter().copied(),
        )
    }
}

impl BankDirectory {
    /// Build a directory from header tokens (in resolution order) and a
    /// token → display name table. Tokens are upper-cased.
    pub fn new<'a>(
        headers: impl IntoIterator<Item = &'a str>,
        display_names: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        Self {
            headers: headers.into_iter().map(str::to_uppercase).collect(),
            display_names: display_names
                .into_iter()
                .map(|(token, name)| (token.to_uppercase(), name.to_string()))
                .collect(),
        }
    }

    /// Resolve a sender to the first matching header token.
    pub fn resolve(&self, sender: &str) -> BankIdentity {
        let normalized = sender.to_uppercase();
        self.headers
            .iter()
            .find(|header| normalized.contains(header.as_str()))
            .map(|header| BankIdentity::Known {
                header: header.clone(),
                name: self.display_name_for(header),
            })
            .unwrap_or(BankIdentity::Unknown)
    }

    /// Whether the sender matches any known header token.
    pub fn is_bank_sender(&self, sender: &str) -> bool {
        let normalized = sender.to_uppercase();
        self.headers
            .iter()
            .any(|header| normalized.contains(header.as_str()))
    }

    fn display_name_for(&self, header: &str) -> String {
        if let Some(name) = self.display_names.get(header) {
            return name.clone();
        }
        // Each suffix is removed once, at its first occurrence.
        HEADER_SUFFIXES
            .iter()
            .fold(header.to_string(), |name, suffix| name.replacen(suffix, "", 1))
    }
}
