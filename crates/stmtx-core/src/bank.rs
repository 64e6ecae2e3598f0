//! Bank identification from statement text.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Issuing institution of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BankLabel {
    Hsbc,
    Santander,
    Banorte,
    Banamex,
    Scotiabank,
    Inbursa,
    Banregio,
    Afirme,
    Bajio,
    Azteca,
    BanCoppel,
    Bbva,
    Unknown,
}

/// Identification order with the case-folded names each bank is known by.
///
/// BBVA goes last: it appears as a counterparty in other banks' transfer lines.
const BANK_PRIORITY: &[(BankLabel, &[&str])] = &[
    (BankLabel::Hsbc, &["hsbc"]),
    (BankLabel::Santander, &["santander"]),
    (BankLabel::Banorte, &["banorte"]),
    (BankLabel::Banamex, &["citibanamex", "banamex"]),
    (BankLabel::Scotiabank, &["scotiabank"]),
    (BankLabel::Inbursa, &["inbursa"]),
    (BankLabel::Banregio, &["banregio"]),
    (BankLabel::Afirme, &["afirme"]),
    (BankLabel::Bajio, &["banco del bajío", "banco del bajio", "banbajío", "banbajio"]),
    (BankLabel::Azteca, &["banco azteca"]),
    (BankLabel::BanCoppel, &["bancoppel"]),
    (BankLabel::Bbva, &["bbva", "bancomer"]),
];

impl BankLabel {
    /// Every known institution in identification order.
    pub fn known() -> impl Iterator<Item = BankLabel> {
        BANK_PRIORITY.iter().map(|(label, _)| *label)
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            BankLabel::Hsbc => "HSBC",
            BankLabel::Santander => "Santander",
            BankLabel::Banorte => "Banorte",
            BankLabel::Banamex => "Banamex",
            BankLabel::Scotiabank => "Scotiabank",
            BankLabel::Inbursa => "Inbursa",
            BankLabel::Banregio => "Banregio",
            BankLabel::Afirme => "Afirme",
            BankLabel::Bajio => "Banco del Bajío",
            BankLabel::Azteca => "Banco Azteca",
            BankLabel::BanCoppel => "BanCoppel",
            BankLabel::Bbva => "BBVA",
            BankLabel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for BankLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify the issuing bank. Total: unmatched text yields [`BankLabel::Unknown`].
pub fn identify_bank(text: &str) -> BankLabel {
    let folded = text.to_lowercase();
    let label = BANK_PRIORITY
        .iter()
        .find(|(_, names)| names.iter().any(|name| folded.contains(name)))
        .map(|(label, _)| *label)
        .unwrap_or(BankLabel::Unknown);

    debug!("Identified bank: {}", label);
    label
}
