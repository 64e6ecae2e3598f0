//! Bank-specific parser profiles.

use super::generic::TemplateParser;
use super::hsbc::HsbcParser;
use super::rules::template::{banorte_templates, bbva_templates, santander_templates};
use super::rules::{LineTemplate, SignPolicy, generic_templates};
use super::TransactionParser;
use crate::bank::BankLabel;

/// Layout knowledge for one bank.
pub struct BankProfile {
    /// Bank the profile applies to.
    pub bank: BankLabel,
    /// Bank layout templates, tried before the generic ones.
    pub templates: fn() -> Vec<LineTemplate>,
    /// Extra credit keywords (lowercase).
    pub credit_keywords: &'static [&'static str],
    /// Whether statements from this bank need OCR digit correction.
    pub fix_ocr: bool,
}

/// Profiles for banks with template-based parsers. HSBC has its own parser.
pub const BANK_PROFILES: &[BankProfile] = &[
    BankProfile {
        bank: BankLabel::Santander,
        templates: santander_templates,
        credit_keywords: &["pago recibido", "transf. recibida", "abono transferencia"],
        fix_ocr: false,
    },
    BankProfile {
        bank: BankLabel::Bbva,
        templates: bbva_templates,
        credit_keywords: &["spei recibido", "pago cuenta de tercero", "dep.efectivo"],
        fix_ocr: false,
    },
    BankProfile {
        bank: BankLabel::Banorte,
        templates: banorte_templates,
        credit_keywords: &["dep. efectivo", "traspaso de cuenta", "spei recibido"],
        fix_ocr: true,
    },
];

impl BankProfile {
    /// Build the template parser for this profile.
    pub fn parser(&self) -> TemplateParser {
        let mut templates = (self.templates)();
        templates.extend(generic_templates());

        TemplateParser::new(format!("bank:{}", self.bank), templates)
            .with_sign_policy(SignPolicy::new().with_credit_keywords(self.credit_keywords))
            .with_ocr_fix(self.fix_ocr)
    }
}

/// The bank-specific parser for a bank, if one exists.
pub fn parser_for(bank: BankLabel) -> Option<Box<dyn TransactionParser>> {
    if bank == BankLabel::Hsbc {
        return Some(Box::new(HsbcParser::new()));
    }

    BANK_PROFILES
        .iter()
        .find(|profile| profile.bank == bank)
        .map(|profile| Box::new(profile.parser()) as Box<dyn TransactionParser>)
}
