//! Currency formatting rules.
//!
//! A static table keyed by ISO 4217 code decides where the symbol goes, how
//! many decimals are shown and which characters separate thousands and
//! decimals. Amounts are rounded half away from zero before display.

use std::borrow::Cow;

use rust_decimal::{Decimal, RoundingStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolPosition {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub code: Cow<'static, str>,
    pub symbol: Cow<'static, str>,
    pub position: SymbolPosition,
    pub decimals: u32,
    pub thousands_sep: char,
    pub decimal_sep: char,
    /// Space between symbol and amount
    pub spaced: bool,
}

const fn entry(
    code: &'static str,
    symbol: &'static str,
    position: SymbolPosition,
    decimals: u32,
    thousands_sep: char,
    decimal_sep: char,
    spaced: bool,
) -> CurrencyFormat {
    CurrencyFormat {
        code: Cow::Borrowed(code),
        symbol: Cow::Borrowed(symbol),
        position,
        decimals,
        thousands_sep,
        decimal_sep,
        spaced,
    }
}

use SymbolPosition::{After, Before};

pub const SUPPORTED: &[CurrencyFormat] = &[
    entry("EUR", "€", After, 2, ' ', ',', true),
    entry("USD", "$", Before, 2, ',', '.', false),
    entry("GBP", "£", Before, 2, ',', '.', false),
    entry("CHF", "CHF", Before, 2, '\'', '.', true),
    entry("CAD", "$", After, 2, ' ', ',', true),
    entry("JPY", "¥", Before, 0, ',', '.', false),
    entry("MAD", "DH", After, 2, ' ', ',', true),
    entry("TND", "DT", After, 3, ' ', ',', true),
    entry("DZD", "DA", After, 2, ' ', ',', true),
    entry("XOF", "FCFA", After, 0, ' ', ',', true),
    entry("XAF", "FCFA", After, 0, ' ', ',', true),
];

impl CurrencyFormat {
    /// Case-insensitive lookup. Unknown codes get a generic French-style
    /// format with the code itself as symbol.
    pub fn lookup(code: &str) -> CurrencyFormat {
        let code = code.trim().to_ascii_uppercase();
        SUPPORTED
            .iter()
            .find(|c| c.code == code.as_str())
            .cloned()
            .unwrap_or_else(|| {
                tracing::debug!(%code, "unknown currency, using generic format");
                CurrencyFormat {
                    code: Cow::Owned(code.clone()),
                    symbol: Cow::Owned(code),
                    position: After,
                    decimals: 2,
                    thousands_sep: ' ',
                    decimal_sep: ',',
                    spaced: true,
                }
            })
    }

    pub fn is_supported(code: &str) -> bool {
        let code = code.trim().to_ascii_uppercase();
        SUPPORTED.iter().any(|c| c.code == code.as_str())
    }

    /// Round to this currency's precision, half away from zero.
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.decimals, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Render `amount` with the symbol on the configured side.
    pub fn format(&self, amount: Decimal) -> String {
        let number = self.format_number(amount.abs(), self.decimals);
        let negative = amount.is_sign_negative() && !self.round(amount).is_zero();
        let sign = if negative { "-" } else { "" };
        let space = if self.spaced { " " } else { "" };
        match self.position {
            Before => format!("{sign}{}{space}{number}", self.symbol),
            After => format!("{sign}{number}{space}{}", self.symbol),
        }
    }

    /// Number with this currency's separators and exactly `decimals` digits
    /// after the separator.
    pub fn format_number(&self, value: Decimal, decimals: u32) -> String {
        let mut rounded = value
            .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
            .abs();
        rounded.rescale(decimals);
        let digits = rounded.to_string();
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (digits.as_str(), None),
        };

        let mut out = String::new();
        if value.is_sign_negative() && !rounded.is_zero() {
            out.push('-');
        }
        out.push_str(&group_thousands(int_part, self.thousands_sep));
        if let Some(frac) = frac_part {
            out.push(self.decimal_sep);
            out.push_str(frac);
        }
        out
    }

    /// Quantities and other plain numbers: no trailing zeros.
    pub fn format_plain(&self, value: Decimal) -> String {
        let normalized = value.normalize();
        self.format_number(normalized, normalized.scale())
    }

    /// `5.5 -> "5,5 %"` with comma-decimal currencies.
    pub fn format_percent(&self, rate: Decimal) -> String {
        format!("{} %", self.format_plain(rate))
    }
}

fn group_thousands(digits: &str, sep: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

/// Format `amount` in the currency identified by `code`.
pub fn format_currency(amount: Decimal, code: &str) -> String {
    CurrencyFormat::lookup(code).format(amount)
}
