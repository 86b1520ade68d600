//! Quote arithmetic, computed once per quote and handed to every renderer.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use crate::currency::CurrencyFormat;
use crate::model::{LineItem, Quote};

/// VAT collected at one rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VatLine {
    pub rate: Decimal,
    pub base: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteTotals {
    pub subtotal_ht: Decimal,
    pub total_vat: Decimal,
    pub total_ttc: Decimal,
    /// Ascending by rate
    pub vat_breakdown: Vec<VatLine>,
}

impl QuoteTotals {
    /// Sums are taken exactly and rounded once to the currency precision.
    /// `total_ttc` is the sum of the two rounded figures, so the printed
    /// totals always add up.
    pub fn compute(items: &[LineItem], currency: &CurrencyFormat) -> QuoteTotals {
        let mut subtotal = Decimal::ZERO;
        let mut vat = Decimal::ZERO;
        let mut by_rate: BTreeMap<Decimal, (Decimal, Decimal)> = BTreeMap::new();

        for item in items {
            let base = item.total_ht();
            let amount = item.vat_amount();
            subtotal += base;
            vat += amount;
            let entry = by_rate
                .entry(item.vat_rate.normalize())
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            entry.0 += base;
            entry.1 += amount;
        }

        let subtotal_ht = currency.round(subtotal);
        let total_vat = currency.round(vat);

        QuoteTotals {
            subtotal_ht,
            total_vat,
            total_ttc: subtotal_ht + total_vat,
            vat_breakdown: by_rate
                .into_iter()
                .map(|(rate, (base, amount))| VatLine {
                    rate,
                    base: currency.round(base),
                    amount: currency.round(amount),
                })
                .collect(),
        }
    }

    /// Totals in the quote's own currency. Stored totals are not consulted;
    /// see [`QuoteTotals::check_stored`].
    pub fn for_quote(quote: &Quote) -> QuoteTotals {
        Self::compute(&quote.items, &CurrencyFormat::lookup(&quote.currency))
    }

    /// Warn about every stored total that disagrees with the computed one.
    /// Returns the number of mismatches.
    pub fn check_stored(&self, quote: &Quote) -> usize {
        let pairs = [
            ("subtotal_ht", quote.subtotal_ht, self.subtotal_ht),
            ("total_vat", quote.total_vat, self.total_vat),
            ("total_ttc", quote.total_ttc, self.total_ttc),
        ];
        let mut mismatches = 0;
        for (field, stored, computed) in pairs {
            if let Some(stored) = stored {
                if stored != computed {
                    warn!(
                        quote = %quote.number,
                        field,
                        %stored,
                        %computed,
                        "stored total disagrees with line items, using computed value"
                    );
                    mismatches += 1;
                }
            }
        }
        mismatches
    }
}
