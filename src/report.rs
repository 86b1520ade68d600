use comfy_table::{Attribute, Cell, CellAlignment, Color, Table};

use crate::currency::{CurrencyFormat, SUPPORTED, SymbolPosition, format_currency};
use crate::model::Quote;
use crate::template::{HeaderLayout, TableStyle, TemplateId};
use crate::totals::QuoteTotals;
use crate::view::QuoteView;

const EXPIRED: Color = Color::Rgb { r: 185, g: 28, b: 28 };
const TOTAL: Color = Color::Rgb { r: 4, g: 120, b: 87 };

fn money(text: impl Into<String>) -> Cell {
    Cell::new(text.into()).set_alignment(CellAlignment::Right)
}

/// One row per quote. Quotes past their validity date at `today` are
/// flagged in red.
pub fn quotes_table(quotes: &[Quote], today: chrono::NaiveDate) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Number"),
        Cell::new("Date"),
        Cell::new("Valid Until"),
        Cell::new("Client"),
        Cell::new("Template"),
        Cell::new("Total HT"),
        Cell::new("Total TTC"),
    ]);

    for quote in quotes {
        let currency = CurrencyFormat::lookup(&quote.currency);
        let totals = QuoteTotals::compute(&quote.items, &currency);
        let client = if quote.client.company.is_empty() {
            quote.client.name.clone()
        } else {
            quote.client.company.clone()
        };
        let valid_cell = Cell::new(quote.valid_until.format("%d/%m/%Y").to_string());
        let valid_cell = if quote.valid_until < today { valid_cell.fg(EXPIRED) } else { valid_cell };

        table.add_row(vec![
            Cell::new(&quote.number),
            Cell::new(quote.created_at.format("%d/%m/%Y").to_string()),
            valid_cell,
            Cell::new(client),
            Cell::new(quote.template.id()),
            money(currency.format(totals.subtotal_ht)),
            money(currency.format(totals.total_ttc)).add_attribute(Attribute::Bold),
        ]);
    }
    table
}

/// Line items followed by the totals block.
pub fn quote_table(view: &QuoteView) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Description"),
        Cell::new("Qty"),
        Cell::new("Unit Price HT"),
        Cell::new("VAT"),
        Cell::new("Total HT"),
    ]);

    for item in &view.items {
        table.add_row(vec![
            Cell::new(&item.description),
            money(&item.quantity),
            money(&item.unit_price),
            money(&item.vat_rate),
            money(&item.total_ht),
        ]);
    }

    table.add_row(vec![Cell::new("Total HT"), Cell::new(""), Cell::new(""), Cell::new(""), money(&view.subtotal_ht)]);
    for line in &view.vat_breakdown {
        table.add_row(vec![
            Cell::new(format!("VAT {} on {}", line.rate, line.base)),
            Cell::new(""),
            Cell::new(""),
            Cell::new(""),
            money(&line.amount),
        ]);
    }
    table.add_row(vec![Cell::new("Total VAT"), Cell::new(""), Cell::new(""), Cell::new(""), money(&view.total_vat)]);
    table.add_row(vec![
        Cell::new("Total TTC").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        money(&view.total_ttc).add_attribute(Attribute::Bold).fg(TOTAL),
    ]);
    table
}

pub fn templates_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Id"),
        Cell::new("Name"),
        Cell::new("Header"),
        Cell::new("Table"),
        Cell::new("Primary"),
    ]);
    for template in TemplateId::ALL {
        let tokens = template.tokens();
        let header = match tokens.header {
            HeaderLayout::Banner => "banner",
            HeaderLayout::Split => "split",
            HeaderLayout::Centered => "centered",
            HeaderLayout::Sidebar => "sidebar",
        };
        let style = match tokens.table {
            TableStyle::Striped => "striped",
            TableStyle::Bordered => "bordered",
            TableStyle::Plain => "plain",
        };
        table.add_row(vec![
            Cell::new(template.id()),
            Cell::new(template.label()),
            Cell::new(header),
            Cell::new(style),
            Cell::new(tokens.primary),
        ]);
    }
    table
}

pub fn currencies_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Code"),
        Cell::new("Symbol"),
        Cell::new("Position"),
        Cell::new("Decimals"),
        Cell::new("Example"),
    ]);
    for currency in SUPPORTED {
        let position = match currency.position {
            SymbolPosition::Before => "before",
            SymbolPosition::After => "after",
        };
        table.add_row(vec![
            Cell::new(&*currency.code),
            Cell::new(&*currency.symbol),
            Cell::new(position),
            Cell::new(currency.decimals),
            money(format_currency(rust_decimal::Decimal::new(123456789, 2), &currency.code)),
        ]);
    }
    table
}
