//! Interactive prompts for clients and quotes.

use std::str::FromStr;

use chrono::{Duration, Local};
use inquire::{DateSelect, Select, Text};
use rust_decimal::Decimal;

use crate::config::AppSettings;
use crate::currency::{CurrencyFormat, SUPPORTED};
use crate::error::Result;
use crate::model::{Client, LineItem, Quote};
use crate::store::FileStore;
use crate::template::TemplateId;

const NEW_CLIENT_OPT: &str = "➕ Add New Client";

/// Accepts `1234.5`, `1 234,5` and `1234,50`.
pub fn parse_decimal(input: &str) -> Option<Decimal> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

fn prompt_decimal(message: &str, default: Option<&str>) -> Result<Decimal> {
    loop {
        let mut prompt = Text::new(message);
        if let Some(d) = default {
            prompt = prompt.with_default(d);
        }
        let answer = prompt.prompt()?;
        match parse_decimal(&answer) {
            Some(value) => return Ok(value),
            None => println!("❌ '{}' is not a number, try again.", answer),
        }
    }
}

fn optional_text(message: &str) -> Result<String> {
    Ok(Text::new(message).prompt()?.trim().to_string())
}

pub fn create_client_wizard(store: &FileStore) -> Result<(String, Client)> {
    println!("\n--- Creating New Client ---");

    let company = optional_text("Company Name (Optional, press Enter to skip):")?;
    let name_prompt = if company.is_empty() { "Client Name:" } else { "Contact Person:" };
    let name = Text::new(name_prompt).prompt()?.trim().to_string();

    let client = Client {
        name,
        company,
        email: optional_text("Client Email (Optional):")?,
        phone: optional_text("Client Phone (Optional):")?,
        address: optional_text("Client Address (Optional):")?,
    };

    let id = store.save_client(&client)?;
    println!("✅ Client created successfully: {}", id);
    Ok((id, client))
}

pub fn select_or_create_client(store: &FileStore) -> Result<Client> {
    let clients = store.clients()?;
    let mut options = vec![NEW_CLIENT_OPT.to_string()];
    options.extend(clients.iter().map(|(id, _)| id.clone()));

    let choice = Select::new("Please Select Client (Type to Filter):", options).prompt()?;
    if choice == NEW_CLIENT_OPT {
        return Ok(create_client_wizard(store)?.1);
    }
    match clients.into_iter().find(|(id, _)| *id == choice) {
        Some((_, client)) => Ok(client),
        None => Ok(store.load_client(&choice)?),
    }
}

pub fn enter_line_items(currency: &CurrencyFormat) -> Result<Vec<LineItem>> {
    let mut items = Vec::new();
    println!("\n--- Enter Quote Items ---");
    println!("(Leave Description empty to finish)");

    loop {
        let description = Text::new("Description (leave empty to finish):").prompt()?;
        if description.trim().is_empty() {
            break;
        }
        let quantity = prompt_decimal("Quantity:", Some("1"))?;
        let unit_price = prompt_decimal(&format!("Unit Price HT ({}):", currency.symbol), None)?;
        let vat_rate = prompt_decimal("VAT Rate %:", Some("20"))?;

        let item = LineItem {
            id: (items.len() + 1).to_string(),
            description: description.replace("\\n", "\n"),
            quantity,
            unit_price,
            vat_rate,
        };
        println!("   → {}", currency.format(item.total_ht()));
        items.push(item);
    }
    Ok(items)
}

/// Walk through a new quote. Returns `None` when no item was entered.
pub fn new_quote_wizard(store: &FileStore, settings: &AppSettings) -> Result<Option<Quote>> {
    let client = select_or_create_client(store)?;
    println!("✅ Selected Client: {}", client.name);

    let codes: Vec<&str> = SUPPORTED.iter().map(|c| &*c.code).collect();
    let start = codes
        .iter()
        .position(|c| c.eq_ignore_ascii_case(&settings.default_currency))
        .unwrap_or(0);
    let currency_code = Select::new("Currency:", codes).with_starting_cursor(start).prompt()?;
    let currency = CurrencyFormat::lookup(currency_code);

    let templates = TemplateId::ALL.to_vec();
    let start = templates
        .iter()
        .position(|t| *t == settings.default_template)
        .unwrap_or(0);
    let template = Select::new("Template:", templates).with_starting_cursor(start).prompt()?;

    let items = enter_line_items(&currency)?;
    if items.is_empty() {
        return Ok(None);
    }

    let created_at = DateSelect::new("Quote Date:")
        .with_default(Local::now().date_naive())
        .prompt()?;
    let valid_until = DateSelect::new("Valid Until:")
        .with_default(created_at + Duration::days(i64::from(settings.validity_days)))
        .with_min_date(created_at)
        .prompt()?;
    let notes = optional_text("Notes / Conditions (Optional, '\\n' for new lines):")?;

    Ok(Some(Quote {
        number: store.next_number(created_at)?,
        created_at,
        valid_until,
        currency: currency.code.to_string(),
        notes: Some(notes.replace("\\n", "\n")).filter(|n| !n.is_empty()),
        template,
        subtotal_ht: None,
        total_vat: None,
        total_ttc: None,
        client,
        items,
    }))
}
