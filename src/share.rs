//! Share payloads: a `mailto:` link or a WhatsApp deep link.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{DevisError, Result};
use crate::view::QuoteView;

// ASCII only: wa.me takes 0-9.
static NON_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9]").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ShareVia {
    Email,
    Whatsapp,
}

pub fn email_subject(view: &QuoteView) -> String {
    format!("Devis {} - {}", view.number, view.company.name)
}

pub fn email_body(view: &QuoteView) -> String {
    format!(
        "Bonjour {},\n\n\
         Veuillez trouver ci-joint notre devis n° {} d'un montant de {} TTC, \
         valable jusqu'au {}.\n\n\
         Nous restons à votre disposition pour toute question.\n\n\
         Cordialement,\n{}",
        view.client.name, view.number, view.total_ttc, view.valid_until, view.company.name
    )
}

pub fn email_link(view: &QuoteView) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        view.client.email.trim(),
        urlencoding::encode(&email_subject(view)),
        urlencoding::encode(&email_body(view))
    )
}

/// International digits for wa.me. French national numbers
/// (`06 12 34 56 78`) get the 33 country code.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits = NON_DIGIT.replace_all(raw, "").to_string();
    let digits = if let Some(rest) = digits.strip_prefix("00") {
        rest.to_string()
    } else if digits.len() == 10 && digits.starts_with('0') {
        format!("33{}", &digits[1..])
    } else {
        digits
    };
    (!digits.is_empty()).then_some(digits)
}

pub fn whatsapp_link(view: &QuoteView) -> Result<String> {
    let phone = normalize_phone(&view.client.phone)
        .ok_or_else(|| DevisError::Share(format!("client of {} has no phone number", view.number)))?;
    let text = format!(
        "Bonjour {}, voici notre devis n° {} : {} TTC, valable jusqu'au {}. {}",
        view.client.name, view.number, view.total_ttc, view.valid_until, view.company.name
    );
    Ok(format!("https://wa.me/{}?text={}", phone, urlencoding::encode(&text)))
}
