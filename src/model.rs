use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::template::TemplateId;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Client {
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Company {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub logo: Option<String>,      // path, URL or data: URI
    pub signature: Option<String>, // same
    pub siret: Option<String>,
    pub vat_number: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LineItem {
    pub id: String,
    pub description: String,
    pub quantity: Decimal,
    #[serde(alias = "unitPrice")]
    pub unit_price: Decimal,
    /// Percentage, e.g. 20 for 20 %
    #[serde(alias = "vatRate")]
    pub vat_rate: Decimal,
}

impl LineItem {
    pub fn total_ht(&self) -> Decimal {
        self.quantity * self.unit_price
    }

    pub fn vat_amount(&self) -> Decimal {
        self.total_ht() * self.vat_rate / Decimal::ONE_HUNDRED
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Quote {
    pub number: String,
    #[serde(alias = "createdAt")]
    pub created_at: NaiveDate,
    #[serde(alias = "validUntil", alias = "expiryDate")]
    pub valid_until: NaiveDate,
    pub currency: String,
    pub notes: Option<String>,
    #[serde(default)]
    pub template: TemplateId,
    // Denormalized by whoever wrote the record; never trusted for display.
    #[serde(alias = "subtotalHT")]
    pub subtotal_ht: Option<Decimal>,
    #[serde(alias = "totalVAT")]
    pub total_vat: Option<Decimal>,
    #[serde(alias = "totalTTC")]
    pub total_ttc: Option<Decimal>,
    pub client: Client,
    #[serde(default)]
    pub items: Vec<LineItem>,
}
