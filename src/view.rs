//! Display-ready projection of a quote.
//!
//! Every figure is formatted here, once. Renderers only place strings.

use serde::Serialize;

use crate::assets::{CompanyImages, EmbeddedImage};
use crate::currency::CurrencyFormat;
use crate::model::{Client, Company, Quote};
use crate::template::{StyleTokens, TemplateId};
use crate::totals::QuoteTotals;

const DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub data_uri: String,
    /// File name used when the image sits next to Typst markup
    pub file_name: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl ImageView {
    fn new(stem: &str, image: &EmbeddedImage) -> Self {
        ImageView {
            data_uri: image.data_uri(),
            file_name: format!("{}.{}", stem, image.extension),
            bytes: image.bytes.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyView {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub siret: Option<String>,
    pub vat_number: Option<String>,
    pub logo: Option<ImageView>,
    pub signature: Option<ImageView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineView {
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
    pub vat_rate: String,
    pub total_ht: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VatLineView {
    pub rate: String,
    pub base: String,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuoteView {
    pub template: TemplateId,
    pub template_label: &'static str,
    pub style: StyleTokens,
    pub number: String,
    pub created_at: String,
    pub valid_until: String,
    pub currency: String,
    pub notes: Option<String>,
    pub client: Client,
    pub company: CompanyView,
    pub items: Vec<LineView>,
    pub vat_breakdown: Vec<VatLineView>,
    pub subtotal_ht: String,
    pub total_vat: String,
    pub total_ttc: String,
}

impl QuoteView {
    pub fn build(quote: &Quote, company: &Company, images: &CompanyImages) -> QuoteView {
        Self::build_with_template(quote, company, images, quote.template)
    }

    /// Same quote, different look.
    pub fn build_with_template(
        quote: &Quote,
        company: &Company,
        images: &CompanyImages,
        template: TemplateId,
    ) -> QuoteView {
        let currency = CurrencyFormat::lookup(&quote.currency);
        let totals = QuoteTotals::for_quote(quote);

        let items = quote
            .items
            .iter()
            .map(|item| LineView {
                description: item.description.clone(),
                quantity: currency.format_plain(item.quantity),
                unit_price: currency.format(item.unit_price),
                vat_rate: currency.format_percent(item.vat_rate),
                total_ht: currency.format(item.total_ht()),
            })
            .collect();

        let vat_breakdown = totals
            .vat_breakdown
            .iter()
            .map(|line| VatLineView {
                rate: currency.format_percent(line.rate),
                base: currency.format(line.base),
                amount: currency.format(line.amount),
            })
            .collect();

        QuoteView {
            template,
            template_label: template.label(),
            style: template.tokens(),
            number: quote.number.clone(),
            created_at: quote.created_at.format(DATE_FORMAT).to_string(),
            valid_until: quote.valid_until.format(DATE_FORMAT).to_string(),
            currency: currency.code.to_string(),
            notes: quote.notes.clone().filter(|n| !n.trim().is_empty()),
            client: quote.client.clone(),
            company: CompanyView {
                name: company.name.clone(),
                address: company.address.clone(),
                phone: company.phone.clone(),
                email: company.email.clone(),
                siret: company.siret.clone(),
                vat_number: company.vat_number.clone(),
                logo: images.logo.as_ref().map(|i| ImageView::new("logo", i)),
                signature: images.signature.as_ref().map(|i| ImageView::new("signature", i)),
            },
            items,
            vat_breakdown,
            subtotal_ht: currency.format(totals.subtotal_ht),
            total_vat: currency.format(totals.total_vat),
            total_ttc: currency.format(totals.total_ttc),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::model::LineItem;

    pub(crate) fn sample_quote() -> Quote {
        Quote {
            number: "DV20240315-01".into(),
            created_at: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            valid_until: NaiveDate::from_ymd_opt(2024, 4, 14).unwrap(),
            currency: "EUR".into(),
            notes: Some("Acompte de 30 % à la commande.".into()),
            template: TemplateId::Modern,
            subtotal_ht: None,
            total_vat: None,
            total_ttc: None,
            client: Client {
                name: "Marie Dupont".into(),
                company: "Dupont & Fils".into(),
                email: "marie@dupont.fr".into(),
                phone: "06 12 34 56 78".into(),
                address: "12 rue des Lilas, 75011 Paris".into(),
            },
            items: vec![
                LineItem {
                    id: "1".into(),
                    description: "Pose de carrelage".into(),
                    quantity: dec!(2),
                    unit_price: dec!(100),
                    vat_rate: dec!(20),
                },
                LineItem {
                    id: "2".into(),
                    description: "Fournitures".into(),
                    quantity: dec!(1),
                    unit_price: dec!(50),
                    vat_rate: dec!(10),
                },
            ],
        }
    }

    pub(crate) fn sample_company() -> Company {
        Company {
            name: "Atelier Martin".into(),
            address: "3 place du Marché, 69002 Lyon".into(),
            phone: "04 78 00 00 00".into(),
            email: "contact@atelier-martin.fr".into(),
            logo: None,
            signature: None,
            siret: Some("123 456 789 00012".into()),
            vat_number: None,
        }
    }

    #[test]
    fn test_view_formats_everything_once() {
        let view = QuoteView::build(&sample_quote(), &sample_company(), &CompanyImages::default());
        assert_eq!(view.subtotal_ht, "250,00 €");
        assert_eq!(view.total_vat, "45,00 €");
        assert_eq!(view.total_ttc, "295,00 €");
        assert_eq!(view.created_at, "15/03/2024");
        assert_eq!(view.valid_until, "14/04/2024");
        assert_eq!(view.items[0].quantity, "2");
        assert_eq!(view.items[0].unit_price, "100,00 €");
        assert_eq!(view.items[0].vat_rate, "20 %");
        assert_eq!(view.items[0].total_ht, "200,00 €");
        assert_eq!(view.vat_breakdown.len(), 2);
        assert_eq!(view.vat_breakdown[0].rate, "10 %");
        assert_eq!(view.template, TemplateId::Modern);
    }

    #[test]
    fn test_template_override_keeps_figures() {
        let quote = sample_quote();
        let a = QuoteView::build(&quote, &sample_company(), &CompanyImages::default());
        let b = QuoteView::build_with_template(
            &quote,
            &sample_company(),
            &CompanyImages::default(),
            TemplateId::Artisan,
        );
        assert_eq!(b.template, TemplateId::Artisan);
        assert_eq!(b.style, TemplateId::Artisan.tokens());
        assert_eq!(a.total_ttc, b.total_ttc);
    }

    #[test]
    fn test_blank_notes_are_dropped() {
        let mut quote = sample_quote();
        quote.notes = Some("   ".into());
        let view = QuoteView::build(&quote, &sample_company(), &CompanyImages::default());
        assert!(view.notes.is_none());
    }

    #[test]
    fn test_images_get_stable_file_names() {
        let images = CompanyImages {
            logo: Some(EmbeddedImage {
                mime: "image/png",
                extension: "png",
                bytes: vec![1, 2, 3],
            }),
            signature: None,
        };
        let view = QuoteView::build(&sample_quote(), &sample_company(), &images);
        let logo = view.company.logo.unwrap();
        assert_eq!(logo.file_name, "logo.png");
        assert!(logo.data_uri.starts_with("data:image/png;base64,"));
        assert!(view.company.signature.is_none());
    }
}
