//! Visual templates as data.
//!
//! A template is nothing more than a set of style tokens. The HTML and the
//! Typst renderers read the same tokens, so adding a look means adding one
//! entry here.

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TemplateId {
    #[default]
    Classic,
    Modern,
    Minimal,
    Creative,
    Corporate,
    Artisan,
    Elegant,
    Professional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderLayout {
    /// Full-width colored band with the title
    Banner,
    /// Company left, quote meta right
    Split,
    /// Everything stacked and centered
    Centered,
    /// Colored column down the left edge
    Sidebar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStyle {
    Striped,
    Bordered,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleTokens {
    pub primary: &'static str,
    pub accent: &'static str,
    pub text: &'static str,
    pub muted: &'static str,
    /// Light fill for table headers, stripes and the totals box
    pub surface: &'static str,
    /// CSS font-family stack
    pub fonts_html: &'static str,
    /// Typst font fallback list
    pub fonts_typst: &'static [&'static str],
    pub header: HeaderLayout,
    pub table: TableStyle,
    /// Corner radius in points
    pub radius: u8,
    pub uppercase_headings: bool,
}

const SANS_HTML: &str = "'Helvetica Neue', Helvetica, Arial, sans-serif";
const SERIF_HTML: &str = "Georgia, 'Times New Roman', serif";
const SANS_TYPST: &[&str] = &["Helvetica", "Arial", "DejaVu Sans", "Libertinus Serif"];
const SERIF_TYPST: &[&str] = &["Georgia", "Libertinus Serif", "New Computer Modern"];

impl TemplateId {
    pub const ALL: [TemplateId; 8] = [
        TemplateId::Classic,
        TemplateId::Modern,
        TemplateId::Minimal,
        TemplateId::Creative,
        TemplateId::Corporate,
        TemplateId::Artisan,
        TemplateId::Elegant,
        TemplateId::Professional,
    ];

    /// Lowercase id used in file names and records.
    pub fn id(&self) -> &'static str {
        match self {
            TemplateId::Classic => "classic",
            TemplateId::Modern => "modern",
            TemplateId::Minimal => "minimal",
            TemplateId::Creative => "creative",
            TemplateId::Corporate => "corporate",
            TemplateId::Artisan => "artisan",
            TemplateId::Elegant => "elegant",
            TemplateId::Professional => "professional",
        }
    }

    /// Case-insensitive. Unknown ids render with the classic look.
    pub fn parse_lenient(raw: &str) -> TemplateId {
        let raw = raw.trim();
        TemplateId::ALL
            .into_iter()
            .find(|t| t.id().eq_ignore_ascii_case(raw))
            .unwrap_or_else(|| {
                warn!(template = raw, "unknown template, falling back to classic");
                TemplateId::Classic
            })
    }

    pub fn label(&self) -> &'static str {
        match self {
            TemplateId::Classic => "Classique",
            TemplateId::Modern => "Moderne",
            TemplateId::Minimal => "Minimaliste",
            TemplateId::Creative => "Créatif",
            TemplateId::Corporate => "Entreprise",
            TemplateId::Artisan => "Artisan",
            TemplateId::Elegant => "Élégant",
            TemplateId::Professional => "Professionnel",
        }
    }

    pub fn tokens(&self) -> StyleTokens {
        match self {
            TemplateId::Classic => StyleTokens {
                primary: "#1f2937",
                accent: "#2563eb",
                text: "#111827",
                muted: "#6b7280",
                surface: "#f3f4f6",
                fonts_html: SANS_HTML,
                fonts_typst: SANS_TYPST,
                header: HeaderLayout::Split,
                table: TableStyle::Bordered,
                radius: 0,
                uppercase_headings: false,
            },
            TemplateId::Modern => StyleTokens {
                primary: "#4f46e5",
                accent: "#06b6d4",
                text: "#1e293b",
                muted: "#64748b",
                surface: "#eef2ff",
                fonts_html: SANS_HTML,
                fonts_typst: SANS_TYPST,
                header: HeaderLayout::Banner,
                table: TableStyle::Striped,
                radius: 8,
                uppercase_headings: false,
            },
            TemplateId::Minimal => StyleTokens {
                primary: "#000000",
                accent: "#525252",
                text: "#171717",
                muted: "#a3a3a3",
                surface: "#fafafa",
                fonts_html: SANS_HTML,
                fonts_typst: SANS_TYPST,
                header: HeaderLayout::Split,
                table: TableStyle::Plain,
                radius: 0,
                uppercase_headings: true,
            },
            TemplateId::Creative => StyleTokens {
                primary: "#db2777",
                accent: "#f59e0b",
                text: "#1f2937",
                muted: "#9ca3af",
                surface: "#fdf2f8",
                fonts_html: SANS_HTML,
                fonts_typst: SANS_TYPST,
                header: HeaderLayout::Sidebar,
                table: TableStyle::Striped,
                radius: 12,
                uppercase_headings: false,
            },
            TemplateId::Corporate => StyleTokens {
                primary: "#0f3460",
                accent: "#16a085",
                text: "#1c2833",
                muted: "#7f8c8d",
                surface: "#eaf0f6",
                fonts_html: SANS_HTML,
                fonts_typst: SANS_TYPST,
                header: HeaderLayout::Banner,
                table: TableStyle::Bordered,
                radius: 2,
                uppercase_headings: true,
            },
            TemplateId::Artisan => StyleTokens {
                primary: "#78350f",
                accent: "#b45309",
                text: "#292524",
                muted: "#a8a29e",
                surface: "#fef3c7",
                fonts_html: SERIF_HTML,
                fonts_typst: SERIF_TYPST,
                header: HeaderLayout::Centered,
                table: TableStyle::Bordered,
                radius: 4,
                uppercase_headings: false,
            },
            TemplateId::Elegant => StyleTokens {
                primary: "#3f3f46",
                accent: "#a16207",
                text: "#27272a",
                muted: "#a1a1aa",
                surface: "#fafaf9",
                fonts_html: SERIF_HTML,
                fonts_typst: SERIF_TYPST,
                header: HeaderLayout::Centered,
                table: TableStyle::Plain,
                radius: 0,
                uppercase_headings: true,
            },
            TemplateId::Professional => StyleTokens {
                primary: "#1e40af",
                accent: "#0369a1",
                text: "#0f172a",
                muted: "#64748b",
                surface: "#f1f5f9",
                fonts_html: SANS_HTML,
                fonts_typst: SANS_TYPST,
                header: HeaderLayout::Sidebar,
                table: TableStyle::Bordered,
                radius: 4,
                uppercase_headings: false,
            },
        }
    }
}

impl<'de> Deserialize<'de> for TemplateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(TemplateId::parse_lenient(&raw))
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
