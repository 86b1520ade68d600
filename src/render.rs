//! HTML and Typst rendering of a [`QuoteView`].
//!
//! Both outputs come from tera templates that read the same view and the
//! same style tokens. Defaults are embedded at compile time; `Renderer::load`
//! copies them into the data root on first use so they can be customized.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tera::{Context, Tera, Value};
use tracing::debug;

use crate::error::{DevisError, Result};
use crate::view::QuoteView;

// Embed templates at compile time to ensure availability
pub const HTML_TEMPLATE: &str = include_str!("../templates/quote.html.tera");
pub const TYPST_TEMPLATE: &str = include_str!("../templates/quote.typ.tera");

const HTML_NAME: &str = "quote.html.tera";
const TYPST_NAME: &str = "quote.typ.tera";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlMode {
    /// On-screen preview with a print button
    Screen,
    /// Opens the browser print dialog once loaded
    Print,
}

pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Renderer over the embedded templates only.
    pub fn builtin() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![(HTML_NAME, HTML_TEMPLATE), (TYPST_NAME, TYPST_TEMPLATE)])?;
        Ok(Self::configure(tera))
    }

    /// Renderer over `<root>/templates`, initialized with the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let template_dir = root.join("templates");
        fs::create_dir_all(&template_dir)?;
        for (name, content) in [(HTML_NAME, HTML_TEMPLATE), (TYPST_NAME, TYPST_TEMPLATE)] {
            let path = template_dir.join(name);
            if !path.exists() {
                println!("✨ Initializing default template {}...", name);
                fs::write(&path, content)?;
            }
        }

        let glob = template_dir.join("*.tera");
        let glob = glob
            .to_str()
            .ok_or_else(|| DevisError::Config(format!("non UTF-8 path: {}", template_dir.display())))?;
        debug!(%glob, "loading templates");
        Ok(Self::configure(Tera::new(glob)?))
    }

    fn configure(mut tera: Tera) -> Self {
        tera.autoescape_on(vec![".html.tera", ".html"]);
        tera.register_filter("typst_str", typst_str);
        Renderer { tera }
    }

    pub fn render_html(&self, view: &QuoteView, mode: HtmlMode) -> Result<String> {
        let mut context = Context::from_serialize(view)?;
        context.insert("print_mode", &(mode == HtmlMode::Print));
        Ok(self.tera.render(HTML_NAME, &context)?)
    }

    pub fn render_typst(&self, view: &QuoteView) -> Result<String> {
        let context = Context::from_serialize(view)?;
        Ok(self.tera.render(TYPST_NAME, &context)?)
    }
}

/// Quote a value as a Typst string literal.
pub fn escape_typst(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn typst_str(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let raw = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Ok(Value::String(escape_typst(&raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    use crate::assets::{CompanyImages, EmbeddedImage};
    use crate::template::TemplateId;
    use crate::view::tests::{sample_company, sample_quote};

    fn view_for(template: TemplateId) -> QuoteView {
        QuoteView::build_with_template(
            &sample_quote(),
            &sample_company(),
            &CompanyImages::default(),
            template,
        )
    }

    #[test]
    fn test_escape_typst() {
        assert_eq!(escape_typst("plain"), "\"plain\"");
        assert_eq!(escape_typst("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(escape_typst("a\\b"), "\"a\\\\b\"");
        assert_eq!(escape_typst("l1\r\nl2"), "\"l1\\nl2\"");
        assert_eq!(escape_typst("#set $x$ *bold*"), "\"#set $x$ *bold*\"");
    }

    #[test]
    fn test_every_template_renders_distinctly() {
        let renderer = Renderer::builtin().unwrap();
        let mut html_outputs = HashSet::new();
        let mut typst_outputs = HashSet::new();
        for template in TemplateId::ALL {
            let view = view_for(template);
            let html = renderer.render_html(&view, HtmlMode::Screen).unwrap();
            let typst = renderer.render_typst(&view).unwrap();
            assert!(html.contains(&format!("tpl-{}", template.id())));
            assert!(typst.contains(&format!("template: \"{}\"", template.id())));
            html_outputs.insert(html);
            typst_outputs.insert(typst);
        }
        assert_eq!(html_outputs.len(), TemplateId::ALL.len());
        assert_eq!(typst_outputs.len(), TemplateId::ALL.len());
    }

    #[test]
    fn test_all_templates_agree_on_totals() {
        let renderer = Renderer::builtin().unwrap();
        let reference = view_for(TemplateId::Classic);
        assert_eq!(reference.subtotal_ht, "250,00 €");
        assert_eq!(reference.total_vat, "45,00 €");
        assert_eq!(reference.total_ttc, "295,00 €");

        for template in TemplateId::ALL {
            let view = view_for(template);
            assert_eq!(view.subtotal_ht, reference.subtotal_ht, "{template}");
            assert_eq!(view.total_vat, reference.total_vat, "{template}");
            assert_eq!(view.total_ttc, reference.total_ttc, "{template}");

            let html = renderer.render_html(&view, HtmlMode::Print).unwrap();
            let typst = renderer.render_typst(&view).unwrap();
            for figure in [&reference.subtotal_ht, &reference.total_vat, &reference.total_ttc] {
                assert!(html.contains(figure.as_str()), "{template} html lacks {figure}");
                assert!(
                    typst.contains(&escape_typst(figure)),
                    "{template} typst lacks {figure}"
                );
            }
        }
    }

    #[test]
    fn test_html_escapes_user_text() {
        let mut quote = sample_quote();
        quote.client.name = "<script>alert(1)</script>".into();
        let view = QuoteView::build(&quote, &sample_company(), &CompanyImages::default());
        let html = Renderer::builtin().unwrap().render_html(&view, HtmlMode::Screen).unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_typst_quotes_user_text() {
        let mut quote = sample_quote();
        quote.client.name = "Studio \"Nord\" #1".into();
        quote.notes = Some("Ligne 1\nLigne 2".into());
        let view = QuoteView::build(&quote, &sample_company(), &CompanyImages::default());
        let typst = Renderer::builtin().unwrap().render_typst(&view).unwrap();
        assert!(typst.contains(r#"name: "Studio \"Nord\" #1","#));
        assert!(typst.contains(r#"notes: "Ligne 1\nLigne 2","#));
    }

    #[test]
    fn test_print_mode_triggers_dialog() {
        let renderer = Renderer::builtin().unwrap();
        let view = view_for(TemplateId::Elegant);
        let screen = renderer.render_html(&view, HtmlMode::Screen).unwrap();
        let print = renderer.render_html(&view, HtmlMode::Print).unwrap();
        assert!(!screen.contains("addEventListener('load'"));
        assert!(print.contains("addEventListener('load'"));
        assert!(print.contains("@media print"));
        assert!(print.contains("page-break-inside: avoid"));
    }

    #[test]
    fn test_empty_quote_renders() {
        let mut quote = sample_quote();
        quote.items.clear();
        quote.notes = None;
        let view = QuoteView::build(&quote, &sample_company(), &CompanyImages::default());
        let renderer = Renderer::builtin().unwrap();
        let html = renderer.render_html(&view, HtmlMode::Screen).unwrap();
        assert!(html.contains("Aucune prestation"));
        let typst = renderer.render_typst(&view).unwrap();
        assert!(typst.contains("notes: none,"));
        assert!(typst.contains("total_ttc: \"0,00 €\","));
    }

    #[test]
    fn test_images_are_embedded() {
        let images = CompanyImages {
            logo: Some(EmbeddedImage { mime: "image/png", extension: "png", bytes: vec![7; 4] }),
            signature: None,
        };
        let view = QuoteView::build(&sample_quote(), &sample_company(), &images);
        let renderer = Renderer::builtin().unwrap();
        let html = renderer.render_html(&view, HtmlMode::Screen).unwrap();
        assert!(html.contains("src=\"data:image/png;base64,BwcHBw==\""));
        let typst = renderer.render_typst(&view).unwrap();
        assert!(typst.contains("logo: \"logo.png\","));
        assert!(typst.contains("signature: none,"));
    }

    #[test]
    fn test_load_initializes_template_dir() {
        let dir = TempDir::new().unwrap();
        let renderer = Renderer::load(dir.path()).unwrap();
        assert!(dir.path().join("templates/quote.html.tera").exists());
        assert!(dir.path().join("templates/quote.typ.tera").exists());
        let html = renderer
            .render_html(&view_for(TemplateId::Classic), HtmlMode::Screen)
            .unwrap();
        assert!(html.contains("295,00 €"));
    }

    #[test]
    fn test_load_keeps_customized_templates() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("templates")).unwrap();
        fs::write(dir.path().join("templates/quote.html.tera"), "TOTAL={{ total_ttc }}").unwrap();
        let renderer = Renderer::load(dir.path()).unwrap();
        let html = renderer
            .render_html(&view_for(TemplateId::Classic), HtmlMode::Screen)
            .unwrap();
        assert_eq!(html, "TOTAL=295,00 €");
    }
}
