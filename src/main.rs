mod assets;
mod config;
mod currency;
mod error;
mod model;
mod pdf;
mod render;
mod report;
mod share;
mod store;
mod template;
mod totals;
mod view;
mod wizard;

#[cfg(test)]
mod test_http;

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, bail};
use chrono::{Datelike, Local};
use clap::{CommandFactory, Parser, Subcommand};
use slug::slugify;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::assets::CompanyImages;
use crate::config::{AppSettings, load_settings, setup_config_wizard};
use crate::currency::CurrencyFormat;
use crate::model::{Company, Quote};
use crate::pdf::{PdfExporter, bundle, bundle_file_name, pdf_file_name};
use crate::render::{HtmlMode, Renderer};
use crate::share::ShareVia;
use crate::store::{FileStore, HttpStore, QuoteSource};
use crate::template::TemplateId;
use crate::totals::QuoteTotals;
use crate::view::QuoteView;

const BACKEND_TIMEOUT: Duration = Duration::from_secs(30);

// ==========================================
// CLI
// ==========================================

#[derive(Parser)]
#[command(name = "devis", about = "Render business quotes to HTML, print and PDF")]
struct Cli {
    /// Read quotes and the company profile from this backend
    #[arg(long, global = true)]
    remote: Option<String>,

    /// Do not open generated files or links
    #[arg(long, global = true)]
    no_open: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new quote
    New,
    /// Add a new client
    AddClient,
    /// Configure data directory and defaults
    Config,
    /// List all quotes
    List,
    /// Show the items and totals of a quote
    Show { number: String },
    /// Write the on-screen HTML and open it in the browser
    Preview {
        number: String,
        /// Override the template stored on the quote
        #[arg(long, short)]
        template: Option<TemplateId>,
    },
    /// Write print-ready HTML and open the print dialog
    Print {
        number: String,
        #[arg(long, short)]
        template: Option<TemplateId>,
    },
    /// Export a quote to PDF
    Export {
        number: String,
        #[arg(long, short, conflicts_with = "all")]
        template: Option<TemplateId>,
        /// Export every template and bundle the PDFs in a zip archive
        #[arg(long)]
        all: bool,
    },
    /// Compose an email or WhatsApp message for the client
    Share {
        number: String,
        #[arg(long, value_enum, default_value = "email")]
        via: ShareVia,
    },
    /// List available templates
    Templates,
    /// List supported currencies
    Currencies,
}

// ==========================================
// Main Function
// ==========================================

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help().ok();
        return;
    };

    let opener = Opener { enabled: !cli.no_open };
    if let Err(e) = run(command, cli.remote, &opener) {
        eprintln!("❌ Error: {}", error_chain(&e));
        std::process::exit(1);
    }
}

/// Settings, local store and the source quotes are read from.
struct Workspace {
    settings: AppSettings,
    store: FileStore,
    source: Box<dyn QuoteSource>,
    remote: bool,
}

impl Workspace {
    fn open(remote: Option<String>) -> anyhow::Result<Self> {
        let settings = match load_settings() {
            Some(settings) => settings,
            None => setup_config_wizard()?,
        };
        let root = settings.root();
        let store = FileStore::new(&root);
        store
            .init()
            .with_context(|| format!("Failed to create data directory {}", root.display()))?;

        let backend = remote.or_else(|| settings.backend_url.clone());
        let source: Box<dyn QuoteSource> = match &backend {
            Some(url) => Box::new(HttpStore::new(url, BACKEND_TIMEOUT)?),
            None => Box::new(FileStore::new(&root)),
        };
        Ok(Workspace { settings, store, source, remote: backend.is_some() })
    }

    fn root(&self) -> &Path {
        self.store.root()
    }

    fn load_quote(&self, number: &str) -> anyhow::Result<Quote> {
        let quote = self
            .source
            .quote(number)
            .with_context(|| format!("Failed to load quote {}", number))?;
        if !CurrencyFormat::is_supported(&quote.currency) {
            warn!(currency = %quote.currency, "unsupported currency, using generic format");
        }
        QuoteTotals::for_quote(&quote).check_stored(&quote);
        Ok(quote)
    }

    /// Company profile and its images, fetched once per command.
    fn company(&self) -> anyhow::Result<(Company, CompanyImages)> {
        let company = self.source.company().context("Failed to load company profile")?;
        let images = CompanyImages::load(&company, self.root(), self.settings.image_timeout());
        Ok((company, images))
    }

    fn view(&self, quote: &Quote, template: Option<TemplateId>) -> anyhow::Result<QuoteView> {
        let (company, images) = self.company()?;
        Ok(QuoteView::build_with_template(
            quote,
            &company,
            &images,
            template.unwrap_or(quote.template),
        ))
    }

    /// `<root>/output/<year>/<client-slug>/`
    fn output_dir(&self, quote: &Quote) -> PathBuf {
        let client = if quote.client.company.trim().is_empty() {
            &quote.client.name
        } else {
            &quote.client.company
        };
        let client = slugify(client);
        let client = if client.is_empty() { "unknown-client".to_string() } else { client };
        self.store
            .output_dir()
            .join(quote.created_at.year().to_string())
            .join(client)
    }
}

fn run(command: Commands, remote: Option<String>, opener: &Opener) -> anyhow::Result<()> {
    match command {
        Commands::Templates => println!("{}", report::templates_table()),
        Commands::Currencies => println!("{}", report::currencies_table()),
        Commands::Config => {
            setup_config_wizard()?;
        }
        Commands::AddClient => {
            let ws = Workspace::open(remote)?;
            wizard::create_client_wizard(&ws.store)?;
        }
        Commands::New => {
            let ws = Workspace::open(remote)?;
            if ws.remote {
                bail!("New quotes are created in the local data directory; drop --remote/backend_url.");
            }
            match wizard::new_quote_wizard(&ws.store, &ws.settings)? {
                Some(quote) => {
                    let path = ws.store.save_quote(&quote)?;
                    println!("✅ Quote {} saved: {}", quote.number, path.display());
                    let view = ws.view(&quote, None)?;
                    println!("{}", report::quote_table(&view));
                }
                None => println!("❌ No items entered. Aborting."),
            }
        }
        Commands::List => {
            let ws = Workspace::open(remote)?;
            let quotes = ws.source.quotes().context("Failed to list quotes")?;
            println!("--- Quotes ---");
            if quotes.is_empty() {
                println!("(None found)");
            } else {
                println!("{}", report::quotes_table(&quotes, Local::now().date_naive()));
            }
        }
        Commands::Show { number } => {
            let ws = Workspace::open(remote)?;
            let quote = ws.load_quote(&number)?;
            let view = ws.view(&quote, None)?;
            println!("\nDevis {} · {} · {}", view.number, view.client.name, view.template_label);
            println!("Date: {}  Valid until: {}", view.created_at, view.valid_until);
            println!("{}", report::quote_table(&view));
        }
        Commands::Preview { number, template } => {
            let ws = Workspace::open(remote)?;
            let path = write_html(&ws, &number, template, HtmlMode::Screen)?;
            println!("✅ Preview written: {}", path.display());
            opener.open(path.as_os_str());
        }
        Commands::Print { number, template } => {
            let ws = Workspace::open(remote)?;
            let path = write_html(&ws, &number, template, HtmlMode::Print)?;
            println!("🖨️  Print page written: {}", path.display());
            opener.open(path.as_os_str());
        }
        Commands::Export { number, template, all } => {
            let ws = Workspace::open(remote)?;
            export(&ws, &number, template, all, opener)?;
        }
        Commands::Share { number, via } => {
            let ws = Workspace::open(remote)?;
            let quote = ws.load_quote(&number)?;
            let view = ws.view(&quote, None)?;
            let link = match via {
                ShareVia::Email => share::email_link(&view),
                ShareVia::Whatsapp => share::whatsapp_link(&view)?,
            };
            println!("🔗 {}", link);
            opener.open(OsStr::new(&link));
        }
    }
    Ok(())
}

// ==========================================
// Rendering Commands
// ==========================================

fn write_html(
    ws: &Workspace,
    number: &str,
    template: Option<TemplateId>,
    mode: HtmlMode,
) -> anyhow::Result<PathBuf> {
    let quote = ws.load_quote(number)?;
    let view = ws.view(&quote, template)?;
    let renderer = Renderer::load(ws.root())?;
    let html = renderer.render_html(&view, mode)?;

    let out_dir = ws.output_dir(&quote);
    fs::create_dir_all(&out_dir)?;
    let path = out_dir
        .join(pdf_file_name(&view.number, view.template, Local::now().date_naive()))
        .with_extension("html");
    fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn export(
    ws: &Workspace,
    number: &str,
    template: Option<TemplateId>,
    all: bool,
    opener: &Opener,
) -> anyhow::Result<()> {
    let exporter = PdfExporter::new(&ws.settings.typst_bin);
    let quote = ws.load_quote(number)?;
    let (company, images) = ws.company()?;
    let renderer = Renderer::load(ws.root())?;
    let out_dir = ws.output_dir(&quote);

    let today = Local::now().date_naive();

    println!("\n🔨 Compiling PDF...");
    let pdfs = if all {
        let views: Vec<QuoteView> = TemplateId::ALL
            .into_iter()
            .map(|t| QuoteView::build_with_template(&quote, &company, &images, t))
            .collect();
        exporter.export_all(&views, &renderer, &out_dir, today)?
    } else {
        let template = template.unwrap_or(quote.template);
        let view = QuoteView::build_with_template(&quote, &company, &images, template);
        vec![exporter.export(&view, &renderer, &out_dir, today)?]
    };
    for pdf in &pdfs {
        println!("✅ PDF Generated: {}", pdf.display());
    }

    if all {
        let archive = out_dir.join(bundle_file_name(&quote.number));
        bundle(&pdfs, &archive)?;
        println!("📦 Bundle: {}", archive.display());
        opener.reveal(&archive);
    } else if let Some(pdf) = pdfs.first() {
        opener.reveal(pdf);
        opener.open(pdf.as_os_str());
    }
    Ok(())
}

/// `{:#}` without repeating a cause its wrapper already printed.
fn error_chain(e: &anyhow::Error) -> String {
    let mut out = e.to_string();
    for cause in e.chain().skip(1) {
        let text = cause.to_string();
        if !out.ends_with(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
    }
    out
}

// ==========================================
// Utilities
// ==========================================

struct Opener {
    enabled: bool,
}

impl Opener {
    /// Open a file or URL with the platform handler.
    fn open(&self, target: &OsStr) {
        if !self.enabled {
            return;
        }
        #[cfg(target_os = "macos")]
        Command::new("open").arg(target).spawn().ok();

        #[cfg(target_os = "windows")]
        Command::new("explorer").arg(target).spawn().ok();

        #[cfg(target_os = "linux")]
        Command::new("xdg-open").arg(target).spawn().ok();
    }

    /// Reveal a file in Finder/Explorer
    fn reveal(&self, path: &Path) {
        if !self.enabled {
            return;
        }
        #[cfg(target_os = "macos")]
        Command::new("open").arg("-R").arg(path).spawn().ok();

        #[cfg(target_os = "windows")]
        Command::new("explorer")
            .arg(format!("/select,{}", path.to_string_lossy()))
            .spawn()
            .ok();

        #[cfg(target_os = "linux")]
        if let Some(parent) = path.parent() {
            Command::new("xdg-open").arg(parent).spawn().ok();
        }
    }
}
