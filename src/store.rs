//! Where quotes and the company profile come from.
//!
//! The file store keeps TOML records under the data root:
//!
//! ```text
//! <root>/company.toml
//! <root>/data/clients/<client-slug>/info.toml
//! <root>/data/quotes/<number>.toml
//! ```
//!
//! The HTTP store reads the same records as JSON from a backend.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use regex::Regex;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use slug::slugify;
use tracing::{debug, warn};

use crate::error::{DevisError, Result};
use crate::model::{Client, Company, Quote};
use crate::pdf::file_safe;

const DEFAULT_COMPANY_TEMPLATE: &str = include_str!("../company.toml");

/// Quote prefix, followed by the creation date and a daily index
pub const NUMBER_PREFIX: &str = "DV";

pub trait QuoteSource {
    fn quote(&self, number: &str) -> Result<Quote>;

    /// Newest first
    fn quotes(&self) -> Result<Vec<Quote>>;

    fn company(&self) -> Result<Company>;
}

fn sort_newest_first(quotes: &mut [Quote]) {
    quotes.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.number.cmp(&a.number))
    });
}

// ==========================================
// File store
// ==========================================

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn quotes_dir(&self) -> PathBuf {
        self.root.join("data/quotes")
    }

    pub fn clients_dir(&self) -> PathBuf {
        self.root.join("data/clients")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    /// Ensure data directories exist
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(self.quotes_dir())?;
        fs::create_dir_all(self.clients_dir())?;
        Ok(())
    }

    fn quote_path(&self, number: &str) -> PathBuf {
        self.quotes_dir().join(format!("{}.toml", file_safe(number)))
    }

    pub fn save_quote(&self, quote: &Quote) -> Result<PathBuf> {
        fs::create_dir_all(self.quotes_dir())?;
        let path = self.quote_path(&quote.number);
        fs::write(&path, toml::to_string_pretty(quote)?)?;
        debug!(path = %path.display(), "quote saved");
        Ok(path)
    }

    /// Client ids are slugs of the company name, or of the person when
    /// there is no company.
    pub fn client_id(client: &Client) -> String {
        let raw = if client.company.trim().is_empty() { &client.name } else { &client.company };
        slugify(raw)
    }

    pub fn save_client(&self, client: &Client) -> Result<String> {
        let id = Self::client_id(client);
        let client_path = self.clients_dir().join(&id);
        if client_path.exists() {
            println!("⚠️  Client ID {} already exists, updating it.", id);
        } else {
            fs::create_dir_all(&client_path)?;
        }
        fs::write(client_path.join("info.toml"), toml::to_string_pretty(client)?)?;
        Ok(id)
    }

    pub fn load_client(&self, id: &str) -> Result<Client> {
        let content = fs::read_to_string(self.clients_dir().join(id).join("info.toml"))?;
        Ok(toml::from_str(&content)?)
    }

    /// All clients as `(id, client)`, sorted by id.
    pub fn clients(&self) -> Result<Vec<(String, Client)>> {
        let mut clients = Vec::new();
        let dir = self.clients_dir();
        if !dir.exists() {
            return Ok(clients);
        }
        for entry in fs::read_dir(dir)?.flatten() {
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let Ok(id) = entry.file_name().into_string() else { continue };
            match self.load_client(&id) {
                Ok(client) => clients.push((id, client)),
                Err(e) => warn!(client = %id, error = %e, "skipping unreadable client"),
            }
        }
        clients.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(clients)
    }

    /// Next free number for `date`, e.g. `DV20251214-03` when `-01` and
    /// `-02` already exist.
    pub fn next_number(&self, date: NaiveDate) -> Result<String> {
        let prefix = format!("{}{}", NUMBER_PREFIX, date.format("%Y%m%d"));
        let re = Regex::new(&format!(r"^{}-(\d+)$", regex::escape(&prefix)))
            .map_err(|e| DevisError::Config(e.to_string()))?;

        let mut next_idx = 1;
        let dir = self.quotes_dir();
        if dir.exists() {
            for entry in fs::read_dir(dir)?.flatten() {
                let path = entry.path();
                if path.extension().is_none_or(|e| e != "toml") {
                    continue;
                }
                let stem = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
                if let Some(idx) = re.captures(&stem).and_then(|c| c[1].parse::<u32>().ok()) {
                    next_idx = next_idx.max(idx + 1);
                }
            }
        }
        Ok(format!("{}-{:02}", prefix, next_idx))
    }
}

impl QuoteSource for FileStore {
    fn quote(&self, number: &str) -> Result<Quote> {
        let path = self.quote_path(number);
        if !path.exists() {
            return Err(DevisError::QuoteNotFound(number.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    fn quotes(&self) -> Result<Vec<Quote>> {
        let mut quotes = Vec::new();
        let dir = self.quotes_dir();
        if !dir.exists() {
            return Ok(quotes);
        }
        for entry in fs::read_dir(dir)?.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|e| e != "toml") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(DevisError::from)
                .and_then(|c| toml::from_str::<Quote>(&c).map_err(DevisError::from));
            match parsed {
                Ok(quote) => quotes.push(quote),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable quote"),
            }
        }
        sort_newest_first(&mut quotes);
        Ok(quotes)
    }

    fn company(&self) -> Result<Company> {
        let path = self.root.join("company.toml");
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            Ok(toml::from_str(&content)?)
        } else {
            println!("✨ Initializing default company profile at {}...", path.display());
            let default_company: Company = toml::from_str(DEFAULT_COMPANY_TEMPLATE)?;
            fs::create_dir_all(&self.root)?;
            fs::write(&path, DEFAULT_COMPANY_TEMPLATE)?;
            Ok(default_company)
        }
    }
}

// ==========================================
// HTTP store
// ==========================================

pub struct HttpStore {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(HttpStore { base_url: base_url.trim_end_matches('/').to_string(), client })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.client.get(&url).send()?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json()?)),
            status => Err(DevisError::Backend { status: status.as_u16(), url }),
        }
    }
}

impl QuoteSource for HttpStore {
    fn quote(&self, number: &str) -> Result<Quote> {
        self.get(&format!("quotes/{}", urlencoding::encode(number)))?
            .ok_or_else(|| DevisError::QuoteNotFound(number.to_string()))
    }

    fn quotes(&self) -> Result<Vec<Quote>> {
        let mut quotes: Vec<Quote> = self.get("quotes")?.unwrap_or_default();
        sort_newest_first(&mut quotes);
        Ok(quotes)
    }

    fn company(&self) -> Result<Company> {
        self.get("profile")?.ok_or_else(|| DevisError::Backend {
            status: StatusCode::NOT_FOUND.as_u16(),
            url: self.url("profile"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::test_http::serve_once;
    use crate::view::tests::sample_quote;

    fn store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.init().unwrap();
        (dir, store)
    }

    #[test]
    fn test_quote_round_trip() {
        let (_dir, store) = store();
        let quote = sample_quote();
        let path = store.save_quote(&quote).unwrap();
        assert!(path.ends_with("data/quotes/DV20240315-01.toml"));
        assert_eq!(store.quote("DV20240315-01").unwrap(), quote);
    }

    #[test]
    fn test_missing_quote() {
        let (_dir, store) = store();
        assert!(matches!(store.quote("nope"), Err(DevisError::QuoteNotFound(n)) if n == "nope"));
    }

    #[test]
    fn test_quotes_sorted_newest_first_and_skip_garbage() {
        let (_dir, store) = store();
        let older = sample_quote();
        let mut newer = sample_quote();
        newer.number = "DV20240401-01".into();
        newer.created_at = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        store.save_quote(&older).unwrap();
        store.save_quote(&newer).unwrap();
        fs::write(store.quotes_dir().join("broken.toml"), "not = [valid").unwrap();

        let numbers: Vec<_> = store.quotes().unwrap().into_iter().map(|q| q.number).collect();
        assert_eq!(numbers, vec!["DV20240401-01", "DV20240315-01"]);
    }

    #[test]
    fn test_next_number_increments_per_day() {
        let (_dir, store) = store();
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(store.next_number(day).unwrap(), "DV20240315-01");

        store.save_quote(&sample_quote()).unwrap();
        let mut third = sample_quote();
        third.number = "DV20240315-07".into();
        store.save_quote(&third).unwrap();
        assert_eq!(store.next_number(day).unwrap(), "DV20240315-08");

        let other_day = NaiveDate::from_ymd_opt(2024, 3, 16).unwrap();
        assert_eq!(store.next_number(other_day).unwrap(), "DV20240316-01");
    }

    #[test]
    fn test_clients_by_slug() {
        let (_dir, store) = store();
        let quote = sample_quote();
        let id = store.save_client(&quote.client).unwrap();
        assert_eq!(id, "dupont-fils");

        let person = Client { name: "Jean Morel".into(), ..Client::default() };
        assert_eq!(store.save_client(&person).unwrap(), "jean-morel");

        let clients = store.clients().unwrap();
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0].0, "dupont-fils");
        assert_eq!(clients[0].1, quote.client);
    }

    #[test]
    fn test_company_profile_initialized_once() {
        let (dir, store) = store();
        let company = store.company().unwrap();
        assert_eq!(company.name, "Mon Entreprise");
        assert!(company.logo.is_none());
        assert!(dir.path().join("company.toml").exists());

        fs::write(dir.path().join("company.toml"), "name = \"Atelier\"\n").unwrap();
        assert_eq!(store.company().unwrap().name, "Atelier");
    }

    #[test]
    fn test_http_store_urls() {
        let store = HttpStore::new("https://api.example.com/v1/", Duration::from_secs(1)).unwrap();
        assert_eq!(store.url("quotes"), "https://api.example.com/v1/quotes");
        assert_eq!(store.url("/profile"), "https://api.example.com/v1/profile");
    }

    fn http_store(base: &str) -> HttpStore {
        HttpStore::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_http_quote_found() {
        let body = r#"{"number":"DV-1","createdAt":"2024-05-02","validUntil":"2024-06-01",
            "currency":"EUR","template":"minimal","client":{"name":"Acme"},
            "items":[{"id":"1","description":"Audit","quantity":1,"unitPrice":300,"vatRate":20}]}"#;
        let (base, requests) = serve_once("200 OK", "application/json", body, Duration::ZERO);

        let quote = http_store(&base).quote("DV 1").unwrap();
        assert_eq!(requests.recv().unwrap(), "GET /quotes/DV%201 HTTP/1.1");
        assert_eq!(quote.number, "DV-1");
        assert_eq!(quote.template, crate::template::TemplateId::Minimal);
        assert_eq!(quote.items[0].total_ht(), rust_decimal::Decimal::from(300));
    }

    #[test]
    fn test_http_404_is_quote_not_found() {
        let (base, _requests) = serve_once("404 Not Found", "text/plain", "", Duration::ZERO);
        let err = http_store(&base).quote("DV-404").unwrap_err();
        assert!(matches!(err, DevisError::QuoteNotFound(n) if n == "DV-404"));
    }

    #[test]
    fn test_http_server_error_is_backend_error() {
        let (base, _requests) =
            serve_once("500 Internal Server Error", "text/plain", "boom", Duration::ZERO);
        let err = http_store(&base).quote("DV-1").unwrap_err();
        match err {
            DevisError::Backend { status, url } => {
                assert_eq!(status, 500);
                assert_eq!(url, format!("{}/quotes/DV-1", base));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_http_missing_profile_is_backend_error() {
        let (base, requests) = serve_once("404 Not Found", "text/plain", "", Duration::ZERO);
        let err = http_store(&base).company().unwrap_err();
        assert_eq!(requests.recv().unwrap(), "GET /profile HTTP/1.1");
        assert!(matches!(err, DevisError::Backend { status: 404, .. }));
    }

    #[test]
    fn test_http_quotes_sorted_newest_first() {
        let body = r#"[
            {"number":"A","createdAt":"2024-01-01","validUntil":"2024-02-01","currency":"EUR","client":{"name":"x"}},
            {"number":"B","createdAt":"2024-03-01","validUntil":"2024-04-01","currency":"EUR","client":{"name":"y"}}
        ]"#;
        let (base, _requests) = serve_once("200 OK", "application/json", body, Duration::ZERO);
        let numbers: Vec<_> = http_store(&base).quotes().unwrap().into_iter().map(|q| q.number).collect();
        assert_eq!(numbers, vec!["B", "A"]);
    }

    #[test]
    fn test_backend_json_with_camel_case_fields() {
        let json = r#"{
            "number": "Q-1",
            "createdAt": "2024-05-02",
            "expiryDate": "2024-06-01",
            "currency": "USD",
            "notes": null,
            "template": "creative",
            "client": { "name": "Acme" },
            "items": [
                { "id": "a", "description": "Design", "quantity": 2, "unitPrice": 100, "vatRate": 20 }
            ],
            "totalTTC": 240
        }"#;
        let quote: Quote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.template, crate::template::TemplateId::Creative);
        assert_eq!(quote.items[0].total_ht(), rust_decimal::Decimal::from(200));
        assert_eq!(quote.total_ttc, Some(rust_decimal::Decimal::from(240)));
    }
}
