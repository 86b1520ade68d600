use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::{BaseDirs, ProjectDirs};
use inquire::{Select, Text};
use serde::{Deserialize, Serialize};

use crate::currency::SUPPORTED;
use crate::error::Result;
use crate::template::TemplateId;

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_validity_days() -> u32 {
    30
}

fn default_image_timeout_secs() -> u64 {
    5
}

fn default_typst_bin() -> String {
    "typst".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    pub data_root: String,
    #[serde(default = "default_currency")]
    pub default_currency: String,
    #[serde(default)]
    pub default_template: TemplateId,
    #[serde(default = "default_validity_days")]
    pub validity_days: u32,
    /// Read quotes from this backend instead of the data root
    pub backend_url: Option<String>,
    #[serde(default = "default_image_timeout_secs")]
    pub image_timeout_secs: u64,
    #[serde(default = "default_typst_bin")]
    pub typst_bin: String,
}

impl AppSettings {
    pub fn with_root(data_root: impl Into<String>) -> Self {
        AppSettings {
            data_root: data_root.into(),
            default_currency: default_currency(),
            default_template: TemplateId::default(),
            validity_days: default_validity_days(),
            backend_url: None,
            image_timeout_secs: default_image_timeout_secs(),
            typst_bin: default_typst_bin(),
        }
    }

    pub fn root(&self) -> PathBuf {
        PathBuf::from(expand_home_dir(&self.data_root))
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs)
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "devis-maker", "app") {
        let config_dir = proj_dirs.config_dir();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir).ok();
        }
        return config_dir.join("settings.toml");
    }
    PathBuf::from("settings.toml")
}

pub fn load_settings() -> Option<AppSettings> {
    let path = get_config_path();
    if !path.exists() {
        return None;
    }
    let content = fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!(error = %e, "settings.toml is invalid, running setup again");
            None
        }
    }
}

pub fn save_settings(settings: &AppSettings) -> Result<PathBuf> {
    let path = get_config_path();
    fs::write(&path, toml::to_string_pretty(settings)?)?;
    Ok(path)
}

pub fn setup_config_wizard() -> Result<AppSettings> {
    println!("\n⚙️  --- Configuration Setup ---");
    let current = load_settings();
    let defaults = current.unwrap_or_else(|| AppSettings::with_root("~/Documents/Devis"));

    let data_root = Text::new("Root Data Directory:")
        .with_default(&defaults.data_root)
        .prompt()?;

    let currencies: Vec<&str> = SUPPORTED.iter().map(|c| &*c.code).collect();
    let start = currencies
        .iter()
        .position(|c| *c == defaults.default_currency)
        .unwrap_or(0);
    let default_currency = Select::new("Default Currency:", currencies)
        .with_starting_cursor(start)
        .prompt()?
        .to_string();

    let templates = TemplateId::ALL.to_vec();
    let start = templates
        .iter()
        .position(|t| *t == defaults.default_template)
        .unwrap_or(0);
    let default_template = Select::new("Default Template:", templates)
        .with_starting_cursor(start)
        .prompt()?;

    let validity = Text::new("Quote validity (days):")
        .with_default(&defaults.validity_days.to_string())
        .prompt()?;

    let backend = Text::new("Backend URL (Optional, press Enter to use local files):")
        .with_default(defaults.backend_url.as_deref().unwrap_or(""))
        .prompt()?;

    let settings = AppSettings {
        data_root,
        default_currency,
        default_template,
        validity_days: validity.trim().parse().unwrap_or(defaults.validity_days),
        backend_url: Some(backend.trim().to_string()).filter(|b| !b.is_empty()),
        ..defaults
    };

    save_settings(&settings)?;
    println!("✅ Settings saved.");
    Ok(settings)
}

pub fn expand_home_dir(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}
