use resolver::{ClientContext, ContextError, DateStyle};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:1234";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub log_level: String,
    pub base_url: String,
    pub date_style: DateStyle,
    pub utc_offset_minutes: i32,
    pub download_dir: PathBuf,
    pub log_dir: PathBuf,
}

pub struct AppConfigOverrides {
    pub log_level: Option<String>,
    pub base_url: Option<String>,
    pub date_style: Option<DateStyle>,
    pub utc_offset_minutes: Option<i32>,
}

fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".galleryview")
}

pub fn default_config_path() -> PathBuf {
    app_dir().join("config")
}

impl AppConfig {
    pub fn load_from(path: Option<PathBuf>) -> Self {
        let path = path.unwrap_or_else(default_config_path);
        let cfg = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("GALLERYVIEW"))
            .build()
            .unwrap_or_default();

        let log_level = cfg
            .get_string("log_level")
            .unwrap_or_else(|_| "info".to_string());
        let base_url = cfg
            .get_string("base_url")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let date_style = cfg
            .get_string("date_style")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        let utc_offset_minutes = cfg.get_int("utc_offset_minutes").unwrap_or(0) as i32;
        let download_dir = cfg
            .get_string("download_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::download_dir().unwrap_or_else(|| app_dir().join("downloads"))
            });
        let log_dir = cfg
            .get_string("log_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|_| app_dir());

        Self {
            log_level,
            base_url,
            date_style,
            utc_offset_minutes,
            download_dir,
            log_dir,
        }
    }

    pub fn apply_overrides(mut self, ov: &AppConfigOverrides) -> Self {
        if let Some(l) = &ov.log_level {
            self.log_level = l.clone();
        }
        if let Some(b) = &ov.base_url {
            self.base_url = b.clone();
        }
        if let Some(d) = ov.date_style {
            self.date_style = d;
        }
        if let Some(m) = ov.utc_offset_minutes {
            self.utc_offset_minutes = m;
        }
        self
    }

    pub fn client_context(&self) -> Result<ClientContext, ContextError> {
        ClientContext::new(self.base_url.clone())
            .with_date_style(self.date_style)
            .with_utc_offset_minutes(self.utc_offset_minutes)
    }

    pub fn save_to(&self, path: Option<PathBuf>) -> std::io::Result<PathBuf> {
        let path = path.unwrap_or_else(|| default_config_path().with_extension("toml"));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = toml::to_string(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(&path, data)?;
        Ok(path)
    }
}
