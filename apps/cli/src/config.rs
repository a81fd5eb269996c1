use std::fs;

use serde::Deserialize;

const CONFIG_FILE: &str = "quotes.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_url: String,
    pub user_id: Option<i64>,
    pub page_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".to_string(),
            user_id: None,
            page_size: 10,
        }
    }
}

/// Defaults, then `quotes.toml` from the working directory, then environment
/// overrides. Command-line flags are applied on top by the caller.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(CONFIG_FILE) {
        apply_file_config(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings);

    settings
}

fn apply_file_config(settings: &mut Settings, raw: &str) {
    if let Ok(file_cfg) = toml::from_str::<Settings>(raw) {
        *settings = file_cfg;
    }
}

fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(v) = std::env::var("QUOTES_SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Ok(v) = std::env::var("QUOTES_USER_ID") {
        if let Ok(parsed) = v.parse() {
            settings.user_id = Some(parsed);
        }
    }
    if let Ok(v) = std::env::var("APP__USER_ID") {
        if let Ok(parsed) = v.parse() {
            settings.user_id = Some(parsed);
        }
    }

    if let Ok(v) = std::env::var("APP__PAGE_SIZE") {
        if let Ok(parsed) = v.parse::<usize>() {
            if parsed > 0 {
                settings.page_size = parsed;
            }
        }
    }
}
