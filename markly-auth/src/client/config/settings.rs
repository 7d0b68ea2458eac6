use config::{Config, ConfigError, File};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub supabase_url: String,

    pub anon_key: String,

    #[serde(default = "default_site_url")]
    pub site_url: String,

    #[serde(default = "default_callback_path")]
    pub callback_path: String,
}

fn default_site_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_callback_path() -> String {
    "/auth/callback".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("MARKLY_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

        let settings = Config::builder()
            .add_source(File::with_name(&config_path).required(false))
            .add_source(config::Environment::with_prefix("MARKLY").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.supabase_url.is_empty() {
            return Err("supabase_url is required".to_string());
        }
        if !self.supabase_url.starts_with("http") {
            return Err("supabase_url must be a valid HTTP(S) URL".to_string());
        }
        if self.anon_key.is_empty() {
            return Err("anon_key is required".to_string());
        }
        if Url::parse(&self.site_url).is_err() {
            return Err(format!("site_url '{}' is not a valid URL", self.site_url));
        }
        if !self.callback_path.starts_with('/') {
            return Err("callback_path must start with '/'".to_string());
        }
        Ok(())
    }

    /// Where the identity provider sends the browser after consent
    pub fn redirect_url(&self) -> String {
        format!(
            "{}{}",
            self.site_url.trim_end_matches('/'),
            self.callback_path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            supabase_url: "https://project.supabase.co".to_string(),
            anon_key: "anon".to_string(),
            site_url: default_site_url(),
            callback_path: default_callback_path(),
        }
    }

    #[test]
    fn test_defaults_validate() {
        assert!(settings().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_supabase_url() {
        let mut settings = settings();
        settings.supabase_url = "project.supabase.co".to_string();
        assert_eq!(
            settings.validate().unwrap_err(),
            "supabase_url must be a valid HTTP(S) URL"
        );
    }

    #[test]
    fn test_rejects_missing_anon_key() {
        let mut settings = settings();
        settings.anon_key = String::new();
        assert_eq!(settings.validate().unwrap_err(), "anon_key is required");
    }

    #[test]
    fn test_redirect_url_joins_site_and_callback() {
        let mut settings = settings();
        settings.site_url = "http://127.0.0.1:4000/".to_string();
        assert_eq!(
            settings.redirect_url(),
            "http://127.0.0.1:4000/auth/callback"
        );
    }
}
