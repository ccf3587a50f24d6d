use std::env;
use url::Url;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the recognition backend. Always ends in `/` so endpoint
    /// paths join underneath it.
    pub backend_url: Url,
}

impl Config {
    pub fn from_env() -> Result<Config, failure::Error> {
        let backend_url =
            env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
        Config::with_backend_url(&backend_url)
    }

    pub fn with_backend_url(raw: &str) -> Result<Config, failure::Error> {
        let normalized = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{}/", raw)
        };
        let backend_url = Url::parse(&normalized)
            .map_err(|e| format_err!("Invalid BACKEND_URL {:?}: {}", raw, e))?;
        if backend_url.cannot_be_a_base() {
            bail!("BACKEND_URL {:?} cannot have endpoint paths", raw);
        }
        Ok(Config { backend_url })
    }
}
