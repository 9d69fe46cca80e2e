use std::path::PathBuf;
use std::time::Duration;

/// Per-IP rate limiting for the prediction routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub per_second: u64,
    pub burst: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
    /// `None` disables rate limiting.
    pub rate_limit: Option<RateLimit>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            model_path: PathBuf::from("ML_artifact/RFC_pipeline.json"),
            max_body_bytes: 64 * 1024,
            request_timeout: Duration::from_secs(10),
            rate_limit: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Model path: {}", config.model_path.display());
        tracing::debug!("Server address: {}", config.addr());
        tracing::debug!(
            "Body limit: {} bytes, request timeout: {:?}",
            config.max_body_bytes,
            config.request_timeout
        );
        match config.rate_limit {
            Some(limit) => tracing::info!(
                "Rate limiting enabled: {} req/s per IP, burst {}",
                limit.per_second,
                limit.burst
            ),
            None => tracing::info!("Rate limiting disabled"),
        }

        Ok(config)
    }

    /// Builds a configuration from an arbitrary variable source.
    ///
    /// Unset variables fall back to [`Config::default`].
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or(defaults.host);

        let port = match var("PORT") {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            None => defaults.port,
        };

        let model_path = var("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);

        let max_body_bytes = match var("MAX_BODY_BYTES") {
            Some(raw) => positive::<usize>("MAX_BODY_BYTES", &raw)?,
            None => defaults.max_body_bytes,
        };

        let request_timeout = match var("REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(positive::<u64>("REQUEST_TIMEOUT_SECS", &raw)?),
            None => defaults.request_timeout,
        };

        let rate_limit = match var("RATE_LIMIT_PER_SECOND") {
            Some(raw) => {
                let per_second = positive::<u64>("RATE_LIMIT_PER_SECOND", &raw)?;
                let burst = match var("RATE_LIMIT_BURST") {
                    Some(raw) => positive::<u32>("RATE_LIMIT_BURST", &raw)?,
                    None => 20,
                };
                Some(RateLimit { per_second, burst })
            }
            None => None,
        };

        Ok(Self {
            host,
            port,
            model_path,
            max_body_bytes,
            request_timeout,
            rate_limit,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn positive<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => anyhow::bail!("{} must be a positive integer, got '{}'", key, raw),
    }
}
