use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub debug: bool,
    pub auth_token: String,
    pub enable_swagger: bool,
    pub port: u16,
    /// Background poll cadence. Best-effort; the due window absorbs jitter.
    pub poll_interval_minutes: u64,
    /// Bound on the cross-context snapshot fetch.
    pub snapshot_timeout_ms: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // Load from environment variables with APP_ prefix
            .add_source(Environment::with_prefix("APP"))
            .set_default("debug", false)?
            .set_default("auth_token", "default-token-change-me")?
            .set_default("enable_swagger", true)?
            .set_default("port", 8080)?
            .set_default("poll_interval_minutes", 15)?
            .set_default("snapshot_timeout_ms", 3000)?
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        // tokio's interval panics on a zero period; catch it at load time.
        if settings.poll_interval_minutes == 0 {
            return Err(ConfigError::Message(
                "poll_interval_minutes must be at least 1".into(),
            ));
        }
        Ok(settings)
    }
}
