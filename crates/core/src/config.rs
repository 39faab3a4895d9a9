use serde::{Deserialize, Serialize};
use std::{
    fmt,
    time::{Duration, SystemTime},
};
use url::Url;

pub const DEFAULT_DEVICE_INDEX: i32 = 0;
pub const DEFAULT_FRAME_WIDTH: u32 = 1280;
pub const DEFAULT_FRAME_HEIGHT: u32 = 720;
pub const DEFAULT_WINDOW_CAPACITY: usize = 150;
pub const DEFAULT_COOLDOWN_MS: u64 = 5_000;
pub const DEFAULT_GENERATION_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_GENERATION_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1/";
pub const DEFAULT_CASCADE_PATH: &str = "haarcascade_frontalface_default.xml";
pub const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
pub const ENV_CASCADE_PATH: &str = "MIRROR_CASCADE_PATH";

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKeys {
    pub groq: Option<ApiKey>,
}

/// Bound on the sliding emotion-observation window.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowCapacity(usize);

impl WindowCapacity {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroWindowCapacity);
        }
        Ok(Self(capacity))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for WindowCapacity {
    fn default() -> Self {
        Self(DEFAULT_WINDOW_CAPACITY)
    }
}

/// Minimum elapsed time between successive quote-generation attempts.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshCooldown {
    pub millis: u64,
}

impl RefreshCooldown {
    pub fn new(millis: u64) -> Result<Self, ConfigError> {
        if millis == 0 {
            return Err(ConfigError::ZeroCooldown);
        }
        Ok(Self { millis })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.millis)
    }
}

impl Default for RefreshCooldown {
    fn default() -> Self {
        Self {
            millis: DEFAULT_COOLDOWN_MS,
        }
    }
}

/// Upper bound on a single quote-generation request.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationTimeout {
    pub millis: u64,
}

impl GenerationTimeout {
    pub fn new(millis: u64) -> Result<Self, ConfigError> {
        if millis == 0 {
            return Err(ConfigError::ZeroGenerationTimeout);
        }
        Ok(Self { millis })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.millis)
    }
}

impl Default for GenerationTimeout {
    fn default() -> Self {
        Self {
            millis: DEFAULT_GENERATION_TIMEOUT_MS,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CameraConfig {
    pub device_index: i32,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: DEFAULT_DEVICE_INDEX,
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationConfig {
    pub model: String,
    pub api_base: Url,
    pub timeout: GenerationTimeout,
}

impl GenerationConfig {
    pub fn new(
        model: String,
        api_base: &str,
        timeout: GenerationTimeout,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            model,
            api_base: Url::parse(api_base)?,
            timeout,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub window_capacity: WindowCapacity,
    pub cooldown: RefreshCooldown,
    pub generation: GenerationConfig,
    pub api_keys: ApiKeys,
    pub cascade_path: String,
    pub start_time: SystemTime,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("api key must not be empty")]
    EmptyApiKey,
    #[error("window capacity must be > 0")]
    ZeroWindowCapacity,
    #[error("cooldown must be > 0 ms")]
    ZeroCooldown,
    #[error("generation timeout must be > 0 ms")]
    ZeroGenerationTimeout,
    #[error("invalid api base url: {0}")]
    InvalidApiBase(#[from] url::ParseError),
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_api_key(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Result<Option<ApiKey>, ConfigError> {
    match cli_value {
        Some(v) => Ok(Some(ApiKey::new(v)?)),
        None => match env.var(env_key) {
            Some(v) => Ok(Some(ApiKey::new(v)?)),
            None => Ok(None),
        },
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}
