use serde::Deserialize;
use std::collections::HashMap;
use std::env;

use crate::json_fields::JsonFieldMode;

/// The documented environment variables and the keys they feed.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("APPWRITE_ENDPOINT", "appwrite.endpoint"),
    ("APPWRITE_PROJECT_ID", "appwrite.project_id"),
    ("APPWRITE_API_KEY", "appwrite.api_key"),
    ("APPWRITE_DATABASE_ID", "appwrite.database_id"),
    ("APPWRITE_USERS_COLLECTION_ID", "appwrite.collections.users"),
    ("APPWRITE_BOOKINGS_COLLECTION_ID", "appwrite.collections.bookings"),
    ("APPWRITE_PAYMENTS_COLLECTION_ID", "appwrite.collections.payments"),
    ("APPWRITE_SAVED_PLANS_COLLECTION_ID", "appwrite.collections.saved_trip_plans"),
    ("GEMINI_API_KEY", "providers.gemini_api_key"),
    ("SERPAPI_API_KEY", "providers.serpapi_api_key"),
    ("GOOGLE_MAPS_API_KEY", "providers.google_maps_api_key"),
    ("ELEVENLABS_API_KEY", "providers.elevenlabs_api_key"),
    // optional extras
    ("PORT", "server.port"),
    ("REDIS_URL", "redis.url"),
    ("ELEVENLABS_VOICE_ID", "providers.elevenlabs_voice_id"),
    ("GEMINI_MODEL", "providers.gemini_model"),
    ("WHISPER_MODEL", "providers.whisper_model"),
    ("WHISPER_BINARY", "providers.whisper_binary"),
    ("FFMPEG_BINARY", "providers.ffmpeg_binary"),
    ("JWT_SECRET", "auth.jwt_secret"),
];

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub appwrite: AppwriteConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    pub kafka: KafkaConfig,
    pub search: SearchConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppwriteConfig {
    pub endpoint: String,
    pub project_id: String,
    pub api_key: String,
    pub database_id: String,
    pub collections: CollectionIds,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectionIds {
    pub users: String,
    pub bookings: String,
    pub payments: String,
    pub saved_trip_plans: String,
}

impl Default for CollectionIds {
    fn default() -> Self {
        Self {
            users: "users".to_string(),
            bookings: "bookings".to_string(),
            payments: "payments".to_string(),
            saved_trip_plans: "saved_trip_plans".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Appwrite,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub json_fields: JsonFieldMode,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    Appwrite,
    Jwt,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RedisConfig {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: Option<String>,
    pub topic: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    pub cache_ttl_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProvidersConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub serpapi_api_key: Option<String>,
    pub google_maps_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_voice_id: String,
    pub whisper_model: String,
    pub whisper_binary: String,
    pub whisper_models_dir: String,
    pub ffmpeg_binary: String,
    pub http_timeout_seconds: u64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::from_vars(env::vars().collect())
    }

    /// Builds the layered configuration against an explicit variable set.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, config::ConfigError> {
        let run_mode = vars
            .get("RUN_MODE")
            .cloned()
            .unwrap_or_else(|| "development".into());

        let mut builder = config::Config::builder()
            .set_default("server.port", 5000)?
            .set_default("appwrite.endpoint", "https://cloud.appwrite.io/v1")?
            .set_default("appwrite.project_id", "")?
            .set_default("appwrite.api_key", "")?
            .set_default("appwrite.database_id", "")?
            .set_default("appwrite.collections.users", "users")?
            .set_default("appwrite.collections.bookings", "bookings")?
            .set_default("appwrite.collections.payments", "payments")?
            .set_default("appwrite.collections.saved_trip_plans", "saved_trip_plans")?
            .set_default("store.backend", "appwrite")?
            .set_default("store.json_fields", "serialized")?
            .set_default("auth.mode", "appwrite")?
            .set_default("kafka.topic", "voyage.events")?
            .set_default("search.cache_ttl_seconds", 300)?
            .set_default("providers.gemini_model", "gemini-1.5-flash")?
            .set_default("providers.elevenlabs_voice_id", "21m00Tcm4TlvDq8ikWAM")?
            .set_default("providers.whisper_model", "tiny")?
            .set_default("providers.whisper_binary", "whisper-cli")?
            .set_default("providers.whisper_models_dir", "models")?
            .set_default("providers.ffmpeg_binary", "ffmpeg")?
            .set_default("providers.http_timeout_seconds", 30)?
            // Optional files: default, then the run mode, then an uncommitted local one
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false));

        for (var, key) in ENV_OVERRIDES {
            let value = vars.get(*var).filter(|v| !v.trim().is_empty()).cloned();
            builder = builder.set_override_option(*key, value)?;
        }

        // Eg.. `VOYAGE__STORE__BACKEND=memory` sets `store.backend`
        let settings = builder
            .add_source(
                config::Environment::with_prefix("VOYAGE")
                    .separator("__")
                    .source(Some(vars.into_iter().collect())),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        let appwrite_needed =
            self.store.backend == StoreBackend::Appwrite || self.auth.mode == AuthMode::Appwrite;
        if appwrite_needed {
            let missing: Vec<&str> = [
                ("APPWRITE_ENDPOINT", &self.appwrite.endpoint),
                ("APPWRITE_PROJECT_ID", &self.appwrite.project_id),
            ]
            .into_iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| k)
            .collect();
            if !missing.is_empty() {
                return Err(config::ConfigError::Message(format!(
                    "missing required settings: {}",
                    missing.join(", ")
                )));
            }
        }
        if self.store.backend == StoreBackend::Appwrite
            && (self.appwrite.api_key.trim().is_empty() || self.appwrite.database_id.trim().is_empty())
        {
            return Err(config::ConfigError::Message(
                "APPWRITE_API_KEY and APPWRITE_DATABASE_ID are required for the appwrite store".into(),
            ));
        }
        if self.auth.mode == AuthMode::Jwt
            && self.auth.jwt_secret.as_deref().map_or(true, |s| s.trim().is_empty())
        {
            return Err(config::ConfigError::Message(
                "JWT_SECRET is required when auth.mode = jwt".into(),
            ));
        }
        Ok(())
    }
}
