use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voyage_api::middleware::{AppwriteSessionVerifier, JwtSessionVerifier};
use voyage_api::{app, AppState, Providers};
use voyage_assist::{ElevenLabsClient, GeminiClient, MapsGeocoder, SerpApiClient, WhisperTranscriber};
use voyage_core::events::EventSink;
use voyage_core::identity::SessionVerifier;
use voyage_store::app_config::{AuthMode, Config, StoreBackend};
use voyage_store::{
    AppwriteClient, DocumentRepositories, DocumentStore, MemoryDocumentStore, RedisClient, TracingEventSink,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voyage_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Voyage API on port {}", config.server.port);

    // Document store
    let store: Arc<dyn DocumentStore> = match config.store.backend {
        StoreBackend::Appwrite => Arc::new(AppwriteClient::new(&config.appwrite)?),
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Arc::new(MemoryDocumentStore::new())
        }
    };
    let repos = Arc::new(DocumentRepositories::new(
        store,
        config.appwrite.collections.clone(),
        config.store.json_fields,
    ));

    // Session verification
    let verifier: Arc<dyn SessionVerifier> = match config.auth.mode {
        AuthMode::Appwrite => Arc::new(AppwriteSessionVerifier::new(AppwriteClient::new(&config.appwrite)?)),
        AuthMode::Jwt => {
            let secret = config.auth.jwt_secret.as_deref().unwrap_or_default();
            Arc::new(JwtSessionVerifier::new(secret))
        }
    };

    let state = AppState::new(repos, event_sink(&config)?, verifier, providers(&config)?);
    let state = match config.redis.url.as_deref() {
        Some(url) => {
            let redis = RedisClient::new(url).await.context("Failed to connect to Redis")?;
            state.with_search_cache(Arc::new(redis), config.search.cache_ttl_seconds)
        }
        None => {
            tracing::info!("REDIS_URL not set; rate limiting and search caching are off");
            state
        }
    };

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

fn providers(config: &Config) -> anyhow::Result<Providers> {
    let p = &config.providers;
    let timeout = Duration::from_secs(p.http_timeout_seconds);

    let gemini = Arc::new(GeminiClient::new(p.gemini_api_key.clone(), &p.gemini_model, timeout)?);
    let serpapi = Arc::new(SerpApiClient::new(p.serpapi_api_key.clone(), timeout)?);

    Ok(Providers {
        chat: gemini.clone(),
        translator: gemini,
        flights: serpapi.clone(),
        hotels: serpapi,
        geocoder: Arc::new(MapsGeocoder::new(p.google_maps_api_key.clone(), timeout)?),
        speech: Arc::new(ElevenLabsClient::new(
            p.elevenlabs_api_key.clone(),
            &p.elevenlabs_voice_id,
            timeout,
        )?),
        transcriber: Arc::new(WhisperTranscriber::new(
            &p.whisper_binary,
            &p.whisper_model,
            &p.whisper_models_dir,
        )
        .with_ffmpeg(&p.ffmpeg_binary)),
    })
}

#[cfg(feature = "kafka")]
fn event_sink(config: &Config) -> anyhow::Result<Arc<dyn EventSink>> {
    match config.kafka.brokers.as_deref() {
        Some(brokers) => {
            let producer = voyage_store::events::EventProducer::new(brokers, &config.kafka.topic)
                .context("Failed to create Kafka producer")?;
            Ok(Arc::new(producer))
        }
        None => Ok(Arc::new(TracingEventSink)),
    }
}

#[cfg(not(feature = "kafka"))]
fn event_sink(_config: &Config) -> anyhow::Result<Arc<dyn EventSink>> {
    Ok(Arc::new(TracingEventSink))
}
