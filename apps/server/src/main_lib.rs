use std::sync::Arc;

use crate::config::Config;
use psyclinic_ai::{
    BedrockConfig, BedrockModel, LanguageModelTrait, SimulationConfig, SimulationService,
    UnconfiguredModel,
};
use psyclinic_core::{
    sessions::{
        InMemorySessionStore, RedisSessionStore, SessionService, SessionServiceTrait,
        SessionStoreTrait,
    },
    users::{CsvUserRepository, UserService, UserServiceTrait},
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub user_service: Arc<dyn UserServiceTrait>,
    pub session_service: Arc<dyn SessionServiceTrait>,
    pub simulation_service: Arc<SimulationService>,
    pub templates_dir: String,
    pub media_dir: String,
    pub cookie_secure: bool,
    pub admin_emails: Vec<String>,
}

impl AppState {
    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|admin| *admin == email)
    }
}

pub fn init_tracing() {
    let log_format = std::env::var("PSY_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Connect to Bedrock, or fall back to a backend that reports itself as not
/// ready so the rest of the app still serves.
async fn build_model(config: &Config) -> Arc<dyn LanguageModelTrait> {
    let bedrock_config = BedrockConfig {
        region: config.aws_region.clone(),
        model_id: config.model_id.clone(),
        ..Default::default()
    };
    match BedrockModel::connect(&bedrock_config).await {
        Ok(model) => Arc::new(model),
        Err(e) => {
            tracing::warn!("Language model unavailable: {}", e);
            Arc::new(UnconfiguredModel::new(e.to_string()))
        }
    }
}

/// Redis when configured and reachable, otherwise process memory.
async fn build_session_store(config: &Config) -> Arc<dyn SessionStoreTrait> {
    let Some(url) = config.redis_url.as_deref() else {
        tracing::info!("PSY_REDIS_URL not set; keeping sessions in memory");
        return Arc::new(InMemorySessionStore::new());
    };
    match RedisSessionStore::connect(url).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!("{}. Falling back to in-memory sessions", e);
            Arc::new(InMemorySessionStore::new())
        }
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let model = build_model(config).await;
    let session_store = build_session_store(config).await;
    assemble_state(config, model, SimulationConfig::default(), session_store)
}

/// In-memory sessions and the given model; used by tests and local runs.
pub fn build_state_with_model(
    config: &Config,
    model: Arc<dyn LanguageModelTrait>,
    simulation_config: SimulationConfig,
) -> anyhow::Result<Arc<AppState>> {
    assemble_state(
        config,
        model,
        simulation_config,
        Arc::new(InMemorySessionStore::new()),
    )
}

fn assemble_state(
    config: &Config,
    model: Arc<dyn LanguageModelTrait>,
    simulation_config: SimulationConfig,
    session_store: Arc<dyn SessionStoreTrait>,
) -> anyhow::Result<Arc<AppState>> {
    let user_repository = Arc::new(CsvUserRepository::new(&config.users_file)?);
    tracing::info!("User database in use: {}", config.users_file);
    let user_service: Arc<dyn UserServiceTrait> = Arc::new(UserService::new(user_repository));

    let session_service: Arc<dyn SessionServiceTrait> =
        Arc::new(SessionService::new(session_store, config.session_ttl_secs));

    let simulation_service = Arc::new(SimulationService::new(model, simulation_config));

    if config.admin_emails.is_empty() {
        tracing::warn!("PSY_ADMIN_EMAILS is empty; admin routes are disabled");
    }

    Ok(Arc::new(AppState {
        user_service,
        session_service,
        simulation_service,
        templates_dir: config.templates_dir.clone(),
        media_dir: config.media_dir.clone(),
        cookie_secure: config.cookie_secure,
        admin_emails: config.admin_emails.clone(),
    }))
}
