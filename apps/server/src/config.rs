use std::{net::SocketAddr, time::Duration};

use psyclinic_ai::constants::DEFAULT_MODEL_ID;
use psyclinic_core::constants::DEFAULT_SESSION_TTL_SECS;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub users_file: String,
    pub templates_dir: String,
    pub static_dir: String,
    /// Directory holding the avatar videos.
    pub media_dir: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    /// Cap for `/generate_report`, which runs one feedback call per turn.
    pub report_timeout: Duration,
    pub session_ttl_secs: i64,
    pub session_purge_interval: Duration,
    /// Shared session store; sessions stay in memory when unset or unreachable.
    pub redis_url: Option<String>,
    pub cookie_secure: bool,
    /// Lower-cased emails allowed on the admin routes.
    pub admin_emails: Vec<String>,
    pub model_id: String,
    pub aws_region: Option<String>,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = env_or("PSY_LISTEN_ADDR", "0.0.0.0:8000")
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8000)));
        let users_file = env_or("PSY_USERS_FILE", "users.csv");
        let templates_dir = env_or("PSY_TEMPLATES_DIR", "templates");
        let static_dir = env_or("PSY_STATIC_DIR", "static");
        let media_dir = std::env::var("PSY_MEDIA_DIR").unwrap_or_else(|_| templates_dir.clone());
        let cors_allow = parse_list(&env_or("PSY_CORS_ALLOW_ORIGINS", "*"));
        let timeout_ms: u64 = env_or("PSY_REQUEST_TIMEOUT_MS", "180000")
            .parse()
            .unwrap_or(180_000);
        let report_timeout_ms: u64 = env_or("PSY_REPORT_TIMEOUT_MS", "900000")
            .parse()
            .unwrap_or(900_000);
        let session_ttl_secs: i64 = std::env::var("PSY_SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|ttl| *ttl > 0)
            .unwrap_or(DEFAULT_SESSION_TTL_SECS);
        let purge_secs: u64 = env_or("PSY_SESSION_PURGE_SECS", "600")
            .parse()
            .unwrap_or(600);
        let redis_url = std::env::var("PSY_REDIS_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let cookie_secure = !matches!(
            env_or("PSY_COOKIE_SECURE", "true").to_lowercase().as_str(),
            "false" | "0" | "no"
        );
        let admin_emails = parse_list(&env_or("PSY_ADMIN_EMAILS", ""))
            .into_iter()
            .map(|email| email.to_lowercase())
            .collect();
        let model_id = env_or("PSY_MODEL_ID", DEFAULT_MODEL_ID);
        let aws_region = std::env::var("AWS_REGION")
            .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
            .ok()
            .filter(|r| !r.trim().is_empty());

        Self {
            listen_addr,
            users_file,
            templates_dir,
            static_dir,
            media_dir,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            report_timeout: Duration::from_millis(report_timeout_ms.max(timeout_ms)),
            session_ttl_secs,
            session_purge_interval: Duration::from_secs(purge_secs.max(1)),
            redis_url,
            cookie_secure,
            admin_emails,
            model_id,
            aws_region,
        }
    }
}
