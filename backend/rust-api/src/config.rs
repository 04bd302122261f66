use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mongo_uri: String,
    pub redis_uri: String,
    pub mongo_database: String,
    pub jwt_secret: String,
    pub generator_api_url: String,
    pub cookie: CookieConfig,
    pub leaderboard: LeaderboardConfig,
    pub certificate: CertificateConfig,
    pub notifications: NotificationsConfig,
    pub smtp: SmtpConfig,
    pub social: SocialConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    pub secure: bool,
    pub same_site: String,
}

impl CookieConfig {
    pub fn parse_same_site(&self) -> axum_extra::extract::cookie::SameSite {
        match self.same_site.to_lowercase().as_str() {
            "strict" => axum_extra::extract::cookie::SameSite::Strict,
            "none" => axum_extra::extract::cookie::SameSite::None,
            _ => axum_extra::extract::cookie::SameSite::Lax,
        }
    }
}

/// Leaderboard scoring parameters. The time normalization reference is a
/// named setting rather than a constant baked into the scorer.
#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardConfig {
    pub reference_time_seconds: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CertificateConfig {
    pub min_score: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    pub worker_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub login: String,
    pub password: String,
    pub from_name: String,
    pub from_email: String,
    pub use_tls: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SocialConfig {
    pub google_userinfo_url: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load environment variables from root .env file (two levels up)
        // Try root .env first, then fallback to local .env
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            // Fallback to current directory .env for backward compatibility
            dotenvy::dotenv().ok();
        }

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            // Load base config from TOML file
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| "mongodb://localhost:27017/sproutlearn".to_string());

        let redis_uri = settings
            .get_string("redis.uri")
            .or_else(|_| env::var("REDIS_URI"))
            .unwrap_or_else(|_| "redis://127.0.0.1:6379/0".to_string());

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "sproutlearn".to_string());

        let jwt_secret = settings
            .get_string("auth.jwt_secret")
            .or_else(|_| env::var("JWT_SECRET"))
            .unwrap_or_else(|_| {
                if env == "prod" {
                    panic!("FATAL: JWT_SECRET must be set in production!");
                }
                eprintln!("WARNING: Using default JWT_SECRET (dev mode only!)");
                "dev-secret-only-for-local-testing".to_string()
            });

        let generator_api_url = settings
            .get_string("generator.url")
            .or_else(|_| env::var("GENERATOR_API_URL"))
            .unwrap_or_else(|_| "http://localhost:8000".to_string());

        let cookie = CookieConfig {
            secure: settings
                .get_bool("cookie.secure")
                .unwrap_or(env == "prod"),
            same_site: settings
                .get_string("cookie.same_site")
                .unwrap_or_else(|_| "lax".to_string()),
        };

        let leaderboard = LeaderboardConfig {
            reference_time_seconds: settings
                .get_float("leaderboard.reference_time_seconds")
                .ok()
                .or_else(|| {
                    env::var("LEADERBOARD_REFERENCE_TIME_SECONDS")
                        .ok()
                        .and_then(|v| v.parse::<f64>().ok())
                })
                .unwrap_or(600.0),
        };

        let certificate = CertificateConfig {
            min_score: settings.get_float("certificate.min_score").unwrap_or(80.0),
        };

        let notifications = NotificationsConfig {
            worker_interval_secs: settings
                .get_int("notifications.worker_interval_secs")
                .map(|v| v.max(1) as u64)
                .unwrap_or(60),
        };

        let smtp = SmtpConfig {
            server: settings
                .get_string("smtp.server")
                .or_else(|_| env::var("SMTP_SERVER"))
                .unwrap_or_else(|_| "localhost".to_string()),
            port: settings
                .get_int("smtp.port")
                .ok()
                .and_then(|v| u16::try_from(v).ok())
                .unwrap_or(587),
            login: settings
                .get_string("smtp.login")
                .or_else(|_| env::var("SMTP_LOGIN"))
                .unwrap_or_default(),
            password: settings
                .get_string("smtp.password")
                .or_else(|_| env::var("SMTP_PASSWORD"))
                .unwrap_or_default(),
            from_name: settings
                .get_string("smtp.from_name")
                .unwrap_or_else(|_| "SproutLearn".to_string()),
            from_email: settings
                .get_string("smtp.from_email")
                .unwrap_or_else(|_| "noreply@sproutlearn.app".to_string()),
            use_tls: settings.get_bool("smtp.use_tls").unwrap_or(true),
        };

        let social = SocialConfig {
            google_userinfo_url: settings
                .get_string("social.google_userinfo_url")
                .unwrap_or_else(|_| {
                    "https://openidconnect.googleapis.com/v1/userinfo".to_string()
                }),
        };

        Ok(Config {
            mongo_uri,
            redis_uri,
            mongo_database,
            jwt_secret,
            generator_api_url,
            cookie,
            leaderboard,
            certificate,
            notifications,
            smtp,
            social,
        })
    }
}
