//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::{
    AppConfig, AppSettings, CacheConfig, CatalogConfig, DiscordConfig, FaqConfig, QueryConfig,
    TcgPlayerConfig,
};
use crate::common::errors::{BotError, Result};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. TCGPLAYER_* environment variables (credentials)
/// 2. Environment variables (prefixed with APP__, e.g. APP__CACHE__FRESHNESS_HOURS)
/// 3. Configuration file (TOML format)
/// 4. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| BotError::Configuration(e.to_string()))?;

    let mut app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| BotError::Configuration(e.to_string()))?;

    apply_credential_env(&mut app_config.tcgplayer);
    if app_config.discord.bot_token.is_none() {
        app_config.discord.bot_token = std::env::var("DISCORD_BOT_TOKEN").ok();
    }

    app_config.validate()?;
    Ok(app_config)
}

/// Load configuration from environment variables only
pub fn load_from_env() -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let mut tcgplayer = TcgPlayerConfig::default();
    if let Ok(url) = std::env::var("TCGPLAYER_BASE_URL") {
        tcgplayer.base_url = url;
    }
    if let Some(size) = parse_env("TCGPLAYER_BATCH_SIZE") {
        tcgplayer.batch_size = size;
    }
    apply_credential_env(&mut tcgplayer);

    let catalog = CatalogConfig {
        path: std::env::var("CATALOG_PATH").unwrap_or_else(|_| CatalogConfig::default().path),
    };

    let cache = CacheConfig {
        freshness_hours: parse_env("CACHE_FRESHNESS_HOURS")
            .unwrap_or_else(|| CacheConfig::default().freshness_hours),
    };

    let query = QueryConfig {
        max_results: parse_env("QUERY_MAX_RESULTS")
            .unwrap_or_else(|| QueryConfig::default().max_results),
    };

    let config = AppConfig {
        discord: DiscordConfig {
            bot_token: std::env::var("DISCORD_BOT_TOKEN").ok(),
        },
        tcgplayer,
        catalog,
        faq: FaqConfig::default(),
        cache,
        query,
        settings: AppSettings::default(),
    };

    config.validate()?;
    Ok(config)
}

fn apply_credential_env(tcgplayer: &mut TcgPlayerConfig) {
    if let Ok(key) = std::env::var("TCGPLAYER_PUBLIC_KEY") {
        tcgplayer.public_key = Some(key);
    }
    if let Ok(key) = std::env::var("TCGPLAYER_PRIVATE_KEY") {
        tcgplayer.private_key = Some(key);
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
