use rocket::figment::{Figment, providers::{Env, Format, Toml}};
use rocket::Config as RocketConfig;
use std::env;
use std::time::Duration;

use crate::models::Currency;

pub struct Config;

impl Config {
    fn figment() -> Figment {
        // Get the current profile
        let profile = env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());

        Figment::from(RocketConfig::default())
            .merge(Toml::file("Rocket.toml").nested())
            .select(&profile)
            .merge(Env::prefixed("ROCKET_"))
    }

    pub fn mongodb_uri() -> String {
        Self::figment()
            .extract_inner("mongodb_uri")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
    }

    pub fn mongodb_database() -> String {
        Self::figment()
            .extract_inner("mongodb_database")
            .unwrap_or_else(|_| "freelance-marketplace".to_string())
    }

    pub fn exchange_rate_url() -> String {
        Self::figment()
            .extract_inner("exchange_rate_url")
            .unwrap_or_else(|_| "https://open.er-api.com/v6/latest/USD".to_string())
    }

    pub fn exchange_rate_base() -> Currency {
        Self::figment()
            .extract_inner::<String>("exchange_rate_base")
            .ok()
            .and_then(|code| code.parse().ok())
            .unwrap_or(Currency::Usd)
    }

    /// INR per USD used whenever the rate provider has never answered.
    pub fn fallback_usd_inr_rate() -> f64 {
        Self::figment()
            .extract_inner("fallback_usd_inr_rate")
            .unwrap_or(83.0)
    }

    pub fn rate_refresh_interval() -> Duration {
        let secs: u64 = Self::figment()
            .extract_inner("rate_refresh_secs")
            .unwrap_or(3600);
        Duration::from_secs(secs.max(60))
    }

    pub fn upstream_timeout() -> Duration {
        let millis: u64 = Self::figment()
            .extract_inner("upstream_timeout_ms")
            .unwrap_or(5000);
        Duration::from_millis(millis)
    }

    pub fn display_currency() -> Currency {
        Self::figment()
            .extract_inner::<String>("display_currency")
            .ok()
            .and_then(|code| code.parse().ok())
            .unwrap_or(Currency::Usd)
    }

    pub fn default_page_size() -> u32 {
        Self::figment()
            .extract_inner("default_page_size")
            .unwrap_or(10)
    }

    pub fn max_page_size() -> u32 {
        Self::figment()
            .extract_inner("max_page_size")
            .unwrap_or(100)
    }

    /// Upper bound on tracked dashboard sessions and review submissions.
    pub fn session_capacity() -> usize {
        Self::figment()
            .extract_inner("session_capacity")
            .unwrap_or(10_000)
    }

    pub fn is_development() -> bool {
        let profile = env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());
        profile == "development"
    }
}
