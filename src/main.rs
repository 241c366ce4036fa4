use std::sync::Arc;

use dotenvy::dotenv;
use gigledger::config::Config;
use gigledger::engine::{Engine, EngineSettings};
use gigledger::services::{ExchangeRateService, exchange_rate};
use gigledger::store::MongoStore;
use log::info;
use rocket::{Build, Rocket};

/* ----------------------------- LAUNCH ----------------------------- */

#[rocket::launch]
async fn rocket() -> Rocket<Build> {
    dotenv().ok();
    env_logger::init();

    let database = gigledger::db::init().await;
    let rates = Arc::new(ExchangeRateService::from_config());
    let settings = EngineSettings::from_config();

    info!(
        "🚀 Freelance ledger API running (display currency {}, development: {})",
        settings.currency,
        Config::is_development()
    );
    info!("📚 Swagger UI → http://localhost:8000/api/docs");

    let engine = Engine::new(Arc::new(MongoStore::new(database)), rates.clone(), settings);

    gigledger::build(engine).attach(exchange_rate::refresher(rates, Config::rate_refresh_interval()))
}
