use std::sync::Arc;

mod domain;
mod infrastructure;
mod interfaces;

pub mod constants;
pub mod errors;
pub mod graceful_shutdown;
pub mod settings;

pub use domain::{entities, use_cases};
pub use infrastructure::{limiter, mailer, utils};
pub use interfaces::{handlers, routes};

use constants::{RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_SWEEP_INTERVAL, RATE_LIMIT_WINDOW};
use limiter::rate_limiter::RateLimiterStore;
use mailer::Mailer;
use settings::AppConfig;
use use_cases::contact::ContactHandler;

pub struct AppState {
    pub contact_handler: ContactHandler,
    pub mailer: Arc<dyn Mailer>,
    pub config: AppConfig,
}

impl AppState {
    /// Must be called from within a tokio runtime; the rate limiter
    /// spawns its sweeper task here.
    pub fn new(config: &AppConfig, mailer: Arc<dyn Mailer>) -> Self {
        let limiter = RateLimiterStore::new(RATE_LIMIT_WINDOW, RATE_LIMIT_MAX_REQUESTS);
        limiter.spawn_sweeper(RATE_LIMIT_SWEEP_INTERVAL);

        AppState {
            contact_handler: ContactHandler::new(mailer.clone(), limiter, config.mail.clone()),
            mailer,
            config: config.clone(),
        }
    }
}
