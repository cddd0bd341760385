pub mod limiter;
pub mod mailer;
pub mod utils;
