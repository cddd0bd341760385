use std::time::Duration;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Fixed rate-limit window per client address.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_millis(60_000);
pub const RATE_LIMIT_MAX_REQUESTS: u32 = 3;
pub const RATE_LIMIT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

pub const NAME_MAX_CHARS: usize = 80;
pub const COMPANY_MAX_CHARS: usize = 120;
pub const WEBSITE_MAX_CHARS: usize = 200;
pub const PHONE_MAX_CHARS: usize = 80;
pub const MESSAGE_MAX_CHARS: usize = 5000;

pub const TICKET_PREFIX: &str = "GEONIX";

/// The acknowledgement mail quotes at most this many characters of the
/// original message.
pub const ACK_SUMMARY_CHARS: usize = 220;
