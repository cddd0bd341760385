use chrono::Utc;
use rand::Rng;

const SUFFIX_LEN: usize = 6;
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Builds a reference code like `GEONIX-20260805-7QK2ZD`.
///
/// Tickets are labels for humans, not security tokens or primary keys:
/// uniqueness is probabilistic and `thread_rng` is deliberately not a
/// cryptographic source.
pub fn generate(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();

    format!("{}-{}-{}", prefix, Utc::now().format("%Y%m%d"), suffix)
}
