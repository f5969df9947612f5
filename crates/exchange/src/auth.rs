use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::ExchangeError;

type HmacSha512 = Hmac<Sha512>;

/// Signs a private REST request per Kraken's documented scheme:
/// `HMAC-SHA512(secret, path + SHA256(nonce + postdata))`, base64-encoded.
/// `api_secret_base64` is the user's API secret as issued, base64-encoded.
pub fn sign_request(api_secret_base64: &str, path: &str, nonce: i64, post_data: &str) -> Result<String, ExchangeError> {
    let secret = STANDARD
        .decode(api_secret_base64)
        .map_err(|e| ExchangeError::Auth(format!("invalid base64 API secret: {e}")))?;

    let mut pre_hash = Sha256::new();
    pre_hash.update(nonce.to_string().as_bytes());
    pre_hash.update(post_data.as_bytes());
    let hashed = pre_hash.finalize();

    let mut mac =
        HmacSha512::new_from_slice(&secret).map_err(|e| ExchangeError::Auth(format!("invalid HMAC key: {e}")))?;
    mac.update(path.as_bytes());
    mac.update(&hashed);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Strictly-increasing nonce source, one per API key. The venue rejects any
/// nonce that does not exceed the previous one, so a process restart or
/// clock skew must never cause a decrease — `next()` always returns at
/// least `last + 1` regardless of wall-clock time.
pub struct NonceGenerator {
    last: AtomicI64,
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl NonceGenerator {
    pub fn new() -> Self {
        Self { last: AtomicI64::new(0) }
    }

    pub fn next(&self, now_millis: i64) -> i64 {
        loop {
            let prev = self.last.load(Ordering::SeqCst);
            let candidate = now_millis.max(prev + 1);
            if self.last.compare_exchange(prev, candidate, Ordering::SeqCst, Ordering::SeqCst).is_ok() {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonces_strictly_increase_even_with_repeated_timestamps() {
        let gen = NonceGenerator::new();
        let first = gen.next(1_000);
        let second = gen.next(1_000);
        let third = gen.next(500);
        assert!(second > first);
        assert!(third > second);
    }

    #[test]
    fn signing_is_deterministic_for_the_same_inputs() {
        let secret = STANDARD.encode(b"0123456789abcdef0123456789abcdef");
        let a = sign_request(&secret, "/0/private/AddOrder", 42, "nonce=42&pair=XBTUSD").unwrap();
        let b = sign_request(&secret, "/0/private/AddOrder", 42, "nonce=42&pair=XBTUSD").unwrap();
        assert_eq!(a, b);
    }
}
