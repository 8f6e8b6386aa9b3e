//! Session cache key generation.

use secrecy::ExposeSecret;
use shopmate_client::session_cache::SessionCache;

/// Print a fresh base64 AES-256 key for `SHOPMATE_SESSION_CACHE_KEY`.
pub fn print_key() {
    let key = SessionCache::generate_key();

    #[allow(clippy::print_stdout)]
    {
        println!("{}", key.expose_secret());
    }
}
