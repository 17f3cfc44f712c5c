//! State nonce generation.
//!
//! A nonce is 12 random bytes, hex-encoded to 24 lowercase characters. The
//! randomness source is injected through [`NonceGenerator`] and chosen with
//! [`NonceStrategy`] in the configuration:
//!
//! - [`SecureNonceGenerator`] reads the operating system CSPRNG and, if that
//!   source is unavailable, falls back to [`BestEffortNonceGenerator`] rather
//!   than failing the request. The fallback keeps logins available but weakens
//!   the anti-CSRF guarantee of the nonce, so it is logged at `warn`.
//! - [`BestEffortNonceGenerator`] never touches the OS source. It seeds a
//!   `StdRng` from the clock and a process-wide counter, since `thread_rng`
//!   itself seeds from the OS and would panic when that source is down.
//! - Tests inject a deterministic generator via [`NonceStrategy::Custom`].
//!
//! # Example
//!
//! ```rust
//! use shopify_oauth::auth::oauth::{NonceGenerator, SecureNonceGenerator};
//!
//! let nonce = SecureNonceGenerator::new().generate();
//! assert_eq!(nonce.len(), 24);
//! assert!(nonce.chars().all(|c| c.is_ascii_hexdigit()));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};

/// Number of random bytes in a nonce.
pub const NONCE_BYTES: usize = 12;

/// A source of state nonces.
pub trait NonceGenerator: Send + Sync {
    /// Returns a fresh nonce.
    fn generate(&self) -> String;
}

/// Nonces from a cryptographic source, with a best-effort fallback.
///
/// The source defaults to [`OsRng`]. Any [`RngCore`] can be supplied with
/// [`with_source`](Self::with_source); a source whose `try_fill_bytes` fails
/// makes the generator fall back to [`BestEffortNonceGenerator`].
#[derive(Debug, Default)]
pub struct SecureNonceGenerator<R = OsRng> {
    source: Mutex<R>,
}

impl SecureNonceGenerator {
    /// Creates a generator reading the operating system CSPRNG.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_source(OsRng)
    }
}

impl<R> SecureNonceGenerator<R> {
    /// Creates a generator reading `source`.
    #[must_use]
    pub const fn with_source(source: R) -> Self {
        Self {
            source: Mutex::new(source),
        }
    }
}

impl<R: RngCore + Send> NonceGenerator for SecureNonceGenerator<R> {
    fn generate(&self) -> String {
        let mut bytes = [0u8; NONCE_BYTES];
        let filled = self
            .source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_fill_bytes(&mut bytes);

        match filled {
            Ok(()) => hex::encode(bytes),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Secure random source unavailable, falling back to best-effort nonce"
                );
                BestEffortNonceGenerator.generate()
            }
        }
    }
}

/// Nonces from a PRNG seeded with the clock and a process-wide counter.
///
/// Not suitable as a primary source: the seed is guessable.
#[derive(Clone, Copy, Debug, Default)]
pub struct BestEffortNonceGenerator;

static BEST_EFFORT_COUNTER: AtomicU64 = AtomicU64::new(0);

impl NonceGenerator for BestEffortNonceGenerator {
    fn generate(&self) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_nanos());
        let counter = BEST_EFFORT_COUNTER.fetch_add(1, Ordering::Relaxed);
        #[allow(clippy::cast_possible_truncation)] // only the low bits matter for seeding
        let seed = (nanos as u64) ^ counter.rotate_left(32);

        let mut bytes = [0u8; NONCE_BYTES];
        StdRng::seed_from_u64(seed).fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// Which nonce source the flow uses.
#[derive(Clone, Default)]
pub enum NonceStrategy {
    /// OS CSPRNG with best-effort fallback.
    #[default]
    Secure,
    /// Best-effort PRNG only.
    BestEffort,
    /// A caller-supplied generator.
    Custom(Arc<dyn NonceGenerator>),
}

impl NonceStrategy {
    /// Returns the generator implementing this strategy.
    #[must_use]
    pub fn generator(&self) -> Arc<dyn NonceGenerator> {
        match self {
            Self::Secure => Arc::new(SecureNonceGenerator::new()),
            Self::BestEffort => Arc::new(BestEffortNonceGenerator),
            Self::Custom(generator) => Arc::clone(generator),
        }
    }
}

impl fmt::Debug for NonceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secure => f.write_str("Secure"),
            Self::BestEffort => f.write_str("BestEffort"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
