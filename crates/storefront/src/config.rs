//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `REWEAR_BASE_URL` - Public URL for the storefront
//! - `REWEAR_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `SUPABASE_URL` - Hosted backend project URL (e.g., <https://xyz.supabase.co>)
//! - `SUPABASE_ANON_KEY` - Hosted backend anonymous API key
//! - `RAZORPAY_KEY_ID` - Razorpay key id (safe to expose to the browser)
//!
//! ## Optional
//! - `REWEAR_HOST` - Bind address (default: 127.0.0.1)
//! - `REWEAR_PORT` - Listen port (default: 3000)
//! - `RAZORPAY_CURRENCY` - ISO 4217 currency for orders (default: INR)
//! - `RAZORPAY_THEME_COLOR` - Checkout widget accent color (default: #6366F1)
//! - `REWEAR_DELIVERY_FEE` - Flat delivery fee added to every quote
//! - `REWEAR_SERVICE_FEE_RATE` - Service fee as a fraction of the subtotal (e.g., 0.05)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use rewear_core::CurrencyCode;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Hosted backend (database/auth/storage/functions) configuration
    pub supabase: SupabaseConfig,
    /// Payment gateway configuration
    pub razorpay: RazorpayConfig,
    /// Optional checkout fee schedule
    pub fees: Option<FeeConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Hosted backend configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL (e.g., <https://xyz.supabase.co>)
    pub url: Url,
    /// Anonymous API key; row-level security applies on the remote side
    pub anon_key: SecretString,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

/// Razorpay checkout configuration.
///
/// Only the public key id lives here; the API secret stays with the remote
/// payment functions and never reaches this binary.
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    /// Key id passed to the checkout widget (public)
    pub key_id: String,
    /// Currency for payment orders
    pub currency: CurrencyCode,
    /// Accent color for the checkout widget
    pub theme_color: String,
}

/// Optional flat/percentage fees applied to checkout quotes.
#[derive(Debug, Clone, Copy)]
pub struct FeeConfig {
    /// Flat delivery fee added to the grand total
    pub delivery_fee: Decimal,
    /// Service fee as a fraction of the subtotal (0.05 = 5%)
    pub service_fee_rate: Decimal,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("REWEAR_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("REWEAR_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("REWEAR_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("REWEAR_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("REWEAR_BASE_URL")?;
        let session_secret = get_validated_secret("REWEAR_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "REWEAR_SESSION_SECRET")?;

        let supabase = SupabaseConfig::from_env()?;
        let razorpay = RazorpayConfig::from_env()?;
        let fees = FeeConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            base_url,
            session_secret,
            supabase,
            razorpay,
            fees,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SupabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = get_required_env("SUPABASE_URL")?
            .parse::<Url>()
            .map_err(|e| ConfigError::InvalidEnvVar("SUPABASE_URL".to_string(), e.to_string()))?;

        Ok(Self {
            url,
            anon_key: get_validated_secret("SUPABASE_ANON_KEY")?,
        })
    }
}

impl RazorpayConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let currency = get_env_or_default("RAZORPAY_CURRENCY", "INR")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("RAZORPAY_CURRENCY".to_string(), e))?;

        Ok(Self {
            key_id: get_required_env("RAZORPAY_KEY_ID")?,
            currency,
            theme_color: get_env_or_default("RAZORPAY_THEME_COLOR", "#6366F1"),
        })
    }
}

impl FeeConfig {
    /// Load the fee schedule, if any fee variable is set.
    ///
    /// With neither variable present the storefront quotes plain
    /// subtotal + deposit, which matches the dated-checkout pricing policy.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let delivery = get_optional_env("REWEAR_DELIVERY_FEE");
        let rate = get_optional_env("REWEAR_SERVICE_FEE_RATE");

        if delivery.is_none() && rate.is_none() {
            return Ok(None);
        }

        let delivery_fee = parse_decimal_env("REWEAR_DELIVERY_FEE", delivery.as_deref())?;
        let service_fee_rate = parse_decimal_env("REWEAR_SERVICE_FEE_RATE", rate.as_deref())?;

        Ok(Some(Self {
            delivery_fee,
            service_fee_rate,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional decimal variable, defaulting to zero when absent.
fn parse_decimal_env(key: &str, value: Option<&str>) -> Result<Decimal, ConfigError> {
    value.map_or(Ok(Decimal::ZERO), |raw| {
        raw.parse::<Decimal>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_err());
    }

    #[test]
    fn test_validate_session_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_ok());
    }

    #[test]
    fn test_parse_decimal_env() {
        assert_eq!(parse_decimal_env("FEE", None).unwrap(), Decimal::ZERO);
        assert_eq!(
            parse_decimal_env("FEE", Some("49.50")).unwrap(),
            Decimal::new(4950, 2)
        );
        assert!(parse_decimal_env("FEE", Some("cheap")).is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            supabase: SupabaseConfig {
                url: "https://project.supabase.co".parse().unwrap(),
                anon_key: SecretString::from("anon"),
            },
            razorpay: RazorpayConfig {
                key_id: "rzp_test_k3y".to_string(),
                currency: CurrencyCode::INR,
                theme_color: "#6366F1".to_string(),
            },
            fees: None,
            sentry_dsn: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_supabase_config_debug_redacts_key() {
        let config = SupabaseConfig {
            url: "https://project.supabase.co".parse().unwrap(),
            anon_key: SecretString::from("very_private_anon_key"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("project.supabase.co"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("very_private_anon_key"));
    }
}
