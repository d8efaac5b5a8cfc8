use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::{Result, TranslatorError};

/// Maps the zero-based retry number to the wait before that retry.
pub type RepetitionsDelay = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

/// How many times a failed attempt may be repeated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Repetitions {
    /// At most `n` retries after the initial attempt.
    Limited(u32),
    /// Retry until success or a non-retryable failure.
    Unlimited,
}

impl Repetitions {
    /// Converts the `-1 = unlimited` integer convention.
    pub fn from_sentinel(value: i32) -> Result<Self> {
        match value {
            -1 => Ok(Self::Unlimited),
            n if n >= 0 => Ok(Self::Limited(n as u32)),
            n => Err(TranslatorError::Config(format!(
                "repetitions must be -1 (unlimited) or non-negative, got {n}"
            ))),
        }
    }

    /// Whether retry number `attempt` (zero-based) may run.
    pub fn allows(self, attempt: u32) -> bool {
        match self {
            Self::Limited(max) => attempt < max,
            Self::Unlimited => true,
        }
    }
}

/// Configures timeout, retry, and post-processing behavior.
///
/// Built once and shared read-only by every call of a translator.
#[derive(Clone)]
pub struct ClientOptions {
    timeout: Duration,
    repetitions: Repetitions,
    repetitions_delay: RepetitionsDelay,
    post_processing: bool,
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("timeout", &self.timeout)
            .field("repetitions", &self.repetitions)
            .field("repetitions_delay", &"<fn>")
            .field("post_processing", &self.post_processing)
            .finish()
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            repetitions: Repetitions::Limited(3),
            repetitions_delay: Arc::new(default_repetitions_delay),
            post_processing: true,
        }
    }
}

/// `3000 ms + 5000 ms * retry_number`.
pub fn default_repetitions_delay(retry_number: u32) -> Duration {
    Duration::from_millis(3_000 + 5_000 * u64::from(retry_number))
}

impl ClientOptions {
    /// Creates options from explicit values.
    ///
    /// Fails with [`TranslatorError::Config`] when `timeout` is zero.
    pub fn new<F>(
        timeout: Duration,
        repetitions: Repetitions,
        repetitions_delay: F,
        post_processing: bool,
    ) -> Result<Self>
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        if timeout.is_zero() {
            return Err(TranslatorError::Config(
                "timeout must be greater than zero".to_owned(),
            ));
        }
        Ok(Self {
            timeout,
            repetitions,
            repetitions_delay: Arc::new(repetitions_delay),
            post_processing,
        })
    }

    /// Reads options from the environment, falling back to defaults.
    ///
    /// Reads:
    /// - `DEEPL_TIMEOUT_MS`: per-attempt timeout in milliseconds
    /// - `DEEPL_REPETITIONS`: retry count, `-1` for unlimited
    /// - `DEEPL_POST_PROCESSING`: `true`/`false`/`1`/`0`
    ///
    /// The repetitions delay always uses [`default_repetitions_delay`].
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let timeout = match env_value("DEEPL_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(raw.parse::<u64>().map_err(|err| {
                TranslatorError::Config(format!("invalid DEEPL_TIMEOUT_MS '{raw}': {err}"))
            })?),
            None => defaults.timeout,
        };

        let repetitions = match env_value("DEEPL_REPETITIONS") {
            Some(raw) => Repetitions::from_sentinel(raw.parse::<i32>().map_err(|err| {
                TranslatorError::Config(format!("invalid DEEPL_REPETITIONS '{raw}': {err}"))
            })?)?,
            None => defaults.repetitions,
        };

        let post_processing = match env_value("DEEPL_POST_PROCESSING") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                TranslatorError::Config(format!("invalid DEEPL_POST_PROCESSING '{raw}'"))
            })?,
            None => defaults.post_processing,
        };

        Self::new(timeout, repetitions, default_repetitions_delay, post_processing)
    }

    /// Per-attempt wall-clock budget covering dispatch and result polling.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn repetitions(&self) -> Repetitions {
        self.repetitions
    }

    /// Wait before retry number `attempt` (zero-based).
    pub fn repetitions_delay(&self, attempt: u32) -> Duration {
        (self.repetitions_delay)(attempt)
    }

    /// Whether extracted text is trimmed and its whitespace collapsed.
    pub fn post_processing(&self) -> bool {
        self.post_processing
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_documented_schedule() {
        let options = ClientOptions::default();
        assert_eq!(options.timeout(), Duration::from_secs(10));
        assert_eq!(options.repetitions(), Repetitions::Limited(3));
        assert!(options.post_processing());
        assert_eq!(options.repetitions_delay(0), Duration::from_millis(3_000));
        assert_eq!(options.repetitions_delay(2), Duration::from_millis(13_000));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ClientOptions::new(Duration::ZERO, Repetitions::Limited(0), |_| Duration::ZERO, false)
            .expect_err("zero timeout must be rejected");
        assert!(matches!(err, TranslatorError::Config(_)));
    }

    #[test]
    fn sentinel_maps_minus_one_to_unlimited() {
        assert_eq!(Repetitions::from_sentinel(-1).unwrap(), Repetitions::Unlimited);
        assert_eq!(Repetitions::from_sentinel(0).unwrap(), Repetitions::Limited(0));
        assert_eq!(Repetitions::from_sentinel(5).unwrap(), Repetitions::Limited(5));
        assert!(Repetitions::from_sentinel(-2).is_err());
    }

    #[test]
    fn limited_allows_exactly_n_retries() {
        let repetitions = Repetitions::Limited(2);
        assert!(repetitions.allows(0));
        assert!(repetitions.allows(1));
        assert!(!repetitions.allows(2));
        assert!(!Repetitions::Limited(0).allows(0));
        assert!(Repetitions::Unlimited.allows(u32::MAX));
    }

    #[test]
    fn custom_delay_function_is_used() {
        let options = ClientOptions::new(
            Duration::from_secs(1),
            Repetitions::Unlimited,
            |attempt| Duration::from_millis(100 << attempt),
            false,
        )
        .unwrap();
        assert_eq!(options.repetitions_delay(3), Duration::from_millis(800));
        assert!(!options.post_processing());
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn debug_hides_delay_function() {
        let debug = format!("{:?}", ClientOptions::default());
        assert!(debug.contains("<fn>"));
    }
}
