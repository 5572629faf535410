use std::time::Duration;

/// Defines the backoff strategy to use when scheduling retry attempts.
///
/// This enum specifies how delays between retries are calculated from a base unit
/// (one second unless configured otherwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryStrategy {
    /// A linear strategy where the delay grows by one base unit per attempt.
    ///
    /// For example, with a base delay of 1 second, retries wait 1s, 2s, 3s, etc.
    Linear,
    /// An exponential backoff strategy where the delay doubles with each attempt.
    ///
    /// For example, with a base delay of 1 second, retries wait 1s, 2s, 4s, 8s, etc.
    #[default]
    ExponentialBackoff,
}

impl RetryStrategy {
    /// Calculates the delay to wait after the failed attempt `attempt` (0-indexed).
    ///
    /// - `Linear`: `base_delay * (attempt + 1)`
    /// - `ExponentialBackoff`: `base_delay * 2^attempt`
    ///
    /// Both computations saturate instead of overflowing.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use resilient_adapters::strategies::RetryStrategy;
    ///
    /// let base = Duration::from_millis(1000);
    /// assert_eq!(RetryStrategy::ExponentialBackoff.calculate_delay(base, 2), Duration::from_millis(4000));
    /// assert_eq!(RetryStrategy::Linear.calculate_delay(base, 2), Duration::from_millis(3000));
    /// ```
    pub fn calculate_delay(&self, base_delay: Duration, attempt: usize) -> Duration {
        let attempt = u32::try_from(attempt).unwrap_or(u32::MAX);
        match self {
            RetryStrategy::Linear => base_delay.saturating_mul(attempt.saturating_add(1)),
            RetryStrategy::ExponentialBackoff => {
                base_delay.saturating_mul(2u32.saturating_pow(attempt))
            }
        }
    }
}
