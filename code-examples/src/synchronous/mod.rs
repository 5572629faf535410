use std::time::Duration;

use resilient_adapters::config::{AdapterConfig, ConfigOverrides};
use resilient_adapters::strategies::RetryStrategy::Linear;
use resilient_adapters::synchronous::retry;
use resilient_adapters::{AdapterManager, BoxError, RetryingSyncAdapter, SyncAdapter};

// Example 1: Using retry() with a simple failing operation
pub fn example_simple_retry() {
    let config = AdapterConfig::with_overrides(
        &ConfigOverrides::default().base_delay(Duration::from_millis(100)),
    );

    let mut attempt_count = 0;

    let result = retry("inventory sync", &config, |_| {
        attempt_count += 1;
        println!("Attempt #{}", attempt_count);

        // Fails twice before succeeding
        if attempt_count < 3 {
            Err("Temporary error".into())
        } else {
            Ok("Operation completed successfully")
        }
    });

    match result {
        Ok(success_msg) => println!("Success: {}", success_msg),
        Err(error) => println!("Failed after retries: {}", error),
    }
}

// Example 2: Linear backoff that runs out of attempts
pub fn example_linear_backoff() {
    let config = AdapterConfig::default()
        .with_backoff(Linear)
        .with_retries(4)
        .merge(&ConfigOverrides::default().base_delay(Duration::from_millis(50)));

    let result: Result<u32, _> = retry(&42, &config, |input| {
        println!("Processing {} with a growing delay", input);
        Err("upstream unavailable".into())
    });

    match result {
        Ok(value) => println!("Got value: {}", value),
        Err(error) => println!("Failed: {}", error),
    }
}

struct Uppercase;

impl SyncAdapter<String, String> for Uppercase {
    fn can_handle(&self, input: &String) -> Result<bool, BoxError> {
        Ok(input.is_ascii())
    }

    fn execute(&self, input: &String) -> Result<String, BoxError> {
        Ok(input.to_uppercase())
    }
}

struct Flaky;

impl SyncAdapter<String, String> for Flaky {
    fn can_handle(&self, _input: &String) -> Result<bool, BoxError> {
        Ok(true)
    }

    fn execute(&self, _input: &String) -> Result<String, BoxError> {
        Err("flaky adapter is down".into())
    }
}

// Example 3: Falling back across adapters by priority
pub fn example_manager_fallback() {
    let mut manager: AdapterManager<String, String> = AdapterManager::new();

    let fast_config = AdapterConfig::default()
        .with_priority(10)
        .with_retries(2)
        .merge(&ConfigOverrides::default().base_delay(Duration::from_millis(10)));
    manager.register_sync(RetryingSyncAdapter::new(Flaky, fast_config));
    manager.register_sync(Uppercase);

    match manager.execute_sync(&"hello adapters".to_string()) {
        Ok(output) => println!("Handled: {}", output),
        Err(error) => println!("No adapter could handle it: {}", error),
    }
}
