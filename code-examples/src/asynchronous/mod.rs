use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use resilient_adapters::config::{AdapterConfig, ConfigOverrides};
use resilient_adapters::http::{HttpClient, RequestOptions, error_fn};
use resilient_adapters::{AdapterManager, AsyncAdapter, BoxError, QueuedAsyncAdapter};

struct SlowLookup;

#[async_trait]
impl AsyncAdapter<u32, String> for SlowLookup {
    async fn can_handle(&self, _input: &u32) -> Result<bool, BoxError> {
        Ok(true)
    }

    async fn execute(&self, input: &u32) -> Result<String, BoxError> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(format!("record #{}", input))
    }
}

// Example 1: Bounded concurrency with a per-attempt timeout
pub async fn example_queued_adapter() {
    let config = AdapterConfig::with_overrides(
        &ConfigOverrides::default()
            .concurrency(2)
            .timeout(Some(Duration::from_millis(500))),
    );
    let adapter = QueuedAsyncAdapter::new(SlowLookup, config);

    let lookups = (1..=4).map(|id| {
        let adapter = &adapter;
        async move { adapter.execute_with_retry(&id).await }
    });

    for result in join_all(lookups).await {
        match result {
            Ok(value) => println!("Success: {}", value),
            Err(error) => println!("Failed: {}", error),
        }
    }
}

// Example 2: Sync adapters first, async ones as the fallback
pub async fn example_auto_dispatch() {
    let mut manager: AdapterManager<u32, String> = AdapterManager::new();
    manager.register_async(SlowLookup);

    match manager.execute_auto(&7).await {
        Ok(value) => println!("Auto dispatch result: {}", value),
        Err(error) => println!("Auto dispatch failed: {}", error),
    }
}

// Example 3: HTTP request with retries and a fallback error interceptor
pub async fn example_http_client() {
    let mut client = HttpClient::builder()
        .base_url("https://example.com/")
        .retries(1)
        .retry_delay(Duration::from_millis(200))
        .build();
    client.on_error(error_fn(|error| async move {
        println!("Request failed with {}, giving up", error.kind);
        Err(error)
    }));

    match client.request(RequestOptions::get("/")).await {
        Ok(response) => println!("Status: {} {}", response.status, response.status_text),
        Err(error) => println!("Failed: {}", error),
    }
}
