use crate::asynchronous::{example_auto_dispatch, example_http_client, example_queued_adapter};
use crate::synchronous::{example_linear_backoff, example_manager_fallback, example_simple_retry};

mod asynchronous;
mod synchronous;

fn sync_examples() {
    println!("Running simple retry example:");
    example_simple_retry();

    println!("\nRunning linear backoff example:");
    example_linear_backoff();

    println!("\nRunning manager fallback example:");
    example_manager_fallback();
}

async fn async_examples() {
    println!("\nRunning queued adapter example:");
    example_queued_adapter().await;

    println!("\nRunning auto dispatch example:");
    example_auto_dispatch().await;

    println!("\nRunning HTTP client example:");
    example_http_client().await;
}

#[tokio::main]
async fn main() {
    sync_examples();
    async_examples().await;
}
