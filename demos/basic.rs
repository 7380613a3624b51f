//! Minimal acquisition run: two scripted sources feeding the in-memory
//! listing store through the validation stage, supervised to completion.
//!
//!     cargo run --example basic

use async_trait::async_trait;
use reap::prelude::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct ScriptedSpider {
    name: String,
    queue: Mutex<VecDeque<RawRecord>>,
}

impl ScriptedSpider {
    fn new(name: &str, listings: Vec<RawRecord>) -> Self {
        Self {
            name: name.to_string(),
            queue: Mutex::new(listings.into()),
        }
    }
}

#[async_trait]
impl RecordSource for ScriptedSpider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_next(&self) -> Result<Option<RawRecord>, UpstreamError> {
        Ok(self.queue.lock().unwrap().pop_front())
    }
}

fn listing(url: &str, price: &str, address: &str) -> RawRecord {
    RawRecord::new()
        .with_field("url", url)
        .with_field("source", "craigslist")
        .with_field("price", price)
        .with_field("address", address)
        .with_field(
            "description",
            "Sunny two-bedroom apartment close to downtown with parking",
        )
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let stats = Arc::new(PipelineStats::new());
    let store = Arc::new(InMemoryListingStore::new(Arc::clone(&stats)));

    let buyer_spider = ScriptedSpider::new(
        "buyer-leads",
        vec![
            listing("https://example.com/1", "$450,000", "12 Oak Ave"),
            listing("https://example.com/2", "$519,900", "48 Elm St"),
            // rejected: price below the configured minimum
            listing("https://example.com/3", "$5", "3 Cheap Ln"),
        ],
    );
    let refi_spider = ScriptedSpider::new(
        "refinance-leads",
        vec![
            listing("https://example.com/4", "$1,200,000", "9 Hill Rd"),
            // duplicate of a listing the buyer spider also sees
            listing("https://example.com/1", "$450,000", "12 Oak Ave"),
        ],
    );

    let worker_options = WorkerOptionsBuilder::default()
        .politeness_delay(Duration::from_millis(100))
        .item_budget(Some(10usize))
        .build()
        .unwrap();
    let options = SupervisorOptionsBuilder::default()
        .worker_options(worker_options)
        .build()
        .unwrap();

    let mut supervisor = Supervisor::new(
        vec![Arc::new(buyer_spider), Arc::new(refi_spider)],
        Validator::new(ValidationRules::default()).unwrap(),
        store.clone(),
        Arc::clone(&stats),
        options,
    );
    supervisor.run_workers().await;

    let stored = store.list(&[], 100, 0).await.unwrap();
    for record in &stored {
        println!(
            "{} | ${:.0} | {} (via {})",
            record.url, record.price, record.address, record.spider_name
        );
    }
    println!("stats: {:?}", stats.snapshot());
}
