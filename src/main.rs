//! Cache Layer demo
//!
//! Walks through every caching strategy against a simulated product
//! database, logging what the cache does at each step.
//!
//! # Walkthrough
//! 1. Cache-aside read of a product (miss, then hit)
//! 2. Cached product list page
//! 3. Write-through update that invalidates list pages
//! 4. Delete with invalidation
//! 5. Rate-limit burst from one client

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::signal;
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache_layer::{
    spawn_sweep_task, CacheAside, Config, Loader, RateLimiter, SharedStore, WriteThrough, Writer,
};

/// Simulated round trip to the database.
const DB_LATENCY: Duration = Duration::from_millis(50);

/// Invalidated whenever any product changes.
const LIST_PATTERN: &str = "products:list:*";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cache_layer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cache layer demo");

    let config = Config::from_env();
    info!(
        "Configuration loaded: sweep_interval={}s, product_ttl={}s, list_ttl={}s, rate_limit={}/{}s",
        config.sweep_interval, config.product_ttl, config.list_ttl, config.rate_limit, config.rate_window
    );

    // One store for the whole process, handed to every consumer.
    let store = SharedStore::new();
    let sweep_handle = spawn_sweep_task(store.clone(), config.sweep_interval());

    tokio::select! {
        result = run_walkthrough(store.clone(), &config) => result?,
        _ = signal::ctrl_c() => warn!("Received Ctrl+C, stopping early"),
    }

    let stats = store.stats().await;
    info!(
        "Final stats: {} (hit rate {:.2})",
        serde_json::to_string(&stats).context("serializing stats")?,
        stats.hit_rate()
    );

    sweep_handle.abort();
    info!("Demo complete");
    Ok(())
}

async fn run_walkthrough(store: SharedStore, config: &Config) -> anyhow::Result<()> {
    let catalog = Catalog::seeded();
    let reads = CacheAside::new(store.clone(), catalog.clone());
    let writes = WriteThrough::new(store.clone(), catalog);

    // == 1. Cache-aside ==
    for _ in 0..2 {
        let lookup = reads.get_or_load("product:1", config.product_ttl()).await?;
        info!(
            "Cache-aside product:1 -> {} ({})",
            lookup.value["name"],
            if lookup.hit { "HIT" } else { "MISS, loaded from database" }
        );
    }
    if let Some(ttl) = store.ttl_remaining("product:1").await? {
        info!("product:1 expires in {}s", cache_layer::cache::ceil_secs(ttl));
    }

    // == 2. Query caching ==
    let list_key = "products:list:all:page1:limit10";
    let lookup = reads.get_or_load(list_key, config.list_ttl()).await?;
    info!(
        "List page cached: {} products (hit={})",
        lookup.value["total"], lookup.hit
    );

    // == 3. Write-through with invalidation ==
    let updated = json!({"id": 1, "name": "Widget Pro", "category": "tools", "price": 24.99});
    let invalidated = writes
        .write_and_invalidate("product:1", updated, config.product_ttl(), &[LIST_PATTERN])
        .await?;
    info!("Write-through product:1, invalidated {} list entries", invalidated);

    let lookup = reads.get_or_load("product:1", config.product_ttl()).await?;
    info!(
        "After write: product:1 -> {} (hit={})",
        lookup.value["name"], lookup.hit
    );

    // == 4. Delete with invalidation ==
    reads.get_or_load("product:2", config.product_ttl()).await?;
    reads.get_or_load(list_key, config.list_ttl()).await?;
    let removed = writes.remove("product:2", &[LIST_PATTERN]).await?;
    info!("Deleted product:2, cache keys invalidated: {:?}", removed);

    match reads.get_or_load("product:2", config.product_ttl()).await {
        Ok(_) => warn!("product:2 unexpectedly still loadable"),
        Err(err) => info!("product:2 is gone: {}", err),
    }

    // == 5. Rate limiting ==
    let limiter = RateLimiter::new(store.clone());
    for _ in 0..config.rate_limit + 2 {
        let decision = limiter
            .allow("127.0.0.1", config.rate_limit, config.rate_window())
            .await?;
        if decision.allowed {
            info!(
                "Request {} allowed, {} remaining",
                decision.count, decision.remaining
            );
        } else {
            warn!(
                "Request {} rejected: rate limit exceeded, try again in {}s",
                decision.count,
                decision.retry_after_secs()
            );
        }
    }

    Ok(())
}

// == Simulated Database ==
/// Product table shared between the loader and writer sides.
#[derive(Clone)]
struct Catalog {
    rows: Arc<RwLock<BTreeMap<u64, Value>>>,
}

impl Catalog {
    fn seeded() -> Self {
        let rows = [
            json!({"id": 1, "name": "Widget", "category": "tools", "price": 19.99}),
            json!({"id": 2, "name": "Gadget", "category": "electronics", "price": 49.99}),
            json!({"id": 3, "name": "Doohickey", "category": "tools", "price": 4.99}),
        ]
        .into_iter()
        .filter_map(|row| row["id"].as_u64().map(|id| (id, row)))
        .collect();

        Self {
            rows: Arc::new(RwLock::new(rows)),
        }
    }
}

#[async_trait]
impl Loader for Catalog {
    async fn load(&self, key: &str) -> anyhow::Result<Value> {
        tokio::time::sleep(DB_LATENCY).await;
        let rows = self.rows.read().await;

        if let Some(id) = key.strip_prefix("product:") {
            let id: u64 = id.parse().context("product id must be numeric")?;
            let mut row = rows.get(&id).cloned().context("Product not found")?;
            row["fetched_at"] = json!(chrono::Utc::now().to_rfc3339());
            return Ok(row);
        }

        let query = ListQuery::parse(key).context("unsupported cache key")?;
        let matching: Vec<&Value> = rows
            .values()
            .filter(|row| query.category.map_or(true, |c| row["category"] == c))
            .collect();
        let page: Vec<&Value> = matching
            .iter()
            .skip(query.offset())
            .take(query.limit)
            .copied()
            .collect();

        Ok(json!({
            "data": page,
            "total": matching.len(),
            "page": query.page,
            "cached_at": chrono::Utc::now().to_rfc3339(),
        }))
    }
}

#[async_trait]
impl Writer for Catalog {
    async fn write(&self, key: &str, value: &Value) -> anyhow::Result<()> {
        tokio::time::sleep(DB_LATENCY).await;
        let id = product_id(key)?;
        self.rows.write().await.insert(id, value.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        tokio::time::sleep(DB_LATENCY).await;
        let id = product_id(key)?;
        self.rows
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .context("Product not found")
    }
}

fn product_id(key: &str) -> anyhow::Result<u64> {
    key.strip_prefix("product:")
        .context("writes are only supported for product keys")?
        .parse()
        .context("product id must be numeric")
}

/// Parameters encoded in `products:list:{category}:page{n}:limit{n}`.
struct ListQuery<'a> {
    category: Option<&'a str>,
    page: usize,
    limit: usize,
}

impl<'a> ListQuery<'a> {
    fn parse(key: &'a str) -> Option<Self> {
        let mut parts = key.strip_prefix("products:list:")?.split(':');
        let category = parts.next()?;
        let page: usize = parts.next()?.strip_prefix("page")?.parse().ok()?;
        let limit: usize = parts.next()?.strip_prefix("limit")?.parse().ok()?;

        if page == 0 || limit == 0 {
            return None;
        }

        // The row offset must fit in a usize.
        (page - 1).checked_mul(limit)?;

        Some(Self {
            category: (category != "all").then_some(category),
            page,
            limit,
        })
    }

    /// Rows skipped before this page; `parse` guarantees it does not overflow.
    fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}
