//! Expiry Sweep Task
//!
//! Lazy expiry on access is the primary mechanism. The sweep only bounds
//! memory held by entries nobody reads again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedStore;

/// Runs one sweep pass and returns the number of entries removed.
///
/// Expired keys are listed under a read lock, then removed one at a time,
/// each under its own short write lock. An entry re-set between the listing
/// and its removal is left alone.
pub async fn sweep_expired(store: &SharedStore) -> usize {
    let mut removed = 0;
    for key in store.expired_keys().await {
        if store.remove_if_expired(&key).await {
            removed += 1;
        }
    }
    removed
}

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task runs until aborted through the returned `JoinHandle`.
///
/// # Example
/// ```ignore
/// let store = SharedStore::new();
/// let sweep_handle = spawn_sweep_task(store.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(store: SharedStore, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting expiry sweep task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = sweep_expired(&store).await;

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}
