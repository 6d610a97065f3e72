use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use adwell_billing::vip;
use adwell_db::Database;

/// Background task that demotes lapsed VIP placements.
///
/// Runs on an interval and clears the VIP flag on listings whose paid
/// period has expired.
pub async fn run_expiry_loop(db: Arc<Database>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let sweep_db = db.clone();
        let result = tokio::task::spawn_blocking(move || vip::expire_lapsed(&sweep_db)).await;

        match result {
            Ok(Ok(count)) => {
                if count > 0 {
                    info!("VIP sweep: demoted {} lapsed placements", count);
                }
            }
            Ok(Err(e)) => warn!("VIP sweep error: {}", e),
            Err(e) => warn!("VIP sweep join error: {}", e),
        }
    }
}
