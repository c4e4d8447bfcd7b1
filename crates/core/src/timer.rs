//! Deadline helper for `tokio::select!` loops.

use tokio::time::Instant;

/// Sleep until `deadline`, or forever when there is none.
///
/// Lets a select loop hold at most one armed timer in an `Option`.
pub async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
