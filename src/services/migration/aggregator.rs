use color_eyre::eyre::{Result, WrapErr};
use tokio::task::JoinSet;

use super::types::{AggregateResult, WorkerResult};

/// Wait for every worker and merge their results in completion order.
///
/// The first worker failure aborts the merge; dropping the set aborts the
/// workers still running.
pub async fn gather_worker_results(
    mut workers: JoinSet<Result<WorkerResult>>,
) -> Result<AggregateResult> {
    let mut finished = Vec::with_capacity(workers.len());
    while let Some(joined) = workers.join_next().await {
        let result = joined.wrap_err("Search worker panicked")??;
        finished.push(result);
    }
    Ok(merge(finished))
}

pub fn merge(results: impl IntoIterator<Item = WorkerResult>) -> AggregateResult {
    results
        .into_iter()
        .fold(AggregateResult::default(), |mut merged, result| {
            merged.resolved_ids.extend(result.resolved_ids);
            merged.unresolved_names.extend(result.unresolved_names);
            merged
        })
}
