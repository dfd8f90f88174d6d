use std::{future::Future, sync::Arc};

use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;

use crate::domain::company::CompanyRecord;

/// Output is in input order. Records whose task never started (cancellation)
/// or panicked are returned as they came in.
pub async fn enrich_concurrently<F, Fut>(
    mut records: Vec<CompanyRecord>,
    concurrency: usize,
    cancel: &CancellationToken,
    enrich: F,
) -> Vec<CompanyRecord>
where
    F: Fn(CompanyRecord) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CompanyRecord> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let enrich = Arc::new(enrich);
    let mut tasks = JoinSet::new();

    for (index, record) in records.iter().enumerate() {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let enrich = Arc::clone(&enrich);
        let record = record.clone();
        tasks.spawn(async move {
            let _permit = permit;
            (index, (*enrich)(record).await)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, record)) => records[index] = record,
            Err(e) => log::error!("Enrichment task failed: {:?}", e),
        }
    }

    records
}
