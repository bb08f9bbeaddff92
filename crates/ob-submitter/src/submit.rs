use ob_common::{format_unix_date, HashLedger, OrderRecord};
use thiserror::Error;
use tracing::info;

use crate::{
    chain::{ChainClient, ChainError, OrderBookTarget},
    poll::{wait_for_acceptance, PollError, PollPolicy},
};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invoke for order starting at {start_date} failed: {source}")]
    Invoke {
        start_date: i64,
        #[source]
        source: ChainError,
    },
    #[error("order starting at {start_date} was not accepted: {source}")]
    NotAccepted {
        start_date: i64,
        #[source]
        source: PollError,
    },
}

/// Result of a batch run. The ledger holds every order that was submitted,
/// including the one that failed to reach acceptance, if any.
#[derive(Debug)]
pub struct BatchOutcome {
    pub ledger: HashLedger,
    pub failure: Option<SubmitError>,
}

/// Submits orders one at a time, waiting for each to be accepted before the
/// next so that account nonces never collide. Stops at the first failure.
pub async fn submit_batch<C: ChainClient>(
    client: &C,
    target: &OrderBookTarget,
    orders: &[OrderRecord],
    policy: PollPolicy,
) -> BatchOutcome {
    let mut ledger = HashLedger::new();

    for order in orders {
        let start_date = order.start_date;
        info!(
            start_date,
            day = %format_unix_date(start_date),
            end_date = order.end_date,
            "invoking {}",
            target.function
        );

        let hash = match client.invoke(&target.call_for(order)).await {
            Ok(hash) => hash,
            Err(source) => {
                return BatchOutcome {
                    ledger,
                    failure: Some(SubmitError::Invoke { start_date, source }),
                }
            }
        };
        ledger.record(start_date, hash.clone());

        if let Err(source) = wait_for_acceptance(client, &hash, policy).await {
            return BatchOutcome {
                ledger,
                failure: Some(SubmitError::NotAccepted { start_date, source }),
            };
        }
        info!("> invoke on day: {start_date} with tx hash: {hash} is accepted onchain.");
    }

    BatchOutcome {
        ledger,
        failure: None,
    }
}
