use std::time::Duration;

use ob_common::{TxHash, TxStatus};
use thiserror::Error;
use tracing::info;

use crate::chain::{ChainClient, ChainError};

pub const DEFAULT_INTERVAL_SECS: u64 = 3;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 200;

#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("transaction {hash} ended as {status}")]
    Rejected { hash: TxHash, status: TxStatus },
    #[error("transaction {hash} still {last} after {attempts} attempts")]
    Exhausted {
        hash: TxHash,
        attempts: u32,
        last: TxStatus,
    },
    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Blocks until `hash` is accepted. Returns the number of status queries made.
pub async fn wait_for_acceptance<C: ChainClient>(
    client: &C,
    hash: &TxHash,
    policy: PollPolicy,
) -> Result<u32, PollError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut last = TxStatus::NotReceived;

    for attempt in 1..=max_attempts {
        let status = client.tx_status(hash).await?;
        if status.is_accepted() {
            return Ok(attempt);
        }
        if status.is_failed() {
            return Err(PollError::Rejected {
                hash: hash.clone(),
                status,
            });
        }
        info!("> {hash} ({status})");
        last = status;
        if attempt < max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    Err(PollError::Exhausted {
        hash: hash.clone(),
        attempts: max_attempts,
        last,
    })
}

/// Polls a list of hashes in rounds until all are accepted. Accepted hashes
/// are cached and never queried again. A round stops at the first hash that
/// is still pending, since later txs from the same account cannot land
/// before it. Returns the number of rounds used.
pub async fn poll_until_all_accepted<C: ChainClient>(
    client: &C,
    hashes: &[TxHash],
    interval: Duration,
    max_rounds: u32,
) -> Result<u32, PollError> {
    let max_rounds = max_rounds.max(1);
    let mut accepted = vec![false; hashes.len()];
    let mut pending: Option<(usize, TxStatus)> = None;

    for round in 1..=max_rounds {
        info!("> begin polling tx status.");
        let mut all_accepted = true;
        for (idx, hash) in hashes.iter().enumerate() {
            if accepted[idx] {
                continue;
            }
            let status = client.tx_status(hash).await?;
            if status.is_failed() {
                return Err(PollError::Rejected {
                    hash: hash.clone(),
                    status,
                });
            }
            if !status.is_accepted() {
                info!("> {hash} ({status}) not accepted onchain yet.");
                pending = Some((idx, status));
                all_accepted = false;
                break;
            }
            info!("> {idx}th hash {hash} is accepted onchain.");
            accepted[idx] = true;
        }

        if all_accepted {
            info!("> all tx hashes are accepted onchain.");
            return Ok(round);
        }
        if round < max_rounds {
            info!("> retry polling in {} seconds.", interval.as_secs());
            tokio::time::sleep(interval).await;
        }
    }

    let (idx, last) = pending.unwrap_or((0, TxStatus::NotReceived));
    Err(PollError::Exhausted {
        hash: hashes[idx].clone(),
        attempts: max_rounds,
        last,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::ScriptedChain;

    fn policy(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(3),
            max_attempts,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_until_accepted() {
        let chain = ScriptedChain::new();
        chain.script("0xa", &["NOT_RECEIVED", "RECEIVED", "PENDING", "ACCEPTED_ON_L2"]);

        let attempts = wait_for_acceptance(&chain, &TxHash::new("0xa"), policy(10))
            .await
            .unwrap();
        assert_eq!(attempts, 4);
        assert_eq!(chain.queries_for("0xa"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_between_attempts() {
        let chain = ScriptedChain::new();
        chain.script("0xa", &["RECEIVED", "RECEIVED", "ACCEPTED_ON_L2"]);

        let started = tokio::time::Instant::now();
        wait_for_acceptance(&chain, &TxHash::new("0xa"), policy(10))
            .await
            .unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let chain = ScriptedChain::new();
        chain.script("0xa", &["RECEIVED"]);

        let err = wait_for_acceptance(&chain, &TxHash::new("0xa"), policy(5))
            .await
            .unwrap_err();
        match err {
            PollError::Exhausted { attempts, last, .. } => {
                assert_eq!(attempts, 5);
                assert_eq!(last, TxStatus::Received);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(chain.queries_for("0xa"), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn rejection_fails_fast() {
        let chain = ScriptedChain::new();
        chain.script("0xa", &["RECEIVED", "REJECTED"]);

        let err = wait_for_acceptance(&chain, &TxHash::new("0xa"), policy(50))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PollError::Rejected {
                status: TxStatus::Rejected,
                ..
            }
        ));
        assert_eq!(chain.queries_for("0xa"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_never_requeries_accepted_hashes() {
        let chain = ScriptedChain::new();
        chain.script("0xa", &["ACCEPTED_ON_L2"]);
        chain.script("0xb", &["PENDING", "PENDING", "ACCEPTED_ON_L2"]);
        chain.script("0xc", &["ACCEPTED_ON_L2"]);
        let hashes = [TxHash::new("0xa"), TxHash::new("0xb"), TxHash::new("0xc")];

        let rounds = poll_until_all_accepted(&chain, &hashes, Duration::from_secs(10), 10)
            .await
            .unwrap();
        assert_eq!(rounds, 3);
        assert_eq!(chain.queries_for("0xa"), 1);
        assert_eq!(chain.queries_for("0xb"), 3);
        // Only reached once 0xb is through.
        assert_eq!(chain.queries_for("0xc"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_of_nothing_is_done() {
        let chain = ScriptedChain::new();
        let rounds = poll_until_all_accepted(&chain, &[], Duration::from_secs(10), 3)
            .await
            .unwrap();
        assert_eq!(rounds, 1);
        assert!(chain.queried.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn batch_reports_stuck_hash() {
        let chain = ScriptedChain::new();
        chain.script("0xa", &["ACCEPTED_ON_L2"]);
        chain.script("0xb", &["RECEIVED"]);
        let hashes = [TxHash::new("0xa"), TxHash::new("0xb")];

        let err = poll_until_all_accepted(&chain, &hashes, Duration::from_secs(10), 4)
            .await
            .unwrap_err();
        match err {
            PollError::Exhausted { hash, attempts, .. } => {
                assert_eq!(hash.as_str(), "0xb");
                assert_eq!(attempts, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(chain.queries_for("0xa"), 1);
        assert_eq!(chain.queries_for("0xb"), 4);
    }
}
