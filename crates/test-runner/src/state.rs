use std::time::{Duration, Instant};

use alloy_primitives::{Address, TxHash};
use alloy_provider::Provider;
use alloy_rpc_types_eth::{TransactionReceipt, TransactionRequest};
use orchestrator_resource_pool::ProviderHandle;
use orchestrator_types::{ErrorCategory, Wei};

use crate::error::OpError;

const REPLACEMENT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Terminal state for a single submitted transaction within a phase:
/// `Submitted -> (Confirmed | Replaced -> Confirmed | TimedOut | Reverted
/// | Failed)`. `Replaced` is not modeled as its own terminal here: a
/// transaction that gets replaced and whose replacement lands is
/// recorded as `Confirmed` with [`TxOutcome::replaced`] set, treating it
/// identically to a direct confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Confirmed,
    TimedOut,
    Reverted,
    Failed,
}

impl TxState {
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// Outcome of driving one transaction through submit -> receipt.
#[derive(Debug, Clone)]
pub struct TxOutcome {
    pub state: TxState,
    pub tx_hash: Option<String>,
    pub block_number: Option<u64>,
    pub gas_used: u128,
    pub replaced: bool,
    pub error: Option<String>,
}

impl TxOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.state.is_success()
    }

    /// Flattens into the `(tx_hash, block_number, gas_used, replaced)`
    /// tuple phases persist, turning any non-`Confirmed` state into the
    /// `OpError` a phase records as a failed `TestResult`.
    pub fn into_result(self) -> Result<(String, u64, Wei, bool), OpError> {
        match self.state {
            TxState::Confirmed => Ok((
                self.tx_hash.unwrap_or_default(),
                self.block_number.unwrap_or_default(),
                Wei(self.gas_used),
                self.replaced,
            )),
            TxState::TimedOut => Err(OpError {
                category: ErrorCategory::Timeout,
                message: self.error.unwrap_or_else(|| "transaction timed out".into()),
            }),
            TxState::Reverted => Err(OpError {
                category: ErrorCategory::Revert,
                message: self.error.unwrap_or_else(|| "transaction reverted".into()),
            }),
            TxState::Failed => Err(OpError {
                category: ErrorCategory::Unknown,
                message: self.error.unwrap_or_else(|| "transaction failed".into()),
            }),
        }
    }
}

/// Submits `request` from `address` at `nonce` and drives it to a
/// terminal [`TxOutcome`]. A receipt-wait timeout does not immediately
/// count as failure: [`detect_replacement`] polls the account's mined
/// transaction count to tell a stuck transaction from one that was
/// replaced (same sender, same nonce, different hash) and confirmed
/// under the replacement.
pub async fn submit_and_confirm(
    provider: &ProviderHandle,
    address: Address,
    nonce: u64,
    request: TransactionRequest,
    send_deadline: Duration,
    receipt_deadline: Duration,
) -> Result<TxOutcome, OpError> {
    let pending = tokio::time::timeout(send_deadline, provider.send_transaction(request))
        .await
        .map_err(|_| OpError {
            category: ErrorCategory::Timeout,
            message: "transaction send timed out".into(),
        })?
        .map_err(OpError::from_display)?;

    let original_hash = *pending.tx_hash();

    match tokio::time::timeout(receipt_deadline, pending.get_receipt()).await {
        Ok(Ok(receipt)) => Ok(outcome_from_receipt(&receipt, false)),
        Ok(Err(error)) => Err(OpError::from_display(error)),
        Err(_) => detect_replacement(provider, address, nonce, original_hash, receipt_deadline).await,
    }
}

/// A nonce slot that advances past `nonce` without the tracked hash ever
/// landing means some other transaction from the same sender, at the
/// same nonce, replaced it and got mined first.
async fn detect_replacement(
    provider: &ProviderHandle,
    address: Address,
    nonce: u64,
    original_hash: TxHash,
    deadline: Duration,
) -> Result<TxOutcome, OpError> {
    let deadline_at = Instant::now() + deadline;
    loop {
        if Instant::now() >= deadline_at {
            return Ok(TxOutcome {
                state: TxState::TimedOut,
                tx_hash: Some(format!("{original_hash:#x}")),
                block_number: None,
                gas_used: 0,
                replaced: false,
                error: Some("receipt wait timed out with no replacement observed".into()),
            });
        }

        let mined_count = provider.get_transaction_count(address).await.map_err(OpError::from_display)?;
        if mined_count > nonce {
            if let Ok(Some(receipt)) = provider.get_transaction_receipt(original_hash).await {
                return Ok(outcome_from_receipt(&receipt, false));
            }
            return Ok(TxOutcome {
                state: TxState::Confirmed,
                tx_hash: Some(format!("{original_hash:#x}")),
                block_number: provider.get_block_number().await.ok(),
                gas_used: 0,
                replaced: true,
                error: None,
            });
        }
        tokio::time::sleep(REPLACEMENT_POLL_INTERVAL).await;
    }
}

fn outcome_from_receipt(receipt: &TransactionReceipt, replaced: bool) -> TxOutcome {
    if receipt.status() {
        TxOutcome {
            state: TxState::Confirmed,
            tx_hash: Some(format!("{:#x}", receipt.transaction_hash)),
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            replaced,
            error: None,
        }
    } else {
        TxOutcome {
            state: TxState::Reverted,
            tx_hash: Some(format!("{:#x}", receipt.transaction_hash)),
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            replaced,
            error: Some("transaction reverted".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_confirmed_counts_as_success() {
        assert!(TxState::Confirmed.is_success());
        assert!(!TxState::TimedOut.is_success());
        assert!(!TxState::Reverted.is_success());
        assert!(!TxState::Failed.is_success());
    }

    #[test]
    fn into_result_carries_the_replaced_flag_through() {
        let outcome = TxOutcome {
            state: TxState::Confirmed,
            tx_hash: Some("0xabc".into()),
            block_number: Some(42),
            gas_used: 21_000,
            replaced: true,
            error: None,
        };
        let (_, block_number, gas_used, replaced) = outcome.into_result().unwrap();
        assert_eq!(block_number, 42);
        assert_eq!(gas_used, Wei(21_000));
        assert!(replaced);
    }

    #[test]
    fn timed_out_becomes_a_timeout_op_error() {
        let outcome = TxOutcome {
            state: TxState::TimedOut,
            tx_hash: None,
            block_number: None,
            gas_used: 0,
            replaced: false,
            error: Some("stuck".into()),
        };
        let error = outcome.into_result().unwrap_err();
        assert_eq!(error.category, ErrorCategory::Timeout);
    }
}
