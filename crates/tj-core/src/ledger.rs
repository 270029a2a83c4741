//! Contract calls: paying a tip and reading the memo history.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tj_rpc::{Provider, Sleeper, TransactionReceipt, TransactionRequest, call};
use tj_types::{EtherAmount, Memo, TxHash, WalletAddress};
use tracing::{debug, info};

use crate::TipError;
use crate::contract::TipContract;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

pub struct LedgerClient<P: ?Sized> {
    provider: Option<Arc<P>>,
    contract: Arc<TipContract>,
    sleeper: Arc<dyn Sleeper>,
    receipt_poll_interval: Duration,
}

impl<P: Provider + ?Sized> LedgerClient<P> {
    pub fn new(
        provider: Option<Arc<P>>,
        contract: Arc<TipContract>,
        sleeper: Arc<dyn Sleeper>,
        receipt_poll_interval: Duration,
    ) -> Self {
        Self {
            provider,
            contract,
            sleeper,
            receipt_poll_interval,
        }
    }

    fn provider(&self) -> Result<&P, TipError> {
        self.provider.as_deref().ok_or(TipError::WalletUnavailable)
    }

    /// Send `buyCoffee(name, message)` with `amount` attached and wait until it is mined.
    ///
    /// There is no timeout; a transaction that never mines keeps this pending.
    pub async fn submit_payment(
        &self,
        from: &WalletAddress,
        name: &str,
        message: &str,
        amount: EtherAmount,
    ) -> Result<PaymentReceipt, TipError> {
        let provider = self.provider()?;
        let tx = TransactionRequest {
            from: from.0.clone(),
            to: self.contract.address().0.clone(),
            value: amount.to_quantity(),
            data: self.contract.buy_coffee_calldata(name, message)?,
        };

        info!(from = %from, amount = %amount, "buying coffee");
        let hash: String = call(provider, "eth_sendTransaction", json!([tx])).await?;
        let tx_hash = TxHash(hash);
        info!(tx_hash = %tx_hash, "mining transaction");

        let receipt = self.wait_for_receipt(provider, &tx_hash).await?;
        if !receipt.succeeded() {
            return Err(TipError::Reverted(tx_hash));
        }

        let block_number = receipt.block();
        info!(tx_hash = %tx_hash, block = ?block_number, "coffee purchased");
        Ok(PaymentReceipt { tx_hash, block_number })
    }

    async fn wait_for_receipt(
        &self,
        provider: &P,
        tx_hash: &TxHash,
    ) -> Result<TransactionReceipt, TipError> {
        loop {
            let receipt: Option<TransactionReceipt> =
                call(provider, "eth_getTransactionReceipt", json!([tx_hash.0])).await?;
            if let Some(receipt) = receipt {
                return Ok(receipt);
            }
            debug!(tx_hash = %tx_hash, "receipt not available yet");
            self.sleeper.sleep(self.receipt_poll_interval).await;
        }
    }

    /// All memos stored by the contract, oldest first.
    pub async fn fetch_history(&self) -> Result<Vec<Memo>, TipError> {
        let provider = self.provider()?;
        info!("fetching memos from the blockchain");

        let request = json!({
            "to": self.contract.address().0,
            "data": self.contract.get_memos_calldata()?,
        });
        let output: String = call(provider, "eth_call", json!([request, "latest"])).await?;
        let memos = self.contract.decode_memos(&output)?;

        info!(count = memos.len(), "fetched memos");
        Ok(memos)
    }
}
