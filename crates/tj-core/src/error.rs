use tj_abi::AbiError;
use tj_rpc::ProviderError;
use tj_types::TxHash;

#[derive(Debug, thiserror::Error)]
pub enum TipError {
    #[error("no wallet provider is available")]
    WalletUnavailable,
    #[error("the user declined the wallet request")]
    UserRejected,
    #[error("the wallet returned no accounts")]
    NoAccounts,
    #[error("no wallet account is connected")]
    NotConnected,
    #[error("transaction {0} reverted")]
    Reverted(TxHash),
    #[error(transparent)]
    Remote(ProviderError),
    #[error(transparent)]
    Abi(#[from] AbiError),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<ProviderError> for TipError {
    fn from(err: ProviderError) -> Self {
        if err.is_user_rejection() {
            Self::UserRejected
        } else {
            Self::Remote(err)
        }
    }
}
