use ethers::contract::ContractError;
use ethers::providers::{JsonRpcError, Middleware, MiddlewareError, ProviderError};
use thiserror::Error;

/// Where to send a user whose environment has no wallet provider at all.
pub const WALLET_INSTALL_URL: &str = "https://metamask.io/download/";

/// Classified failure taxonomy. Every fallible operation in the crate maps
/// its underlying error into one of these; none is fatal to the session and
/// the caller may always retry. Failed transactions are never resubmitted
/// automatically.
#[derive(Debug, Error)]
pub enum ClientError {
    // ============================================
    // SESSION / WALLET BOUNDARY
    // ============================================
    /// No wallet provider reachable (endpoint missing or unreachable)
    #[error("no wallet provider available; install one from {WALLET_INSTALL_URL} and retry")]
    ProviderAbsent,
    /// The wallet refused the request (EIP-1193 code 4001)
    #[error("request rejected in the wallet; approve it to continue")]
    UserRejected,
    /// A request is already awaiting approval (code -32002), or another
    /// transaction from this session is still in flight
    #[error("a request is already pending; resolve it before submitting another")]
    RequestPending,

    // ============================================
    // TRANSACTION OUTCOMES
    // ============================================
    /// The account cannot cover value plus gas
    #[error("insufficient funds for this transaction")]
    InsufficientFunds,
    /// The contract rejected the call; reason passed through verbatim
    #[error("contract reverted: {0}")]
    ContractRevert(String),

    // ============================================
    // ENVIRONMENT
    // ============================================
    /// Connected chain differs from the configured target
    #[error("connected to chain {actual}, expected chain {expected}")]
    NetworkMismatch { expected: u64, actual: u64 },
    /// Anything the classifier could not place
    #[error("{0}")]
    Unknown(String),
}

impl ClientError {
    /// Classify a raw JSON-RPC error response. The numeric codes are the
    /// EIP-1193 / MetaMask conventions the original deployment relied on.
    pub fn from_json_rpc(err: &JsonRpcError) -> Self {
        match err.code {
            4001 => Self::UserRejected,
            -32002 => Self::RequestPending,
            _ => Self::from_message(&err.message),
        }
    }

    /// Fall back to message sniffing for nodes that only signal through
    /// error text (insufficient funds, revert reasons).
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("insufficient funds") {
            return Self::InsufficientFunds;
        }
        if let Some(idx) = lower.find("execution reverted") {
            let tail = message[idx + "execution reverted".len()..]
                .trim_start_matches(':')
                .trim();
            let reason = if tail.is_empty() {
                "execution reverted".to_string()
            } else {
                tail.to_string()
            };
            return Self::ContractRevert(reason);
        }
        Self::Unknown(message.to_string())
    }

    /// Classify an error surfaced through any middleware layer.
    pub(crate) fn from_middleware<E: MiddlewareError>(err: E) -> Self {
        if let Some(rpc) = err.as_error_response() {
            return Self::from_json_rpc(rpc);
        }
        Self::from_message(&err.to_string())
    }
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        if let Some(rpc) = err.as_error_response() {
            return Self::from_json_rpc(rpc);
        }
        match err {
            // Transport-level failure with no RPC payload: nothing is
            // listening at the configured endpoint.
            ProviderError::JsonRpcClientError(_) => Self::ProviderAbsent,
            other => Self::from_message(&other.to_string()),
        }
    }
}

impl<M: Middleware> From<ContractError<M>> for ClientError {
    fn from(err: ContractError<M>) -> Self {
        // A typed revert with a decodable reason string takes priority.
        if let Some(reason) = err.decode_revert::<String>() {
            return Self::ContractRevert(reason);
        }
        if let Some(mid) = err.as_middleware_error() {
            if let Some(rpc) = mid.as_error_response() {
                return Self::from_json_rpc(rpc);
            }
        }
        Self::from_message(&err.to_string())
    }
}
