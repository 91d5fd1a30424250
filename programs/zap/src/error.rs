use solana_sdk::pubkey::Pubkey;

/// Every way a zap, vault or venue call can fail.
///
/// Any error aborts the enclosing call frame; the runtime restores the state
/// it snapshotted when the frame opened.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ZapError {
    // ── Input ────────────────────────────────────────────────────────────────
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Attached value {attached} does not match expected {expected}")]
    ValueMismatch { expected: u64, attached: u64 },

    #[error("Goodwill must be ≤ 100 bps and affiliate split ≤ 10000 bps")]
    InvalidFeeRate,

    #[error("Batch arguments differ in length: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Call data could not be decoded: {0}")]
    InvalidCallData(String),

    // ── Asset movement ───────────────────────────────────────────────────────
    #[error("Insufficient balance of {asset} held by {holder}: have {available}, need {required}")]
    InsufficientBalance {
        asset: Pubkey,
        holder: Pubkey,
        available: u64,
        required: u64,
    },

    #[error("Insufficient allowance of {asset} from {owner} to {spender}: have {available}, need {required}")]
    InsufficientAllowance {
        asset: Pubkey,
        owner: Pubkey,
        spender: Pubkey,
        available: u64,
        required: u64,
    },

    // ── External venues ──────────────────────────────────────────────────────
    #[error("Swap venue call failed: {0}")]
    SwapExecutionFailed(String),

    #[error("Swap venue delivered no output")]
    ZeroOutput,

    #[error("No swap call data supplied for {0}")]
    MissingRoute(Pubkey),

    #[error("Pool venue call failed: {0}")]
    PoolCallFailed(String),

    #[error("Nothing deployed at venue {0}")]
    UnknownVenue(Pubkey),

    #[error("Pool {0} is not known to the pool venue")]
    UnknownPool(Pubkey),

    #[error("No pool pairs {asset_a} with {asset_b}")]
    NoPoolForPair { asset_a: Pubkey, asset_b: Pubkey },

    #[error("Pool has insufficient liquidity")]
    InsufficientLiquidity,

    #[error("Output below minimum — slippage exceeded (got {received}, min {min})")]
    SlippageExceeded { received: u64, min: u64 },

    #[error("Deadline {deadline} passed (now {now})")]
    Expired { deadline: i64, now: i64 },

    // ── Ledger ───────────────────────────────────────────────────────────────
    #[error("Caller is not authorized for this operation")]
    Unauthorized,

    #[error("Nothing to claim")]
    NothingToClaim,

    // ── Host ─────────────────────────────────────────────────────────────────
    #[error("Re-entrant call rejected")]
    ReentrantCall,

    #[error("Math overflow")]
    MathOverflow,

    #[error("Account {0} is already initialized")]
    AlreadyInitialized(Pubkey),

    #[error("Account {0} is not initialized")]
    NotInitialized(Pubkey),
}

/// Convenience alias so every module can write `Result<T>`.
pub type Result<T> = std::result::Result<T, ZapError>;

/// Return early with `$err` unless `$cond` holds.
#[macro_export]
macro_rules! require {
    ($cond:expr, $err:expr $(,)?) => {
        if !($cond) {
            return Err($err);
        }
    };
}
