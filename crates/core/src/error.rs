//! Error taxonomy for the trade execution engine.
//!
//! Every variant except `Storage` and `Internal` is a recoverable,
//! caller-facing condition. A failed operation leaves the database exactly as
//! it was before the call.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned by trade execution and ledger operations.
#[derive(Debug, Error)]
pub enum TradeError {
    /// Instrument missing, inactive, or owned by another institution.
    #[error("instrument not found: {stock_id}")]
    InstrumentNotFound {
        /// The instrument id that failed to resolve.
        stock_id: i64,
    },

    /// Portfolio cash cannot cover the cost of a buy.
    #[error("insufficient cash: required {required}, available {available}")]
    InsufficientCash {
        /// Cost of the requested trade.
        required: Decimal,
        /// Cash available in the portfolio.
        available: Decimal,
    },

    /// Sell quantity exceeds the held position.
    #[error("insufficient shares: requested {requested}, held {held}")]
    InsufficientShares {
        /// Quantity requested for sale.
        requested: i64,
        /// Quantity actually held (0 when no position exists).
        held: i64,
    },

    /// Close quantity exceeds the sum of open short contracts.
    #[error("insufficient shorts: requested {requested}, open {open}")]
    InsufficientShorts {
        /// Quantity requested for close.
        requested: i64,
        /// Total open short quantity for the instrument.
        open: i64,
    },

    /// A per-instrument trading limit would be breached.
    #[error("{limit} limit exceeded: attempted {attempted}, max {max}")]
    LimitExceeded {
        /// Which limit tripped ("per-user", "total", "per-user short").
        limit: &'static str,
        /// Quantity the trade would have resulted in.
        attempted: i64,
        /// Configured maximum.
        max: i64,
    },

    /// Non-positive quantity, duration, or price.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Underlying storage failure; the transaction was rolled back.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Unexpected internal failure; the transaction was rolled back.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl TradeError {
    /// Creates an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Returns true for conditions the caller can surface to the end user.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::Internal(_))
    }

    /// Stable machine-readable code for API responses.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InstrumentNotFound { .. } => "stock_not_found",
            Self::InsufficientCash { .. } => "insufficient_cash",
            Self::InsufficientShares { .. } => "insufficient_shares",
            Self::InsufficientShorts { .. } => "insufficient_shorts",
            Self::LimitExceeded { .. } => "limit_exceeded",
            Self::InvalidInput(_) => "invalid_input",
            Self::Storage(_) | Self::Internal(_) => "internal_error",
        }
    }
}

/// Result type alias for engine operations.
pub type TradeResult<T> = std::result::Result<T, TradeError>;
