pub mod checkout;
pub mod pricing;
pub mod stripe;
pub mod vip;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("ad not found: {0}")]
    AdNotFound(String),

    #[error("payment provider error: {0}")]
    Provider(String),

    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
