// Domain layer modules
pub mod payment;
pub mod payment_request;
pub mod rds_secret;
mod serde_default;

// Re-exports
pub use payment::{Payment, PaymentStatus, PaymentStatusError};
pub use payment_request::{AcceptPaymentRequest, RequestError};
pub use rds_secret::{DataSourceUrl, RdsSecret, RdsSecretError};
