// Infrastructure layer modules
pub mod config;
pub mod logging;
pub mod payment_repository;
pub mod secrets_ops;
pub mod tls;

// Re-exports
pub use config::{ConfigError, DbSslMode, RemittanceConfig};
pub use logging::init_logging;
pub use payment_repository::{PaymentRepository, PostgresPaymentRepository, RepositoryError};
pub use secrets_ops::{fetch_rds_secret, AwsSecretsOps, DataSourceError, SecretsOps, SecretsOpsError};
pub use tls::{make_tls_connect, TlsError};
