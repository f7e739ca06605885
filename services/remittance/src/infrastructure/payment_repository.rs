/// PostgreSQLで支払いを管理するための支払いリポジトリ
///
/// テーブル定義:
/// ```sql
/// CREATE TABLE payments (
///     number     TEXT PRIMARY KEY,
///     status     TEXT NOT NULL,
///     updated_at TIMESTAMPTZ NOT NULL
/// );
/// ```
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, Pool, PoolConfig, Runtime, SslMode};
use thiserror::Error;
use tokio_postgres::Row;
use tokio_postgres_rustls::MakeRustlsConnect;

use super::config::DbSslMode;
use crate::domain::{DataSourceUrl, Payment, PaymentStatus};

const SELECT_PAYMENT: &str = "SELECT number, status, updated_at FROM payments WHERE number = $1";

const UPDATE_PAYMENT_STATUS: &str = "UPDATE payments SET status = $3, updated_at = now() \
     WHERE number = $1 AND status = $2 \
     RETURNING number, status, updated_at";

/// リポジトリ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    /// 接続プールからの接続取得・プール構築に失敗
    #[error("Pool error: {0}")]
    Pool(String),

    /// クエリの実行に失敗
    #[error("Query error: {0}")]
    Query(String),

    /// 取得した行を支払いに変換できない
    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

/// 支払い永続化用トレイト
///
/// 実際のPostgreSQLとテスト用モックを差し替えられるように抽象化する。
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// 支払い番号で支払いを取得
    ///
    /// # 戻り値
    /// * 見つかった場合は`Ok(Some(Payment))`
    /// * 見つからなかった場合は`Ok(None)`
    /// * 失敗時は`Err(RepositoryError)`
    async fn find_by_number(&self, number: &str) -> Result<Option<Payment>, RepositoryError>;

    /// ステータスが`from`である支払いを`to`に更新
    ///
    /// # 戻り値
    /// * 更新した場合は`Ok(Some(Payment))`（更新後の値）
    /// * 該当番号の支払いが`from`でなかった場合は`Ok(None)`
    /// * 失敗時は`Err(RepositoryError)`
    async fn update_status(
        &self,
        number: &str,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<Option<Payment>, RepositoryError>;
}

/// PaymentRepositoryのPostgreSQL実装
#[derive(Clone)]
pub struct PostgresPaymentRepository {
    pool: Pool,
}

impl PostgresPaymentRepository {
    /// 既存の接続プールからリポジトリを作成
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// 接続URLから接続プールを構築してリポジトリを作成
    ///
    /// 接続は最初のクエリ実行時に確立される。
    /// `ssl_mode`はURLに含まれる`sslmode`より優先する。
    pub fn connect(
        url: &DataSourceUrl,
        max_size: usize,
        ssl_mode: DbSslMode,
        tls: MakeRustlsConnect,
    ) -> Result<Self, RepositoryError> {
        let mut config = Config::new();
        config.url = Some(url.as_str().to_string());
        config.pool = Some(PoolConfig::new(max_size));
        config.ssl_mode = Some(match ssl_mode {
            DbSslMode::Disable => SslMode::Disable,
            DbSslMode::Prefer => SslMode::Prefer,
            DbSslMode::Require => SslMode::Require,
        });

        let pool = config
            .create_pool(Some(Runtime::Tokio1), tls)
            .map_err(|e| RepositoryError::Pool(e.to_string()))?;

        Ok(Self::new(pool))
    }

    /// 接続プールの最大接続数を取得
    pub fn max_size(&self) -> usize {
        self.pool.status().max_size
    }

    fn row_to_payment(row: &Row) -> Result<Payment, RepositoryError> {
        let number: String = row
            .try_get("number")
            .map_err(|e| RepositoryError::InvalidRow(e.to_string()))?;
        let status: String = row
            .try_get("status")
            .map_err(|e| RepositoryError::InvalidRow(e.to_string()))?;
        let updated_at: DateTime<Utc> = row
            .try_get("updated_at")
            .map_err(|e| RepositoryError::InvalidRow(e.to_string()))?;

        let status = status
            .parse::<PaymentStatus>()
            .map_err(|e| RepositoryError::InvalidRow(e.to_string()))?;

        Ok(Payment::new(number, status, updated_at))
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn find_by_number(&self, number: &str) -> Result<Option<Payment>, RepositoryError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| RepositoryError::Pool(e.to_string()))?;

        let statement = client
            .prepare_cached(SELECT_PAYMENT)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let row = client
            .query_opt(&statement, &[&number])
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(Self::row_to_payment).transpose()
    }

    async fn update_status(
        &self,
        number: &str,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<Option<Payment>, RepositoryError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| RepositoryError::Pool(e.to_string()))?;

        let statement = client
            .prepare_cached(UPDATE_PAYMENT_STATUS)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let row = client
            .query_opt(&statement, &[&number, &from.as_str(), &to.as_str()])
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(Self::row_to_payment).transpose()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::RdsSecret;
    use crate::infrastructure::tls::make_tls_connect;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    // ==================== RepositoryError テスト ====================

    #[test]
    fn test_repository_error_display() {
        assert_eq!(
            RepositoryError::Pool("timed out".to_string()).to_string(),
            "Pool error: timed out"
        );
        assert_eq!(
            RepositoryError::Query("relation does not exist".to_string()).to_string(),
            "Query error: relation does not exist"
        );
        assert_eq!(
            RepositoryError::InvalidRow("unknown payment status: void".to_string()).to_string(),
            "Invalid row: unknown payment status: void"
        );
    }

    fn unreachable_url() -> DataSourceUrl {
        let secret = RdsSecret {
            username: "app_user".to_string(),
            password: "secret".to_string(),
            db_host: "127.0.0.1".to_string(),
            db_name: "payments".to_string(),
            port: "1".to_string(),
        };
        secret.data_source_url().unwrap()
    }

    /// プール構築時には接続しない
    #[tokio::test]
    async fn test_connect_builds_pool_lazily() {
        let tls = make_tls_connect(None).unwrap();

        let repository =
            PostgresPaymentRepository::connect(&unreachable_url(), 3, DbSslMode::Require, tls)
                .unwrap();

        assert_eq!(repository.max_size(), 3);
    }

    /// TLS必須の接続先に到達できない場合は取得時にプールエラーになる
    #[tokio::test]
    async fn test_connect_failure_surfaces_as_pool_error() {
        let tls = make_tls_connect(None).unwrap();
        let repository =
            PostgresPaymentRepository::connect(&unreachable_url(), 1, DbSslMode::Require, tls)
                .unwrap();

        let result = repository.find_by_number("PAY-1").await;

        assert!(matches!(result, Err(RepositoryError::Pool(_))));
    }

    // ユニットテスト用のモックPaymentRepository
    #[derive(Debug, Clone)]
    pub struct MockPaymentRepository {
        /// 保存された支払い: number -> Payment
        payments: Arc<Mutex<HashMap<String, Payment>>>,
        /// 次の操作で返すエラー（エラーパスのテスト用）
        next_error: Arc<Mutex<Option<RepositoryError>>>,
        /// update_status呼び出し前にステータスを書き換える（競合のテスト用）
        concurrent_status: Arc<Mutex<Option<PaymentStatus>>>,
        /// update_status呼び出し回数
        update_count: Arc<Mutex<usize>>,
    }

    impl MockPaymentRepository {
        pub fn new() -> Self {
            Self {
                payments: Arc::new(Mutex::new(HashMap::new())),
                next_error: Arc::new(Mutex::new(None)),
                concurrent_status: Arc::new(Mutex::new(None)),
                update_count: Arc::new(Mutex::new(0)),
            }
        }

        pub fn insert(&self, number: &str, status: PaymentStatus) {
            let payment = Payment::new(number, status, Utc::now());
            self.payments
                .lock()
                .unwrap()
                .insert(number.to_string(), payment);
        }

        pub fn set_next_error(&self, error: RepositoryError) {
            *self.next_error.lock().unwrap() = Some(error);
        }

        pub fn set_concurrent_status(&self, status: PaymentStatus) {
            *self.concurrent_status.lock().unwrap() = Some(status);
        }

        pub fn get_payment(&self, number: &str) -> Option<Payment> {
            self.payments.lock().unwrap().get(number).cloned()
        }

        pub fn update_count(&self) -> usize {
            *self.update_count.lock().unwrap()
        }

        fn take_error(&self) -> Option<RepositoryError> {
            self.next_error.lock().unwrap().take()
        }
    }

    #[async_trait]
    impl PaymentRepository for MockPaymentRepository {
        async fn find_by_number(&self, number: &str) -> Result<Option<Payment>, RepositoryError> {
            if let Some(error) = self.take_error() {
                return Err(error);
            }

            Ok(self.payments.lock().unwrap().get(number).cloned())
        }

        async fn update_status(
            &self,
            number: &str,
            from: PaymentStatus,
            to: PaymentStatus,
        ) -> Result<Option<Payment>, RepositoryError> {
            *self.update_count.lock().unwrap() += 1;

            if let Some(error) = self.take_error() {
                return Err(error);
            }

            let mut payments = self.payments.lock().unwrap();

            if let Some(status) = self.concurrent_status.lock().unwrap().take() {
                if let Some(payment) = payments.get_mut(number) {
                    payment.status = status;
                }
            }

            match payments.get_mut(number) {
                Some(payment) if payment.status == from => {
                    payment.status = to;
                    payment.updated_at = Utc::now();
                    Ok(Some(payment.clone()))
                }
                _ => Ok(None),
            }
        }
    }

    #[tokio::test]
    async fn test_mock_repo_find() {
        let repo = MockPaymentRepository::new();
        repo.insert("PAY-1", PaymentStatus::Pending);

        let found = repo.find_by_number("PAY-1").await.unwrap().unwrap();
        assert_eq!(found.status, PaymentStatus::Pending);

        assert!(repo.find_by_number("PAY-404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mock_repo_update_requires_from_status() {
        let repo = MockPaymentRepository::new();
        repo.insert("PAY-1", PaymentStatus::Accepted);

        let result = repo
            .update_status("PAY-1", PaymentStatus::Pending, PaymentStatus::Rejected)
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(
            repo.get_payment("PAY-1").unwrap().status,
            PaymentStatus::Accepted
        );
    }
}
