/// 支払い承認ハンドラー
///
/// Lambdaが呼び出された際に、支払いを承認または拒否する
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{AcceptPaymentRequest, Payment, PaymentStatus, RequestError};
use crate::infrastructure::{PaymentRepository, RepositoryError};

/// 支払い承認ハンドラーのエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AcceptPaymentError {
    /// リクエストが不正
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] RequestError),
    /// 支払いが存在しない
    #[error("Payment not found: {0}")]
    NotFound(String),
    /// 別の結果で既に確定している
    #[error("Payment {number} is already {status}")]
    AlreadySettled {
        number: String,
        status: PaymentStatus,
    },
    /// 更新中に別の処理がステータスを変更した
    #[error("Payment {0} was modified concurrently")]
    Conflict(String),
    /// リポジトリ操作エラー
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    /// レスポンスのシリアライズに失敗
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// 支払いの承認・拒否を行うハンドラー
///
/// PaymentRepositoryを使用して支払いを取得し、
/// 承認待ちの支払いを承認済みまたは拒否済みに遷移させる
pub struct AcceptPaymentHandler<PR>
where
    PR: PaymentRepository,
{
    /// 支払いリポジトリ
    payment_repo: PR,
}

impl<PR> AcceptPaymentHandler<PR>
where
    PR: PaymentRepository,
{
    /// 新しいAcceptPaymentHandlerを作成
    pub fn new(payment_repo: PR) -> Self {
        Self { payment_repo }
    }

    /// Lambdaイベントを処理
    ///
    /// # 処理フロー
    /// 1. ペイロードをAcceptPaymentRequestにパース
    /// 2. リクエストの判定結果へ支払いを遷移
    /// 3. 結果の支払いをJSONで返却
    pub async fn handle_event(&self, payload: Value) -> Result<Value, AcceptPaymentError> {
        let request = AcceptPaymentRequest::from_value(payload)?;
        let target = request.decision();

        info!(number = %request.number, reject = request.reject, target = %target, "REQ");

        let payment = self.settle(&request.number, target).await;

        match &payment {
            Ok(payment) => {
                info!(
                    number = %payment.number,
                    status = %payment.status,
                    updated_at = %payment.updated_at,
                    "RES"
                );
            }
            Err(err) => {
                warn!(number = %request.number, error = %err, "RES");
            }
        }

        serde_json::to_value(payment?).map_err(|e| AcceptPaymentError::Serialization(e.to_string()))
    }

    /// 支払いを承認または拒否
    ///
    /// # 引数
    /// * `number` - 支払い番号
    /// * `reject` - trueなら拒否、falseなら承認
    pub async fn accept_payment(
        &self,
        number: &str,
        reject: bool,
    ) -> Result<Payment, AcceptPaymentError> {
        self.settle(number, PaymentStatus::decision(reject)).await
    }

    /// 支払いを`target`のステータスへ確定させる
    ///
    /// # 処理フロー
    /// 1. 支払い番号で支払いを取得
    /// 2. 既に同じ結果で確定していればそのまま返却（再試行を冪等にする）
    /// 3. 別の結果で確定していればエラー
    /// 4. 承認待ちの支払いを条件付きで更新
    async fn settle(
        &self,
        number: &str,
        target: PaymentStatus,
    ) -> Result<Payment, AcceptPaymentError> {
        let payment = self
            .payment_repo
            .find_by_number(number)
            .await?
            .ok_or_else(|| AcceptPaymentError::NotFound(number.to_string()))?;

        if payment.status == target {
            info!(number = %number, status = %payment.status, "支払いは既に処理済み");
            return Ok(payment);
        }

        if payment.status.is_settled() {
            return Err(AcceptPaymentError::AlreadySettled {
                number: number.to_string(),
                status: payment.status,
            });
        }

        self.payment_repo
            .update_status(number, payment.status, target)
            .await?
            .ok_or_else(|| AcceptPaymentError::Conflict(number.to_string()))
    }
}
