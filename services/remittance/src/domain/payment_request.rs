/// 支払い承認リクエスト
///
/// Lambdaイベントのペイロード `{"number": "...", "reject": bool}` を表す。
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::serde_default::null_as_default;
use super::PaymentStatus;

/// リクエストのパースエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    /// 支払い番号が欠落、または空
    #[error("missing payment number")]
    MissingNumber,
    /// JSON構造が不正
    #[error("malformed request: {0}")]
    Malformed(String),
}

/// 支払い承認リクエスト
///
/// 未知のフィールドは無視し、`reject`が省略または`null`の場合は`false`として扱う。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AcceptPaymentRequest {
    /// 支払い番号
    #[serde(default, deserialize_with = "null_as_default")]
    pub number: String,
    /// trueなら拒否、falseなら承認
    #[serde(default, deserialize_with = "null_as_default")]
    pub reject: bool,
}

impl AcceptPaymentRequest {
    /// イベントペイロードからリクエストを構築
    ///
    /// 支払い番号は前後の空白を取り除いて保持する。
    pub fn from_value(payload: Value) -> Result<Self, RequestError> {
        let mut request: AcceptPaymentRequest =
            serde_json::from_value(payload).map_err(|e| RequestError::Malformed(e.to_string()))?;

        let number = request.number.trim();
        if number.is_empty() {
            return Err(RequestError::MissingNumber);
        }
        request.number = number.to_string();

        Ok(request)
    }

    /// `reject`フラグから遷移先のステータスを決定
    pub fn decision(&self) -> PaymentStatus {
        PaymentStatus::decision(self.reject)
    }
}
