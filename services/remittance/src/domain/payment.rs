/// 支払いモデル
///
/// 送金支払いの状態と、Lambdaのレスポンスとして返す支払い情報を表す。
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 支払いステータスのパースエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentStatusError {
    /// 未知のステータス文字列
    #[error("unknown payment status: {0}")]
    Unknown(String),
}

/// 支払いステータス
///
/// `Pending` から `Accepted` または `Rejected` のどちらか一方にだけ遷移する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// 承認待ち
    Pending,
    /// 承認済み
    Accepted,
    /// 拒否済み
    Rejected,
}

impl PaymentStatus {
    /// DB・JSONで使用する文字列表現を取得
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Accepted => "accepted",
            PaymentStatus::Rejected => "rejected",
        }
    }

    /// `reject`フラグから遷移先のステータスを決定
    pub fn decision(reject: bool) -> Self {
        if reject {
            PaymentStatus::Rejected
        } else {
            PaymentStatus::Accepted
        }
    }

    /// 承認または拒否が確定済みかどうか
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Accepted | PaymentStatus::Rejected)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = PaymentStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "accepted" => Ok(PaymentStatus::Accepted),
            "rejected" => Ok(PaymentStatus::Rejected),
            other => Err(PaymentStatusError::Unknown(other.to_string())),
        }
    }
}

/// 支払い
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// 支払い番号
    pub number: String,
    /// 現在のステータス
    pub status: PaymentStatus,
    /// 最終更新日時
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// 新しいPaymentを作成
    pub fn new(number: impl Into<String>, status: PaymentStatus, updated_at: DateTime<Utc>) -> Self {
        Self {
            number: number.into(),
            status,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_as_str() {
        assert_eq!(PaymentStatus::Pending.as_str(), "pending");
        assert_eq!(PaymentStatus::Accepted.as_str(), "accepted");
        assert_eq!(PaymentStatus::Rejected.as_str(), "rejected");
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("pending".parse::<PaymentStatus>(), Ok(PaymentStatus::Pending));
        assert_eq!("accepted".parse::<PaymentStatus>(), Ok(PaymentStatus::Accepted));
        assert_eq!("rejected".parse::<PaymentStatus>(), Ok(PaymentStatus::Rejected));
    }

    #[test]
    fn test_status_from_str_unknown() {
        let result = "ACCEPTED".parse::<PaymentStatus>();
        assert_eq!(result, Err(PaymentStatusError::Unknown("ACCEPTED".to_string())));
        assert_eq!(
            result.unwrap_err().to_string(),
            "unknown payment status: ACCEPTED"
        );
    }

    #[test]
    fn test_status_decision() {
        assert_eq!(PaymentStatus::decision(false), PaymentStatus::Accepted);
        assert_eq!(PaymentStatus::decision(true), PaymentStatus::Rejected);
    }

    #[test]
    fn test_status_is_settled() {
        assert!(!PaymentStatus::Pending.is_settled());
        assert!(PaymentStatus::Accepted.is_settled());
        assert!(PaymentStatus::Rejected.is_settled());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&PaymentStatus::Rejected).unwrap();
        assert_eq!(json, "\"rejected\"");
    }

    /// レスポンスボディとしてのJSON形式を確認
    #[test]
    fn test_payment_serializes_to_json() {
        let updated_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let payment = Payment::new("PAY-0001", PaymentStatus::Accepted, updated_at);

        let value = serde_json::to_value(&payment).unwrap();

        assert_eq!(value["number"], "PAY-0001");
        assert_eq!(value["status"], "accepted");
        assert_eq!(value["updated_at"], "2024-05-01T12:30:00Z");
    }
}
