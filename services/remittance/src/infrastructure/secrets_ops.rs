//! Secrets Manager操作モジュール
//!
//! コールドスタート時にDB接続シークレットを取得するための操作を提供する。
//! - GetSecretValueでシークレット文字列を取得
//! - 取得した文字列をRdsSecretとしてパース

use async_trait::async_trait;
use aws_sdk_secretsmanager::config::Region;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::Client as SecretsManagerClient;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{RdsSecret, RdsSecretError};

/// Secrets Manager操作のエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SecretsOpsError {
    /// AWS SDK エラー
    #[error("AWS Secrets Manager APIエラー: {0}")]
    AwsSdkError(String),
    /// SecretStringを持たないシークレット（バイナリシークレット）
    #[error("シークレット文字列がありません: {0}")]
    SecretStringMissing(String),
}

/// DB接続シークレット取得のエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataSourceError {
    #[error(transparent)]
    Secrets(#[from] SecretsOpsError),
    #[error(transparent)]
    Secret(#[from] RdsSecretError),
}

/// Secrets Manager操作トレイト（テスト用の抽象化）
#[async_trait]
pub trait SecretsOps: Send + Sync {
    /// シークレット文字列を取得する
    ///
    /// # 引数
    /// * `secret_id` - シークレットIDまたはARN
    /// * `version_stage` - バージョンステージ（例: AWSCURRENT）
    async fn get_secret_string(
        &self,
        secret_id: &str,
        version_stage: &str,
    ) -> Result<String, SecretsOpsError>;
}

/// 実際のAWS Secrets Manager SDKを使用した実装
pub struct AwsSecretsOps {
    client: SecretsManagerClient,
}

impl AwsSecretsOps {
    /// 新しいAwsSecretsOpsを作成
    pub fn new(client: SecretsManagerClient) -> Self {
        Self { client }
    }

    /// 指定リージョンのAWS設定からクライアントを作成
    pub async fn from_region(region: impl Into<String>) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.into()))
            .load()
            .await;
        let client = SecretsManagerClient::new(&config);
        Self::new(client)
    }
}

#[async_trait]
impl SecretsOps for AwsSecretsOps {
    async fn get_secret_string(
        &self,
        secret_id: &str,
        version_stage: &str,
    ) -> Result<String, SecretsOpsError> {
        info!(
            secret_id = %secret_id,
            version_stage = %version_stage,
            "GetSecretValue実行開始"
        );

        let response = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .version_stage(version_stage)
            .send()
            .await
            .map_err(|err| {
                let detail = DisplayErrorContext(&err).to_string();
                warn!(secret_id = %secret_id, error = %detail, "GetSecretValueエラー");
                SecretsOpsError::AwsSdkError(detail)
            })?;

        response
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| SecretsOpsError::SecretStringMissing(secret_id.to_string()))
    }
}

/// DB接続シークレットを取得してパースする
pub async fn fetch_rds_secret<S>(
    ops: &S,
    secret_id: &str,
    version_stage: &str,
) -> Result<RdsSecret, DataSourceError>
where
    S: SecretsOps + ?Sized,
{
    let secret_string = ops.get_secret_string(secret_id, version_stage).await?;
    let secret = RdsSecret::from_json(&secret_string)?;

    info!(
        secret_id = %secret_id,
        username = %secret.username,
        db_host = %secret.db_host,
        db_name = %secret.db_name,
        "DB接続シークレットを取得"
    );

    Ok(secret)
}
