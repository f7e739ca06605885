/// 支払い承認Lambda設定
///
/// 環境変数からリージョン、シークレットID、関数名、DB接続の設定を読み込む。
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

/// シークレットのバージョンステージのデフォルト値
pub const DEFAULT_SECRET_VERSION_STAGE: &str = "AWSCURRENT";

/// DB接続プールの最大接続数のデフォルト値
pub const DEFAULT_DB_POOL_MAX_SIZE: usize = 2;

/// DB接続のTLSモード
///
/// libpqの`sslmode`のうちtokio-postgresが対応する値のみ受け付ける。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DbSslMode {
    /// TLSを使用しない
    Disable,
    /// TLSを試し、サーバーが非対応なら平文で接続
    Prefer,
    /// TLS必須
    #[default]
    Require,
}

impl DbSslMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbSslMode::Disable => "disable",
            DbSslMode::Prefer => "prefer",
            DbSslMode::Require => "require",
        }
    }
}

impl FromStr for DbSslMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disable" => Ok(DbSslMode::Disable),
            "prefer" => Ok(DbSslMode::Prefer),
            "require" => Ok(DbSslMode::Require),
            other => Err(ConfigError::InvalidValue {
                name: "DB_SSL_MODE".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// 設定のエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("環境変数が設定されていません: {0}")]
    MissingEnvVar(String),
    #[error("環境変数の値が不正です: {name}={value}")]
    InvalidValue { name: String, value: String },
}

/// 支払い承認Lambda設定
///
/// 以下の環境変数から読み込む:
/// - AWS_REGION: Secrets Managerクライアントのリージョン（必須）
/// - DATA_SOURCE_SECRET: DB接続シークレットのIDまたはARN（必須）
/// - AWS_LAMBDA_FUNCTION_NAME: Lambda関数名（必須、起動ログ用）
/// - SECRET_VERSION_STAGE: 読み取るバージョンステージ（任意、デフォルト: AWSCURRENT）
/// - DB_POOL_MAX_SIZE: DB接続プールの最大接続数（任意、デフォルト: 2）
/// - DB_SSL_MODE: disable / prefer / require（任意、デフォルト: require）
/// - DB_CA_BUNDLE: 信頼するCA証明書のPEMファイル（任意、未指定時は公開ルート証明書）
#[derive(Debug, Clone, PartialEq)]
pub struct RemittanceConfig {
    aws_region: String,
    data_source_secret: String,
    function_name: String,
    secret_version_stage: String,
    db_pool_max_size: usize,
    db_ssl_mode: DbSslMode,
    db_ca_bundle: Option<PathBuf>,
}

impl RemittanceConfig {
    /// 環境変数から設定を読み込む
    ///
    /// # エラー
    /// 必須の環境変数が未設定または空の場合、任意の環境変数の値が不正な場合はエラーを返す
    pub fn from_env() -> Result<Self, ConfigError> {
        let aws_region = required_env("AWS_REGION")?;
        let data_source_secret = required_env("DATA_SOURCE_SECRET")?;
        let function_name = required_env("AWS_LAMBDA_FUNCTION_NAME")?;

        let secret_version_stage = optional_env("SECRET_VERSION_STAGE")
            .unwrap_or_else(|| DEFAULT_SECRET_VERSION_STAGE.to_string());

        let db_pool_max_size = match optional_env("DB_POOL_MAX_SIZE") {
            Some(value) => parse_pool_size(&value)?,
            None => DEFAULT_DB_POOL_MAX_SIZE,
        };

        let db_ssl_mode = match optional_env("DB_SSL_MODE") {
            Some(value) => value.parse()?,
            None => DbSslMode::default(),
        };

        let db_ca_bundle = optional_env("DB_CA_BUNDLE").map(PathBuf::from);

        Ok(Self {
            aws_region,
            data_source_secret,
            function_name,
            secret_version_stage,
            db_pool_max_size,
            db_ssl_mode,
            db_ca_bundle,
        })
    }

    #[cfg(test)]
    pub fn new(
        aws_region: impl Into<String>,
        data_source_secret: impl Into<String>,
        function_name: impl Into<String>,
    ) -> Self {
        Self {
            aws_region: aws_region.into(),
            data_source_secret: data_source_secret.into(),
            function_name: function_name.into(),
            secret_version_stage: DEFAULT_SECRET_VERSION_STAGE.to_string(),
            db_pool_max_size: DEFAULT_DB_POOL_MAX_SIZE,
            db_ssl_mode: DbSslMode::default(),
            db_ca_bundle: None,
        }
    }

    #[cfg(test)]
    pub fn with_secret_version_stage(mut self, stage: impl Into<String>) -> Self {
        self.secret_version_stage = stage.into();
        self
    }

    #[cfg(test)]
    pub fn with_db_pool_max_size(mut self, max_size: usize) -> Self {
        self.db_pool_max_size = max_size;
        self
    }

    /// AWSリージョンを取得
    pub fn aws_region(&self) -> &str {
        &self.aws_region
    }

    /// DB接続シークレットのIDを取得
    pub fn data_source_secret(&self) -> &str {
        &self.data_source_secret
    }

    /// Lambda関数名を取得
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// シークレットのバージョンステージを取得
    pub fn secret_version_stage(&self) -> &str {
        &self.secret_version_stage
    }

    /// DB接続プールの最大接続数を取得
    pub fn db_pool_max_size(&self) -> usize {
        self.db_pool_max_size
    }

    /// DB接続のTLSモードを取得
    pub fn db_ssl_mode(&self) -> DbSslMode {
        self.db_ssl_mode
    }

    /// CAバンドルのパスを取得
    pub fn db_ca_bundle(&self) -> Option<&Path> {
        self.db_ca_bundle.as_deref()
    }
}

/// 必須の環境変数を読み込む（空文字列は未設定として扱う）
fn required_env(name: &str) -> Result<String, ConfigError> {
    optional_env(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

/// 任意の環境変数を読み込む（空文字列は未設定として扱う）
fn optional_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_pool_size(value: &str) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(ConfigError::InvalidValue {
            name: "DB_POOL_MAX_SIZE".to_string(),
            value: value.to_string(),
        }),
    }
}
