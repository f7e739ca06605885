/// RDS接続シークレットと接続文字列
///
/// Secrets Managerに保存されたJSONシークレットを読み取り、
/// PostgreSQLの接続URLを組み立てる。
use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use url::Url;

use super::serde_default::null_as_default;

/// userinfo部でエスケープしない文字以外をすべてエンコードする集合
///
/// 英数字と `- _ . ~ $ & + , ; =` のみそのまま残す。
const USERINFO: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

/// ログ出力時にパスワードの代わりに表示する文字列
const REDACTED_PASSWORD: &str = "****";

/// RDSシークレットのエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RdsSecretError {
    /// シークレットJSONのパースに失敗
    #[error("invalid secret JSON: {0}")]
    InvalidJson(String),
    /// 必須フィールドが欠落、または空
    #[error("missing secret field: {0}")]
    MissingField(&'static str),
    /// 組み立てたURLが不正
    #[error("invalid data source URL: {0}")]
    InvalidUrl(String),
}

/// RDS接続シークレット
///
/// RDSが自動生成するシークレットのキー名（`host`, `dbname`）も受け付ける。
/// `null`のフィールドは空文字列として扱う。
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RdsSecret {
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub password: String,
    #[serde(default, alias = "host", deserialize_with = "null_as_default")]
    pub db_host: String,
    #[serde(default, alias = "dbname", deserialize_with = "null_as_default")]
    pub db_name: String,
    /// 文字列・数値のどちらでも受け付ける
    #[serde(default, deserialize_with = "deserialize_port")]
    pub port: String,
}

impl fmt::Debug for RdsSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RdsSecret")
            .field("username", &self.username)
            .field("password", &REDACTED_PASSWORD)
            .field("db_host", &self.db_host)
            .field("db_name", &self.db_name)
            .field("port", &self.port)
            .finish()
    }
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Text(String),
        Number(u64),
    }

    Ok(match Option::<Port>::deserialize(deserializer)? {
        Some(Port::Text(text)) => text,
        Some(Port::Number(number)) => number.to_string(),
        None => String::new(),
    })
}

impl RdsSecret {
    /// シークレット文字列（JSON）からパース
    pub fn from_json(secret_string: &str) -> Result<Self, RdsSecretError> {
        serde_json::from_str(secret_string).map_err(|e| RdsSecretError::InvalidJson(e.to_string()))
    }

    /// PostgreSQL接続URLを構築
    ///
    /// 形式: `postgresql://{username}:{password}@{db_host}[:{port}]/{db_name}`
    ///
    /// ユーザー名とパスワードはパーセントエンコードする。
    /// portが空の場合はホストのみを使用する。
    pub fn data_source_url(&self) -> Result<DataSourceUrl, RdsSecretError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(RdsSecretError::MissingField("username"));
        }
        let db_host = self.db_host.trim();
        if db_host.is_empty() {
            return Err(RdsSecretError::MissingField("db_host"));
        }
        let db_name = self.db_name.trim();
        if db_name.is_empty() {
            return Err(RdsSecretError::MissingField("db_name"));
        }

        let userinfo = format!(
            "{}:{}",
            utf8_percent_encode(username, USERINFO),
            utf8_percent_encode(&self.password, USERINFO)
        );

        let port = self.port.trim();
        let authority = if port.is_empty() {
            format!("{}@{}", userinfo, db_host)
        } else {
            format!("{}@{}:{}", userinfo, db_host, port)
        };

        let url = format!("postgresql://{}/{}", authority, db_name);

        // 接続前に形式を検証しておく
        Url::parse(&url).map_err(|e| RdsSecretError::InvalidUrl(e.to_string()))?;

        Ok(DataSourceUrl(url))
    }
}

/// PostgreSQL接続URL
///
/// パスワードを含むため、`Display`はマスク済みの文字列を出力する。
#[derive(Clone, PartialEq, Eq)]
pub struct DataSourceUrl(String);

impl DataSourceUrl {
    /// 接続に使用する完全なURLを取得
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// パスワードをマスクしたURLを取得（ログ出力用）
    pub fn redacted(&self) -> String {
        match Url::parse(&self.0) {
            Ok(mut url) => {
                if url.set_password(Some(REDACTED_PASSWORD)).is_err() {
                    return format!("postgresql://{}", REDACTED_PASSWORD);
                }
                url.to_string()
            }
            Err(_) => format!("postgresql://{}", REDACTED_PASSWORD),
        }
    }
}

impl fmt::Display for DataSourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for DataSourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DataSourceUrl").field(&self.redacted()).finish()
    }
}
