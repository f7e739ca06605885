/// PostgreSQL接続用のTLS設定
///
/// CAバンドル（PEM）が指定されていればその証明書のみを信頼し、
/// 指定がなければwebpki-rootsの公開ルート証明書を使用する。
/// RDSのサーバー証明書はAmazon RDSのCAで署名されているため、
/// 本番ではRDSのグローバルバンドルを指定する。
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::{ClientConfig, RootCertStore};
use thiserror::Error;
use tokio_postgres_rustls::MakeRustlsConnect;

/// TLS設定のエラー型
#[derive(Debug, Error)]
pub enum TlsError {
    /// CAバンドルの読み込みに失敗
    #[error("failed to read CA bundle {path}: {message}")]
    CaBundle { path: String, message: String },

    /// CAバンドルに証明書が含まれていない
    #[error("no certificates in CA bundle: {0}")]
    NoCertificates(String),

    /// 証明書またはプロトコル設定が不正
    #[error("invalid TLS configuration: {0}")]
    Config(#[from] rustls::Error),
}

/// ルート証明書ストアを構築
pub fn root_store(ca_bundle: Option<&Path>) -> Result<RootCertStore, TlsError> {
    let mut roots = RootCertStore::empty();

    let Some(path) = ca_bundle else {
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        return Ok(roots);
    };

    let display = path.display().to_string();
    let ca_error = |message: String| TlsError::CaBundle {
        path: display.clone(),
        message,
    };

    let file = File::open(path).map_err(|e| ca_error(e.to_string()))?;
    let mut reader = BufReader::new(file);

    for cert in rustls_pemfile::certs(&mut reader) {
        let cert = cert.map_err(|e| ca_error(e.to_string()))?;
        roots.add(cert)?;
    }

    if roots.is_empty() {
        return Err(TlsError::NoCertificates(display));
    }

    Ok(roots)
}

/// tokio-postgres用のTLSコネクタを構築
pub fn make_tls_connect(ca_bundle: Option<&Path>) -> Result<MakeRustlsConnect, TlsError> {
    let roots = root_store(ca_bundle)?;

    // 他の依存が別のプロバイダを有効にしていても選択が曖昧にならないよう明示する
    let config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::aws_lc_rs::default_provider(),
    ))
    .with_safe_default_protocol_versions()?
    .with_root_certificates(roots)
    .with_no_client_auth();

    Ok(MakeRustlsConnect::new(config))
}
