/// 支払い承認Lambda関数
///
/// コールドスタート時にSecrets ManagerからDB接続シークレットを取得して
/// 接続プールを構築し、以降の呼び出しではイベントの支払い番号に対して
/// 承認または拒否を行う。
///
/// イベント形式: `{"number": "PAY-0001", "reject": false}`
use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use remittance::application::AcceptPaymentHandler;
use remittance::infrastructure::{
    fetch_rds_secret, init_logging, make_tls_connect, AwsSecretsOps, PostgresPaymentRepository,
    RemittanceConfig,
};
use serde_json::Value;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    let handler = match bootstrap().await {
        Ok(handler) => Arc::new(handler),
        Err(err) => {
            error!(error = %err, "初期化失敗");
            return Err(err);
        }
    };

    // Lambda関数を初期化して実行
    let func = service_fn(move |event: LambdaEvent<Value>| {
        let handler = Arc::clone(&handler);
        async move { handle(&handler, event).await }
    });
    lambda_runtime::run(func).await?;
    Ok(())
}

/// コールドスタート時の初期化
///
/// # 処理フロー
/// 1. 環境変数から設定を読み込み
/// 2. Secrets ManagerからDB接続シークレットを取得
/// 3. 接続URLとTLSコネクタを構築して接続プールを作成
/// 4. AcceptPaymentHandlerを作成
async fn bootstrap() -> Result<AcceptPaymentHandler<PostgresPaymentRepository>, Error> {
    let config = RemittanceConfig::from_env()?;
    info!(function_name = config.function_name(), "FN");

    let secrets_ops = AwsSecretsOps::from_region(config.aws_region()).await;
    let secret = fetch_rds_secret(
        &secrets_ops,
        config.data_source_secret(),
        config.secret_version_stage(),
    )
    .await?;

    let data_source_url = secret.data_source_url()?;
    info!(
        data_source_url = %data_source_url,
        pool_max_size = config.db_pool_max_size(),
        ssl_mode = config.db_ssl_mode().as_str(),
        ca_bundle = ?config.db_ca_bundle(),
        "接続URLを構築"
    );

    let tls = make_tls_connect(config.db_ca_bundle())?;
    let payment_repo = PostgresPaymentRepository::connect(
        &data_source_url,
        config.db_pool_max_size(),
        config.db_ssl_mode(),
        tls,
    )?;

    Ok(AcceptPaymentHandler::new(payment_repo))
}

/// Lambda関数のメインハンドラー
///
/// 失敗時はエラーを返してLambdaの呼び出しを失敗として扱わせる
async fn handle(
    handler: &AcceptPaymentHandler<PostgresPaymentRepository>,
    event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    let request_id = event.context.request_id.clone();

    match handler.handle_event(event.payload).await {
        Ok(response) => Ok(response),
        Err(err) => {
            error!(request_id = %request_id, error = %err, "支払い承認失敗");
            Err(err.into())
        }
    }
}
