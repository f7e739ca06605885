/// ログ基盤モジュール
///
/// CloudWatch Logsに取り込むための1行1JSONの構造化ログを設定する。
/// イベントのフィールド（`number`, `status`など）はトップレベルのキーとして出力する。
use std::sync::Once;

use tracing::Subscriber;
use tracing_subscriber::{
    fmt::MakeWriter, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// `RUST_LOG`が未設定または不正な場合のフィルタ
const DEFAULT_FILTER: &str = "info";

static INIT: Once = Once::new();

/// JSONログレイヤーを構築
///
/// CloudWatchが取り込み時刻を付与するため、タイムスタンプは出力しない。
fn json_layer<S, W>(make_writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .without_time()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .flatten_event(true)
        .with_current_span(false)
        .with_writer(make_writer)
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Lambda環境向けのログサブスクライバーを初期化する
///
/// 標準出力にJSONで出力する。複数回呼び出しても最初の1回のみ初期化する。
///
/// # 使用例
/// ```ignore
/// use remittance::infrastructure::init_logging;
///
/// init_logging();
/// tracing::info!(number = "PAY-0001", "REQ");
/// ```
pub fn init_logging() {
    INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(env_filter(DEFAULT_FILTER))
            .with(json_layer(std::io::stdout))
            .init();
    });
}

/// テスト用のログサブスクライバーを初期化する（人間が読みやすい形式）
#[cfg(test)]
pub fn init_test_logging() {
    static TEST_INIT: Once = Once::new();

    TEST_INIT.call_once(|| {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_test_writer()
            .with_target(true)
            .compact();

        let _ = tracing_subscriber::registry()
            .with(env_filter("debug"))
            .with(fmt_layer)
            .try_init();
    });
}
