// アプリケーション層モジュール
pub mod accept_payment_handler;

// 再エクスポート
pub use accept_payment_handler::{AcceptPaymentError, AcceptPaymentHandler};
