//! UseCase 層のエラー型定義

use thiserror::Error;

use crate::domain::GenerateError;

/// メッセージ処理のエラー
///
/// 生成失敗（NotReady またはローカル推論エラー）は接続ループを終了させる
/// 致命的エラーとして呼び出し側へ伝播します。リモートプロバイダの失敗は
/// バックエンド内部で謝罪テキストに変換済みのため、ここには現れません。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("generation failed: {0}")]
    Generation(#[from] GenerateError),
}
