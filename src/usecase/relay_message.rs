//! UseCase: メッセージ中継と応答生成
//!
//! ## 処理の流れ
//!
//! 1. 受信した生メッセージをそのままルーム全体へブロードキャストする
//!    （relay-before-interpret: 型不明・不正なエンベロープも中継する）
//! 2. エンベロープが chat 型でテキストを持つ場合のみ:
//!    a. 送信元接続のセッションに人間ターンを追加
//!    b. セッションの直近ウィンドウで GenerationBackend.generate を呼ぶ
//!    c. 応答をアシスタントターンとして追加
//!    d. AI の chat エンベロープとしてブロードキャスト
//!
//! ## 失敗ポリシー
//!
//! generate の失敗（NotReady / ローカル推論エラー）はこの層では捕捉せず
//! [`RelayError`] として伝播します。呼び出し側はその接続のループを
//! 正常系の切断として終了させます（ルーム全体には波及しない）。

use std::sync::Arc;

use crate::config::HISTORY_WINDOW;
use crate::domain::{ConnectionManager, ConversationSession, GenerationBackend, Role, RoomId};
use crate::infrastructure::dto::websocket::{Envelope, EnvelopeType};

use super::error::RelayError;

/// メッセージ中継のユースケース
pub struct RelayMessageUseCase {
    /// ConnectionManager（ライブ接続とブロードキャストの抽象化）
    connections: Arc<dyn ConnectionManager>,
    /// GenerationBackend（テキスト生成の抽象化、起動時に選択済み）
    backend: Arc<dyn GenerationBackend>,
    /// 1 応答あたりの新規トークン上限
    max_new_tokens: u32,
}

impl RelayMessageUseCase {
    /// 新しい RelayMessageUseCase を作成
    pub fn new(
        connections: Arc<dyn ConnectionManager>,
        backend: Arc<dyn GenerationBackend>,
        max_new_tokens: u32,
    ) -> Self {
        Self {
            connections,
            backend,
            max_new_tokens,
        }
    }

    /// 1 件の受信メッセージを処理
    ///
    /// # Arguments
    ///
    /// * `room_id` - 送信元接続のルーム
    /// * `raw` - 受信した生テキスト（そのまま中継される）
    /// * `session` - 送信元接続専用の会話セッション
    pub async fn execute(
        &self,
        room_id: &RoomId,
        raw: &str,
        session: &mut ConversationSession,
    ) -> Result<(), RelayError> {
        // 1. まず生メッセージを中継する
        self.connections.broadcast(room_id, raw).await;

        // 2. chat 型のエンベロープのみ生成処理へ進む
        let Ok(envelope) = serde_json::from_str::<Envelope>(raw) else {
            tracing::debug!("Relayed non-envelope message to room {}", room_id);
            return Ok(());
        };
        if envelope.r#type != EnvelopeType::Chat {
            return Ok(());
        }
        let Some(text) = envelope.text else {
            return Ok(());
        };

        session.append(Role::Human, text);

        let reply = self
            .backend
            .generate(session.window(HISTORY_WINDOW), self.max_new_tokens)
            .await?;
        session.append(Role::Assistant, reply.clone());

        let ai_envelope = Envelope::assistant_chat(reply);
        let json = serde_json::to_string(&ai_envelope).unwrap();
        self.connections.broadcast(room_id, &json).await;

        Ok(())
    }
}
