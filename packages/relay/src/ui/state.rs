//! Shared application state.

use std::sync::Arc;

use crate::{
    auth::TokenTable,
    domain::MessagePusher,
    usecase::{GetHistoryUseCase, MembershipUseCase, RelayTypingUseCase, SendMessageUseCase},
};

/// State shared by every handler
pub struct AppState {
    /// 認証に使うトークン表
    pub tokens: TokenTable,
    /// MessagePusher（メッセージ通知の抽象化）
    pub message_pusher: Arc<dyn MessagePusher>,
    /// MembershipUseCase（ルーム参加・退出のユースケース）
    pub membership_usecase: Arc<MembershipUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// RelayTypingUseCase（タイピング通知のユースケース）
    pub typing_usecase: Arc<RelayTypingUseCase>,
    /// GetHistoryUseCase（履歴取得のユースケース）
    pub get_history_usecase: Arc<GetHistoryUseCase>,
}
