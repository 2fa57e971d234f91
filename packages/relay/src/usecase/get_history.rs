//! UseCase: 履歴取得

use std::sync::Arc;

use crate::domain::{ChatMessage, MessageRepository, RepositoryError};

/// ワークスペースの履歴取得のユースケース
pub struct GetHistoryUseCase {
    repository: Arc<dyn MessageRepository>,
}

impl GetHistoryUseCase {
    pub fn new(repository: Arc<dyn MessageRepository>) -> Self {
        Self { repository }
    }

    /// Stored messages of `workspace_id`, oldest first
    pub async fn execute(&self, workspace_id: &str) -> Result<Vec<ChatMessage>, RepositoryError> {
        self.repository.history(workspace_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::repository::MockMessageRepository,
        infrastructure::repository::InMemoryMessageRepository,
        usecase::test_support::member,
    };

    #[tokio::test]
    async fn test_history_is_returned_oldest_first() {
        // テスト項目: 保存されたメッセージが古い順に返る
        // given (前提条件):
        let repository = Arc::new(InMemoryMessageRepository::default());
        let alice = member("alice", "Alice");
        let later = ChatMessage::new(&alice, "ws-1".to_string(), "second".to_string(), "text".to_string(), 2000);
        let earlier = ChatMessage::new(&alice, "ws-1".to_string(), "first".to_string(), "text".to_string(), 1000);
        repository.append(later.clone()).await.unwrap();
        repository.append(earlier.clone()).await.unwrap();
        let usecase = GetHistoryUseCase::new(repository);

        // when (操作):
        let history = usecase.execute("ws-1").await.unwrap();

        // then (期待する結果):
        assert_eq!(history, vec![earlier, later]);
    }

    #[tokio::test]
    async fn test_unknown_workspace_has_empty_history() {
        // テスト項目: メッセージのないワークスペースの履歴は空
        // given (前提条件):
        let usecase = GetHistoryUseCase::new(Arc::new(InMemoryMessageRepository::default()));

        // when (操作):
        let history = usecase.execute("ws-unknown").await.unwrap();

        // then (期待する結果):
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_repository_failure_is_propagated() {
        // テスト項目: リポジトリのエラーはそのまま返る
        // given (前提条件):
        let mut repository = MockMessageRepository::new();
        repository
            .expect_history()
            .times(1)
            .returning(|_| Err(RepositoryError::Unavailable("offline".to_string())));
        let usecase = GetHistoryUseCase::new(Arc::new(repository));

        // when (操作):
        let result = usecase.execute("ws-1").await;

        // then (期待する結果):
        assert_eq!(result, Err(RepositoryError::Unavailable("offline".to_string())));
    }
}
