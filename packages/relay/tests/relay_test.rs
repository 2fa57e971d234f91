//! Integration tests of the relay over real sockets.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use huddle_relay::{auth::TokenTable, ui::Server};
use huddle_shared::{
    protocol::{
        ClientEvent, HistoryResponse, SendMessagePayload, ServerEvent, UserStoppedTypingPayload,
        UserTypingPayload, WorkspaceRef,
    },
    time::FixedClock,
};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot,
    task::JoinHandle,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream,
    tungstenite::{
        self, Message,
        client::IntoClientRequest,
        http::{HeaderValue, StatusCode, header::AUTHORIZATION},
    },
};

const NOW: i64 = 1672534800000;
const TOKENS: &str = "alice-token=alice:Alice,bob-token=bob:Bob,carol-token=carol:Carol";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Relay served in-process on an ephemeral port
struct TestRelay {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestRelay {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let tokens: TokenTable = TOKENS.parse().unwrap();
        let server = Server::in_memory(tokens, 100, Arc::new(FixedClock::new(NOW)));

        let (shutdown, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            server
                .serve(listener, async {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown: Some(shutdown),
            handle,
        }
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn connect(&self, token: &str) -> Result<Socket, tungstenite::Error> {
        let mut request = format!("ws://{}/ws", self.addr)
            .into_client_request()
            .unwrap();
        request.headers_mut().insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        let (socket, _) = tokio_tungstenite::connect_async(request).await?;
        Ok(socket)
    }

    /// Stop accepting connections and drop the open ones
    async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.handle.abort();
        let _ = (&mut self.handle).await;
    }
}

async fn send(socket: &mut Socket, event: ClientEvent) {
    let text = serde_json::to_string(&event).unwrap();
    socket.send(Message::text(text)).await.unwrap();
}

async fn recv(socket: &mut Socket) -> ServerEvent {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for a relay event")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn assert_silent(socket: &mut Socket) {
    let result = tokio::time::timeout(Duration::from_millis(200), socket.next()).await;
    assert!(result.is_err(), "unexpected frame: {:?}", result);
}

fn join(workspace_id: &str) -> ClientEvent {
    ClientEvent::JoinWorkspace(WorkspaceRef::new(workspace_id))
}

fn say(workspace_id: &str, message: &str) -> ClientEvent {
    ClientEvent::SendMessage(SendMessagePayload {
        workspace_id: workspace_id.to_string(),
        message: message.to_string(),
        kind: "text".to_string(),
    })
}

/// Join and wait until the relay has applied it, using the echo of a message
async fn join_and_settle(socket: &mut Socket, workspace_id: &str, marker: &str) {
    send(socket, join(workspace_id)).await;
    send(socket, say(workspace_id, marker)).await;
    loop {
        if let ServerEvent::NewMessage(message) = recv(socket).await
            && message.content == marker
        {
            return;
        }
    }
}

#[tokio::test]
async fn test_health_check_reports_connections() {
    // テスト項目: ヘルスチェックが ok と接続数を返す
    // given (前提条件):
    let relay = TestRelay::start().await;
    let _alice = relay.connect("alice-token").await.unwrap();

    // when (操作):
    let mut body = serde_json::Value::Null;
    for _ in 0..50 {
        body = reqwest::get(relay.http_url("/api/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if body["connections"] == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    // then (期待する結果):
    assert_eq!(body, serde_json::json!({"status": "ok", "connections": 1}));
    relay.stop().await;
}

#[tokio::test]
async fn test_upgrade_with_unknown_token_is_unauthorized() {
    // テスト項目: 未知のトークンでの WebSocket 接続は 401 で拒否される
    // given (前提条件):
    let relay = TestRelay::start().await;

    // when (操作):
    let result = relay.connect("mallory-token").await;

    // then (期待する結果):
    match result {
        Err(tungstenite::Error::Http(response)) => {
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED)
        }
        other => panic!("expected HTTP 401, got {:?}", other.map(|_| ())),
    }
    relay.stop().await;
}

#[tokio::test]
async fn test_history_requires_bearer_token() {
    // テスト項目: トークンなしの履歴取得は 401 になる
    // given (前提条件):
    let relay = TestRelay::start().await;

    // when (操作):
    let response = reqwest::get(relay.http_url("/workspaces/ws-1/messages"))
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    relay.stop().await;
}

#[tokio::test]
async fn test_message_reaches_room_and_history_only() {
    // テスト項目: メッセージは同じ部屋の全員（送信者含む）に届き、履歴に残り、他の部屋には届かない
    // given (前提条件):
    let relay = TestRelay::start().await;
    let mut alice = relay.connect("alice-token").await.unwrap();
    let mut bob = relay.connect("bob-token").await.unwrap();
    let mut carol = relay.connect("carol-token").await.unwrap();
    join_and_settle(&mut bob, "ws-1", "bob here").await;
    join_and_settle(&mut carol, "ws-2", "carol here").await;
    join_and_settle(&mut alice, "ws-1", "alice here").await;
    // bob は alice の参加メッセージを受け取っている
    assert!(matches!(recv(&mut bob).await, ServerEvent::NewMessage(m) if m.content == "alice here"));

    // when (操作):
    send(&mut alice, say("ws-1", "hello")).await;

    // then (期待する結果):
    for socket in [&mut alice, &mut bob] {
        match recv(socket).await {
            ServerEvent::NewMessage(message) => {
                assert_eq!(message.content, "hello");
                assert_eq!(message.sender_id, "alice");
                assert_eq!(message.sender_name, "Alice");
                assert_eq!(message.timestamp, NOW);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
    assert_silent(&mut carol).await;

    let history: HistoryResponse = reqwest::Client::new()
        .get(relay.http_url("/workspaces/ws-1/messages"))
        .bearer_auth("carol-token")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let contents: Vec<_> = history.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["bob here", "alice here", "hello"]);
    relay.stop().await;
}

#[tokio::test]
async fn test_typing_is_relayed_to_others_and_cleared_on_departure() {
    // テスト項目: タイピング通知は送信者以外に届き、切断時には user-stopped-typing が届く
    // given (前提条件):
    let relay = TestRelay::start().await;
    let mut alice = relay.connect("alice-token").await.unwrap();
    let mut bob = relay.connect("bob-token").await.unwrap();
    join_and_settle(&mut bob, "ws-1", "bob here").await;
    join_and_settle(&mut alice, "ws-1", "alice here").await;
    assert!(matches!(recv(&mut bob).await, ServerEvent::NewMessage(_)));

    // when (操作):
    send(&mut alice, ClientEvent::TypingStart(WorkspaceRef::new("ws-1"))).await;

    // then (期待する結果):
    assert_eq!(
        recv(&mut bob).await,
        ServerEvent::UserTyping(UserTypingPayload {
            user_id: "alice".to_string(),
            user_name: "Alice".to_string(),
            workspace_id: Some("ws-1".to_string()),
        })
    );
    assert_silent(&mut alice).await;

    // when (操作): alice が切断する
    alice.close(None).await.unwrap();

    // then (期待する結果):
    assert_eq!(
        recv(&mut bob).await,
        ServerEvent::UserStoppedTyping(UserStoppedTypingPayload {
            user_id: "alice".to_string(),
            workspace_id: Some("ws-1".to_string()),
        })
    );
    relay.stop().await;
}
