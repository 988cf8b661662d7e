use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio_stream::wrappers::WatchStream;

use common::id_generator::generate_session_id;
use common::tictactoe::{TicTacToeSession, TicTacToeSessionSettings};
use common::{SessionRng, log};

use crate::messages::{ClientMessage, ServerMessage};

/// One websocket connection plays one game; the game ends with the connection.
pub async fn handle_websocket(socket: WebSocket, session_settings: TicTacToeSessionSettings) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let session = TicTacToeSession::new(
        generate_session_id(),
        &session_settings,
        SessionRng::from_random(),
    );
    let session_id = session.session_id().clone();
    log!("[session:{}] WebSocket connected", session_id);

    let mut snapshots = WatchStream::new(session.subscribe());
    let welcome = ServerMessage::Welcome {
        session_id: session_id.to_string(),
    };
    let send_session_id = session_id.clone();
    let send_task = tokio::spawn(async move {
        if let Err(e) = send_message(&mut ws_sender, &welcome).await {
            log!("[session:{}] {}", send_session_id, e);
            return;
        }
        while let Some(snapshot) = snapshots.next().await {
            if let Err(e) = send_message(&mut ws_sender, &ServerMessage::State(snapshot)).await {
                log!("[session:{}] {}", send_session_id, e);
                break;
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        let text = match result {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                log!("[session:{}] WebSocket error: {}", session_id, e);
                break;
            }
        };

        match ClientMessage::decode(text.as_str()) {
            Ok(message) => handle_client_message(&session, message).await,
            Err(e) => log!("[session:{}] {}", session_id, e),
        }
    }

    session.close().await;
    send_task.abort();
    log!("[session:{}] WebSocket disconnected", session_id);
}

async fn handle_client_message(session: &TicTacToeSession, message: ClientMessage) {
    match message {
        ClientMessage::SelectCell { index } => {
            session.select_cell(index).await;
        }
        ClientMessage::Reset => session.reset().await,
        ClientMessage::SetDifficulty { difficulty } => session.set_difficulty(difficulty).await,
    }
}

async fn send_message(
    ws_sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), String> {
    let text = message.encode()?;
    ws_sender
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| format!("Failed to send server message: {}", e))
}
