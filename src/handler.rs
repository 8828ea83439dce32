//! WebSocket connection handler
//!
//! Handles individual client connections: WebSocket handshake, login
//! handshake, frame parsing, and bidirectional communication with the
//! ChatBroker.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::broker::BrokerCommand;
use crate::error::BrokerError;
use crate::message::{Action, Frame, LoginReply, LoginRequest, Outbound};

/// Buffer size for the broker -> connection frame channel
const SESSION_CHANNEL_SIZE: usize = 32;

/// Handle a new TCP connection
///
/// Performs the WebSocket handshake, runs the login handshake to obtain
/// a session identity, then pumps frames between the socket and the
/// broker until either side goes away.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<BrokerCommand>,
) -> Result<(), BrokerError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    // WebSocket handshake
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Login handshake: prompt, then wait for the client's credentials
    let prompt = serde_json::to_string(&Frame::login_prompt())?;
    ws_sender.send(Message::Text(prompt.into())).await?;

    let login: LoginRequest = loop {
        match ws_receiver.next().await {
            Some(Ok(Message::Text(text))) => break serde_json::from_str(&text)?,
            Some(Ok(Message::Close(_))) | None => {
                debug!("{} closed before logging in", peer_addr);
                return Ok(());
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
        }
    };

    // Create channel for broker -> client frames
    let (msg_tx, mut msg_rx) = mpsc::channel::<Outbound>(SESSION_CHANNEL_SIZE);
    // kept so the final disconnect can prove which connection it belongs to
    let conn_handle = msg_tx.clone();

    // Register with the broker and wait for the issued identity
    let (reply_tx, reply_rx) = oneshot::channel();
    cmd_tx
        .send(BrokerCommand::Register {
            display_name: login.username,
            presented: login.user_id,
            handle: msg_tx,
            reply: reply_tx,
        })
        .await
        .map_err(|_| BrokerError::ChannelSend)?;
    let identity = reply_rx.await.map_err(|_| BrokerError::ChannelSend)?;

    info!("Session {} connected from {}", identity, peer_addr);

    let ack = serde_json::to_string(&LoginReply::success(identity.clone()))?;
    ws_sender.send(Message::Text(ack.into())).await?;

    // Clone cmd_tx for read task
    let cmd_tx_read = cmd_tx.clone();
    let read_identity = identity.clone();

    // Spawn read task (WebSocket -> BrokerCommand)
    let read_task = tokio::spawn(async move {
        while let Some(msg_result) = ws_receiver.next().await {
            match msg_result {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<Frame>(&text) {
                        Ok(frame) => {
                            let is_exit = frame.action == Action::Exit;
                            let cmd = BrokerCommand::Submit {
                                identity: read_identity.clone(),
                                frame,
                            };
                            if cmd_tx_read.send(cmd).await.is_err() {
                                debug!("Broker closed, ending read task for {}", read_identity);
                                break;
                            }
                            if is_exit {
                                debug!("Session {} requested exit", read_identity);
                                break;
                            }
                        }
                        Err(e) => {
                            // malformed input is treated as a disconnect
                            warn!("Malformed frame from {}: {}", read_identity, e);
                            break;
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("Session {} sent close frame", read_identity);
                    break;
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Pong is handled automatically by tungstenite
                }
                Ok(_) => {
                    // Binary or other message types - ignore
                }
                Err(e) => {
                    error!("WebSocket error for {}: {}", read_identity, e);
                    break;
                }
            }
        }
        debug!("Read task ended");
    });

    // Spawn write task (Outbound -> WebSocket)
    let write_task = tokio::spawn(async move {
        while let Some(out) = msg_rx.recv().await {
            match serde_json::to_string(&out) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, ending write task");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize frame: {}", e);
                    // Continue - don't break on serialization errors
                }
            }
        }
        debug!("Write task ended");

        // Send close frame when done
        let _ = ws_sender.close().await;
    });

    // Wait for either task to complete
    tokio::select! {
        _ = read_task => {
            debug!("Read task completed for {}", identity);
        }
        _ = write_task => {
            debug!("Write task completed for {}", identity);
        }
    }

    // Disconnect races with an earlier EXIT are fine: removal is a no-op
    let _ = cmd_tx
        .send(BrokerCommand::Disconnect {
            identity: identity.clone(),
            handle: conn_handle,
        })
        .await;

    info!("Session {} disconnected", identity);

    Ok(())
}
