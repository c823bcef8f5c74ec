//! Conversation channel
//!
//! One socket per call. The server greets first, then answers every inbound
//! utterance with exactly one event until the caller says an exit keyword, goes
//! quiet for the idle window, disconnects, or sends something the channel cannot
//! handle.
//!
//! ```text
//! CONNECTING -> GREETED -> (AWAITING_INPUT <-> RESPONDING) -> CLOSING -> CLOSED
//! ```
//!
//! The dialogue binding is held by a [`ConversationGuard`], so it is released on
//! every path out of [`run_conversation`], including panics.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Extension,
    extract::{
        Path, State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::messages::{
    ChannelEvent, ChannelFrame, MAX_TEXT_SIZE, MessageRoute, decode_utterance, is_exit_keyword,
};
use super::{close_socket, spawn_sender};
use crate::core::dialogue::Persona;
use crate::core::orchestrator::{ConversationGuard, Orchestrator};
use crate::core::session::{SessionError, SessionStore, TurnRole};
use crate::middleware::ClientIp;
use crate::state::{AppState, ConnectionSlot};

/// Sent when a binary frame arrives on the text channel
pub const UNSUPPORTED_FRAME_MESSAGE: &str = "Unsupported message on conversation channel";

/// Sent when the call was ended while the channel was open
pub const CALL_ENDED_MESSAGE: &str = "Call is no longer active";

/// Why a conversation channel closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Caller sent an exit keyword
    Exit,
    /// Idle window elapsed
    Timeout,
    /// Socket closed or errored, or the outbound side went away
    Disconnect,
    /// Unhandled inbound frame
    Fault,
    /// The call was ended elsewhere
    Ended,
    /// Refused before the greeting
    Rejected,
}

/// Upgrade `GET /ws/calls/{call_id}/{voice_profile}` to a conversation channel.
///
/// The call need not exist in the session store; turns are only recorded when
/// it does.
pub async fn conversation_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path((call_id, voice_profile)): Path<(String, String)>,
    client_ip: Option<Extension<ClientIp>>,
) -> Response {
    info!(call_id = %call_id, voice_profile = %voice_profile, "Conversation upgrade requested");

    let slot = client_ip.map(|Extension(ClientIp(ip))| ConnectionSlot::new(state.clone(), ip));

    ws.max_frame_size(MAX_TEXT_SIZE)
        .max_message_size(MAX_TEXT_SIZE)
        .on_upgrade(move |socket| async move {
            let _slot = slot;
            handle_conversation_socket(socket, state, call_id, voice_profile).await;
        })
}

async fn handle_conversation_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    call_id: String,
    voice_profile: String,
) {
    let (sender, receiver) = socket.split();
    let (message_tx, sender_task) = spawn_sender(sender);

    match voice_profile.parse::<Persona>() {
        Ok(persona) => {
            let ctx = ConversationContext {
                call_id,
                persona,
                idle_timeout: state.config.conversation_idle_timeout(),
                sessions: state.sessions.clone(),
                orchestrator: state.orchestrator.clone(),
            };
            let inbound = receiver.map(|frame| frame.map(ChannelFrame::from));
            run_conversation(inbound, &message_tx, &ctx).await;
        }
        Err(e) => {
            warn!(call_id = %call_id, error = %e, "Rejected conversation channel");
            let _ = message_tx
                .send(MessageRoute::Outgoing(ChannelEvent::error(e.to_string())))
                .await;
        }
    }

    close_socket(message_tx, sender_task).await;
}

/// Everything one conversation needs
#[derive(Clone)]
pub struct ConversationContext {
    pub call_id: String,
    pub persona: Persona,
    pub idle_timeout: Duration,
    pub sessions: Arc<SessionStore>,
    pub orchestrator: Arc<Orchestrator>,
}

/// Failure inside a single step of the loop
enum StepError {
    Outbound,
    Ended,
}

impl From<SessionError> for StepError {
    fn from(_: SessionError) -> Self {
        Self::Ended
    }
}

/// Drive one conversation to completion.
///
/// `inbound` yields decoded frames; events go to `outbound`. The caller is
/// responsible for closing the transport afterwards.
pub async fn run_conversation<S, E>(
    mut inbound: S,
    outbound: &mpsc::Sender<MessageRoute>,
    ctx: &ConversationContext,
) -> CloseReason
where
    S: Stream<Item = Result<ChannelFrame, E>> + Unpin,
    E: Display,
{
    if let Some(expected) = ctx.sessions.persona(&ctx.call_id)
        && expected != ctx.persona
    {
        warn!(
            call_id = %ctx.call_id,
            requested = %ctx.persona,
            expected = %expected,
            "Voice profile does not match call"
        );
        let message = format!(
            "Voice profile {} does not match call voice profile {}",
            ctx.persona, expected
        );
        let _ = send(outbound, ChannelEvent::error(message)).await;
        return CloseReason::Rejected;
    }

    let guard = match ctx.orchestrator.bind(ctx.call_id.clone(), ctx.persona) {
        Ok(guard) => guard,
        Err(e) => {
            let _ = send(outbound, ChannelEvent::error(e.to_string())).await;
            return CloseReason::Rejected;
        }
    };
    info!(call_id = %ctx.call_id, voice_profile = %ctx.persona, "Conversation channel opened");

    if let Err(e) = greet(&guard, outbound, ctx).await {
        return close_reason_for(e, outbound).await;
    }

    let reason = loop {
        let next = match tokio::time::timeout(ctx.idle_timeout, inbound.next()).await {
            Ok(next) => next,
            Err(_) => {
                info!(
                    call_id = %ctx.call_id,
                    idle_seconds = ctx.idle_timeout.as_secs(),
                    "Conversation idle, closing"
                );
                let _ = send(outbound, ChannelEvent::timeout()).await;
                break CloseReason::Timeout;
            }
        };

        let frame = match next {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                warn!(call_id = %ctx.call_id, error = %e, "Conversation socket error");
                break CloseReason::Disconnect;
            }
            None => {
                debug!(call_id = %ctx.call_id, "Conversation socket closed by client");
                break CloseReason::Disconnect;
            }
        };

        match frame {
            ChannelFrame::Text(payload) => {
                let utterance = decode_utterance(&payload);
                let step = if is_exit_keyword(&utterance) {
                    close(&guard, &utterance, outbound, ctx).await.map(|_| true)
                } else {
                    reply(&guard, utterance, outbound, ctx).await.map(|_| false)
                };

                match step {
                    Ok(true) => break CloseReason::Exit,
                    Ok(false) => {}
                    Err(e) => break close_reason_for(e, outbound).await,
                }
            }
            ChannelFrame::Binary(data) => {
                warn!(
                    call_id = %ctx.call_id,
                    bytes = data.len(),
                    "Binary frame on conversation channel"
                );
                let _ = send(outbound, ChannelEvent::error(UNSUPPORTED_FRAME_MESSAGE)).await;
                break CloseReason::Fault;
            }
            ChannelFrame::Control => {}
            ChannelFrame::Close => {
                debug!(call_id = %ctx.call_id, "Conversation close frame received");
                break CloseReason::Disconnect;
            }
        }
    };

    info!(call_id = %ctx.call_id, reason = ?reason, "Conversation channel closed");
    drop(guard);
    reason
}

async fn greet(
    guard: &ConversationGuard,
    outbound: &mpsc::Sender<MessageRoute>,
    ctx: &ConversationContext,
) -> Result<(), StepError> {
    let greeting = guard.start()?;
    persist(ctx, TurnRole::Assistant, &greeting);
    send(
        outbound,
        ChannelEvent::Greeting {
            message: greeting,
            call_id: ctx.call_id.clone(),
        },
    )
    .await
}

async fn reply(
    guard: &ConversationGuard,
    utterance: String,
    outbound: &mpsc::Sender<MessageRoute>,
    ctx: &ConversationContext,
) -> Result<(), StepError> {
    let response = guard.turn(&utterance)?;
    persist(ctx, TurnRole::User, &utterance);
    persist(ctx, TurnRole::Assistant, &response);
    send(
        outbound,
        ChannelEvent::Response {
            message: response,
            user_input: utterance,
            call_id: ctx.call_id.clone(),
        },
    )
    .await
}

async fn close(
    guard: &ConversationGuard,
    utterance: &str,
    outbound: &mpsc::Sender<MessageRoute>,
    ctx: &ConversationContext,
) -> Result<(), StepError> {
    let closing = guard.finish()?;
    persist(ctx, TurnRole::User, utterance);
    persist(ctx, TurnRole::Assistant, &closing);
    send(
        outbound,
        ChannelEvent::Closing {
            message: closing,
            call_id: ctx.call_id.clone(),
        },
    )
    .await
}

async fn close_reason_for(
    error: StepError,
    outbound: &mpsc::Sender<MessageRoute>,
) -> CloseReason {
    match error {
        StepError::Outbound => CloseReason::Disconnect,
        StepError::Ended => {
            let _ = send(outbound, ChannelEvent::error(CALL_ENDED_MESSAGE)).await;
            CloseReason::Ended
        }
    }
}

/// Record a turn when the call lives in the store; typed text has confidence 1.0.
fn persist(ctx: &ConversationContext, role: TurnRole, text: &str) {
    if let Err(SessionError::NotFound(_)) =
        ctx.sessions.append_turn(&ctx.call_id, role, text, 1.0)
    {
        debug!(call_id = %ctx.call_id, role = %role, "Call not in store, turn not recorded");
    }
}

async fn send(outbound: &mpsc::Sender<MessageRoute>, event: ChannelEvent) -> Result<(), StepError> {
    outbound
        .send(MessageRoute::Outgoing(event))
        .await
        .map_err(|_| StepError::Outbound)
}
