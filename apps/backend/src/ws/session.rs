use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::player_view::project;
use crate::domain::GameSession;
use crate::extractors::room_code::{RoomCode, ViewerQuery};
use crate::state::app_state::AppState;
use crate::store::{RoomEvent, RoomSubscription};
use crate::ws::protocol::{ClientMsg, ErrorCode, ServerMsg, PROTOCOL_VERSION};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

/// GET /api/rooms/{code}/ws?viewer={player_id}
///
/// Unknown rooms are refused with a 404 before the upgrade.
pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    room_code: RoomCode,
    query: web::Query<ViewerQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    // Subscribe before the existence check so no write slips between them.
    let subscription = app_state.sync.subscribe(room_code.as_str());
    app_state.sync.load(room_code.as_str()).await?;

    let session = WsSession::new(
        room_code.0,
        query.viewer().map(str::to_string),
        app_state,
        subscription,
    );
    ws::start(session, &req, stream)
}

pub struct WsSession {
    conn_id: Uuid,
    room_code: String,
    viewer_id: Option<String>,
    app_state: web::Data<AppState>,
    subscription: Option<RoomSubscription>,

    /// Newest version pushed to the client; older states are dropped.
    sent_version: i32,

    last_heartbeat: Instant,
}

impl WsSession {
    fn new(
        room_code: String,
        viewer_id: Option<String>,
        app_state: web::Data<AppState>,
        subscription: RoomSubscription,
    ) -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            room_code,
            viewer_id,
            app_state,
            subscription: Some(subscription),
            sent_version: 0,
            last_heartbeat: Instant::now(),
        }
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "[WS SESSION] failed to serialize outbound message"),
        }
    }

    fn send_error_and_close(
        &self,
        ctx: &mut ws::WebsocketContext<Self>,
        code: ErrorCode,
        message: impl Into<String>,
    ) {
        let msg = ServerMsg::Error {
            code,
            message: message.into(),
        };
        Self::send_json(ctx, &msg);
        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
        ctx.stop();
    }

    /// Push `session` unless the client already has that version or newer.
    fn push_state(&mut self, ctx: &mut ws::WebsocketContext<Self>, session: &GameSession, force: bool) {
        if !force && session.version <= self.sent_version {
            debug!(
                conn_id = %self.conn_id,
                room_code = %self.room_code,
                version = session.version,
                sent = self.sent_version,
                "[WS SESSION] skipping stale room state"
            );
            return;
        }
        self.sent_version = self.sent_version.max(session.version);
        Self::send_json(
            ctx,
            &ServerMsg::RoomState {
                version: session.version,
                room: project(session, self.viewer_id.as_deref()),
            },
        );
    }

    fn close_room(&self, ctx: &mut ws::WebsocketContext<Self>) {
        Self::send_json(
            ctx,
            &ServerMsg::RoomClosed {
                room_code: self.room_code.clone(),
            },
        );
        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
        ctx.stop();
    }

    /// Load the room and push it.
    fn send_current_state(&self, ctx: &mut ws::WebsocketContext<Self>, force: bool) {
        let sync = self.app_state.sync.clone();
        let room_code = self.room_code.clone();

        ctx.spawn(
            async move { sync.load(&room_code).await }
                .into_actor(self)
                .map(move |res, actor, ctx| match res {
                    Ok(session) => actor.push_state(ctx, &session, force),
                    Err(err) if err.status().as_u16() == 404 => actor.close_room(ctx),
                    Err(err) => {
                        tracing::error!(
                            error = %err,
                            conn_id = %actor.conn_id,
                            room_code = %actor.room_code,
                            "[WS SESSION] loading room failed"
                        );
                        actor.send_error_and_close(ctx, ErrorCode::Unavailable, err.detail());
                    }
                }),
        );
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(
                    conn_id = %actor.conn_id,
                    room_code = %actor.room_code,
                    "[WS SESSION] heartbeat timed out"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(
            conn_id = %self.conn_id,
            room_code = %self.room_code,
            viewer_id = ?self.viewer_id,
            "[WS SESSION] started"
        );

        if let Some(subscription) = self.subscription.take() {
            ctx.add_stream(subscription);
        }
        self.start_heartbeat(ctx);

        // Ordering guarantee: hello_ack then room_state
        Self::send_json(
            ctx,
            &ServerMsg::HelloAck {
                protocol: PROTOCOL_VERSION,
                room_code: self.room_code.clone(),
                viewer_id: self.viewer_id.clone(),
            },
        );
        self.send_current_state(ctx, false);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!(
            conn_id = %self.conn_id,
            room_code = %self.room_code,
            "[WS SESSION] stopped"
        );
    }
}

impl StreamHandler<RoomEvent> for WsSession {
    fn handle(&mut self, event: RoomEvent, ctx: &mut Self::Context) {
        match event {
            RoomEvent::Updated(session) => self.push_state(ctx, &session, false),
            RoomEvent::Deleted { .. } => self.close_room(ctx),
        }
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        debug!(conn_id = %self.conn_id, room_code = %self.room_code, "[WS SESSION] room feed ended");
        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Away)));
        ctx.stop();
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();

                let parsed: Result<ClientMsg, _> = serde_json::from_str(&text);
                let Ok(cmd) = parsed else {
                    self.send_error_and_close(ctx, ErrorCode::BadRequest, "Malformed JSON");
                    return;
                };

                match cmd {
                    ClientMsg::Hello { protocol } => {
                        if protocol != PROTOCOL_VERSION {
                            self.send_error_and_close(
                                ctx,
                                ErrorCode::BadProtocol,
                                "Unsupported protocol version",
                            );
                            return;
                        }
                        Self::send_json(
                            ctx,
                            &ServerMsg::HelloAck {
                                protocol: PROTOCOL_VERSION,
                                room_code: self.room_code.clone(),
                                viewer_id: self.viewer_id.clone(),
                            },
                        );
                    }
                    ClientMsg::Resync => self.send_current_state(ctx, true),
                }
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
                self.send_error_and_close(ctx, ErrorCode::BadRequest, "Binary not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(
                    conn_id = %self.conn_id,
                    room_code = %self.room_code,
                    error = %err,
                    "[WS SESSION] protocol error"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}
