//! Redis relay for room writes across server instances.
//!
//! Each instance publishes a small envelope on `room:{code}` after a write.
//! Every instance pattern-subscribes to `room:*`, ignores its own envelopes,
//! reloads the room from the database and pushes it to its local hub.

use std::sync::Arc;
use std::time::Duration;

use rand::random;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::adapters::rooms_sea;
use crate::error::AppError;
use crate::store::sea::decode;
use crate::store::{updated_event, RoomHub};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    RoomUpdated {
        room_code: String,
        version: i32,
        origin: Uuid,
    },
    RoomDeleted {
        room_code: String,
        origin: Uuid,
    },
}

impl EventEnvelope {
    fn origin(&self) -> Uuid {
        match self {
            Self::RoomUpdated { origin, .. } | Self::RoomDeleted { origin, .. } => *origin,
        }
    }
}

// Subscriber retry configuration (background task)
const INITIAL_RETRY_DELAY_SECS: u64 = 1;
const MAX_RETRY_DELAY_SECS: u64 = 60;
const RETRY_DELAY_MULTIPLIER: f64 = 2.0;
const JITTER_PERCENT: f64 = 0.2;

// Publisher retry configuration (request path)
const PUBLISHER_MAX_ATTEMPTS: u32 = 3;
const PUBLISHER_INITIAL_RETRY_DELAY_MS: u64 = 50;
const PUBLISHER_MAX_RETRY_DELAY_MS: u64 = 200;

pub struct RealtimeBroker {
    instance_id: Uuid,
    publisher: Mutex<ConnectionManager>,
}

impl RealtimeBroker {
    /// Connect the publisher and start the background subscriber that feeds `hub`.
    pub async fn connect(
        redis_url: &str,
        conn: DatabaseConnection,
        hub: Arc<RoomHub>,
    ) -> Result<Arc<Self>, AppError> {
        let client = Client::open(redis_url)
            .map_err(|err| AppError::config(format!("Invalid REDIS_URL: {err}")))?;

        let manager = ConnectionManager::new(client.clone()).await.map_err(|err| {
            AppError::store_unavailable(format!(
                "Unable to initialize Redis connection manager: {err}"
            ))
        })?;

        let broker = Arc::new(Self {
            instance_id: Uuid::new_v4(),
            publisher: Mutex::new(manager),
        });

        let instance_id = broker.instance_id;
        tokio::spawn(async move {
            run_subscription_loop_with_retry(client, instance_id, conn, hub).await;
        });

        Ok(broker)
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub async fn publish_room_updated(&self, room_code: &str, version: i32) -> Result<(), AppError> {
        let envelope = EventEnvelope::RoomUpdated {
            room_code: room_code.to_string(),
            version,
            origin: self.instance_id,
        };
        self.publish_to_channel(room_channel(room_code), envelope)
            .await
    }

    pub async fn publish_room_deleted(&self, room_code: &str) -> Result<(), AppError> {
        let envelope = EventEnvelope::RoomDeleted {
            room_code: room_code.to_string(),
            origin: self.instance_id,
        };
        self.publish_to_channel(room_channel(room_code), envelope)
            .await
    }

    async fn publish_to_channel(
        &self,
        channel: String,
        envelope: EventEnvelope,
    ) -> Result<(), AppError> {
        let encoded = serde_json::to_string(&envelope)?;

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let publish_res = {
                let mut publisher = self.publisher.lock().await;
                publisher
                    .publish::<_, _, ()>(channel.clone(), encoded.clone())
                    .await
            };

            match publish_res {
                Ok(()) => return Ok(()),
                Err(err) => {
                    if attempt >= PUBLISHER_MAX_ATTEMPTS || !is_transient(&err) {
                        return Err(AppError::store_unavailable(format!(
                            "Failed to publish room event to Redis: {err}"
                        )));
                    }

                    let delay_ms = PUBLISHER_INITIAL_RETRY_DELAY_MS
                        .saturating_mul(2_u64.pow(attempt - 1))
                        .min(PUBLISHER_MAX_RETRY_DELAY_MS);
                    warn!(
                        error = %err,
                        attempt,
                        retry_delay_ms = delay_ms,
                        "Redis publish failed, retrying"
                    );
                    sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}

fn room_channel(room_code: &str) -> String {
    format!("room:{room_code}")
}

fn parse_room_channel(channel: &str) -> Option<&str> {
    channel.strip_prefix("room:").filter(|code| !code.is_empty())
}

fn is_transient(err: &redis::RedisError) -> bool {
    let msg = err.to_string().to_lowercase();
    if msg.contains("authentication") || msg.contains("invalid") || msg.contains("unsupported") {
        return false;
    }
    msg.contains("connection")
        || msg.contains("timed out")
        || msg.contains("timeout")
        || msg.contains("broken pipe")
        || msg.contains("io error")
}

fn calculate_retry_delay(attempt: u32) -> Duration {
    let base_delay =
        INITIAL_RETRY_DELAY_SECS as f64 * RETRY_DELAY_MULTIPLIER.powi(attempt as i32 - 1);
    let capped_delay = base_delay.min(MAX_RETRY_DELAY_SECS as f64);

    let jitter_range = capped_delay * JITTER_PERCENT;
    let jitter = (random::<f64>() * 2.0 - 1.0) * jitter_range;
    Duration::from_secs_f64((capped_delay + jitter).max(0.1))
}

async fn run_subscription_loop_with_retry(
    client: Client,
    instance_id: Uuid,
    conn: DatabaseConnection,
    hub: Arc<RoomHub>,
) {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match run_subscription_loop(&client, instance_id, &conn, &hub).await {
            Ok(()) => {
                info!("Redis subscription loop completed normally");
                break;
            }
            Err(err) => {
                let delay = calculate_retry_delay(attempt);
                warn!(
                    error = %err,
                    attempt,
                    retry_delay_secs = delay.as_secs_f64(),
                    "Redis subscription failed, retrying"
                );
                sleep(delay).await;
                if attempt >= 20 {
                    attempt = 10;
                }
            }
        }
    }
}

async fn run_subscription_loop(
    client: &Client,
    instance_id: Uuid,
    conn: &DatabaseConnection,
    hub: &RoomHub,
) -> Result<(), AppError> {
    let mut pubsub = client.get_async_pubsub().await.map_err(|err| {
        AppError::store_unavailable(format!("Failed to connect to Redis for subscription: {err}"))
    })?;
    pubsub.psubscribe("room:*").await.map_err(|err| {
        AppError::store_unavailable(format!("Failed to subscribe to room:*: {err}"))
    })?;
    info!("Redis subscription established on room:*");

    let mut stream = pubsub.into_on_message();
    while let Some(msg) = stream.next().await {
        let Ok(channel) = msg.get_channel::<String>() else {
            continue;
        };
        let Ok(payload) = msg.get_payload::<String>() else {
            continue;
        };
        let envelope = match serde_json::from_str::<EventEnvelope>(&payload) {
            Ok(envelope) => envelope,
            Err(err) => {
                error!(error = %err, channel = %channel, "Failed to decode room envelope");
                continue;
            }
        };
        if envelope.origin() == instance_id {
            continue;
        }
        relay(conn, hub, &channel, envelope).await;
    }

    warn!("Redis subscription stream ended, connection lost");
    Err(AppError::store_unavailable(
        "Redis subscription stream ended unexpectedly",
    ))
}

async fn relay(conn: &DatabaseConnection, hub: &RoomHub, channel: &str, envelope: EventEnvelope) {
    if hub.subscriber_count(parse_room_channel(channel).unwrap_or_default()) == 0 {
        return;
    }
    match envelope {
        EventEnvelope::RoomUpdated {
            room_code, version, ..
        } => match rooms_sea::find_by_code(conn, &room_code).await {
            Ok(Some(model)) => match decode(model) {
                Ok(doc) if doc.version >= version => {
                    if let Some(event) = updated_event(&room_code, &doc) {
                        hub.publish(&room_code, event);
                    }
                }
                Ok(doc) => {
                    debug!(room_code = %room_code, version, stored = doc.version, "Relayed version not yet visible");
                }
                Err(err) => warn!(room_code = %room_code, error = %err, "Relayed room is corrupt"),
            },
            Ok(None) => debug!(room_code = %room_code, "Relayed room no longer exists"),
            Err(err) => warn!(room_code = %room_code, error = %err, "Failed to reload relayed room"),
        },
        EventEnvelope::RoomDeleted { room_code, .. } => hub.close(&room_code),
    }
}
