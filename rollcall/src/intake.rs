// ABOUTME: HTTP intake for live membership events plus health probes
// ABOUTME: Bridges authenticated hook payloads onto the watcher's event channel

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use rollcall_core::{MemberEvent, MemberEventSender, MemberRecord};
use serde::Deserialize;

#[derive(Clone)]
pub struct IntakeState {
    pub events: MemberEventSender,
    pub token: String,
}

/// One pushed membership transition, as posted by whatever bridges the
/// platform's real-time events into this process.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MembershipHook {
    Joined {
        member_id: String,
        #[serde(default)]
        username: String,
        #[serde(default)]
        discriminator: String,
    },
    Left {
        member_id: String,
    },
}

impl From<MembershipHook> for MemberEvent {
    fn from(hook: MembershipHook) -> Self {
        match hook {
            MembershipHook::Joined {
                member_id,
                username,
                discriminator,
            } => MemberEvent::Joined {
                record: MemberRecord::new(member_id, username, discriminator),
            },
            MembershipHook::Left { member_id } => MemberEvent::Left { member_id },
        }
    }
}

pub fn routes(state: IntakeState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/hooks/membership", post(receive_membership_hook))
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn receive_membership_hook(
    State(state): State<IntakeState>,
    headers: HeaderMap,
    Json(hook): Json<MembershipHook>,
) -> impl IntoResponse {
    if !authorized(&headers, &state.token) {
        return StatusCode::UNAUTHORIZED;
    }

    let event: MemberEvent = hook.into();
    tracing::debug!(member_id = event.member_id(), "received membership hook");
    match state.events.send(event).await {
        Ok(()) => StatusCode::ACCEPTED,
        // Receiver gone means the watcher is down; nothing useful to accept.
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn authorized(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map_or(false, |candidate| candidate == token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn joined_hook_becomes_a_joined_event() {
        let hook: MembershipHook = serde_json::from_str(
            r#"{"kind": "joined", "member_id": "1001", "username": "alice", "discriminator": "0001"}"#,
        )
        .unwrap();

        assert_eq!(
            MemberEvent::from(hook),
            MemberEvent::Joined {
                record: MemberRecord::new("1001", "alice", "0001")
            }
        );
    }

    #[test]
    fn joined_hook_display_fields_default_to_empty() {
        let hook: MembershipHook =
            serde_json::from_str(r#"{"kind": "joined", "member_id": "1001"}"#).unwrap();

        assert_eq!(
            MemberEvent::from(hook),
            MemberEvent::Joined {
                record: MemberRecord::new("1001", "", "")
            }
        );
    }

    #[test]
    fn left_hook_becomes_a_left_event() {
        let hook: MembershipHook =
            serde_json::from_str(r#"{"kind": "left", "member_id": "1001"}"#).unwrap();

        assert_eq!(
            MemberEvent::from(hook),
            MemberEvent::Left {
                member_id: "1001".to_string()
            }
        );
    }

    #[test]
    fn bearer_token_is_required_and_checked() {
        let mut headers = HeaderMap::new();
        assert!(!authorized(&headers, "secret"));

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer wrong"),
        );
        assert!(!authorized(&headers, "secret"));

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer secret"),
        );
        assert!(authorized(&headers, "secret"));
    }
}
