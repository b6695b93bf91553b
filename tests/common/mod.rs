#![allow(dead_code)]

use async_trait::async_trait;
use optimistic_sync::application::ports::{
    ApiRequest, CredentialProvider, HttpMethod, QueryFetcher, Transport,
};
use optimistic_sync::domain::entities::CacheValue;
use optimistic_sync::domain::value_objects::{CacheKey, UserId};
use optimistic_sync::infrastructure::auth::SessionCredentials;
use optimistic_sync::infrastructure::http::query_fetcher::{decode, fetch_path};
use optimistic_sync::shared::config::EngineConfig;
use optimistic_sync::shared::error::{AppError, TransportError};
use optimistic_sync::EngineState;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const VIEWER: &str = "viewer";

#[derive(Default)]
struct ServerState {
    followers: HashMap<String, (u64, bool)>,
    likes: HashMap<String, (u32, bool)>,
    suggestions: Vec<Value>,
    replies: HashMap<String, Result<Value, TransportError>>,
    requests: Vec<ApiRequest>,
    effects: usize,
    lost_responses: usize,
}

/// In-memory backend that applies each idempotency key at most once and
/// replays the stored reply for repeats.
#[derive(Default)]
pub struct FakeServer {
    state: Mutex<ServerState>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }

    pub fn with_user(self: &Arc<Self>, user_id: &str, followers: u64, followed: bool) -> Arc<Self> {
        self.lock()
            .followers
            .insert(user_id.to_string(), (followers, followed));
        Arc::clone(self)
    }

    pub fn with_post(self: &Arc<Self>, post_id: &str, likes: u32, liked: bool) -> Arc<Self> {
        self.lock()
            .likes
            .insert(post_id.to_string(), (likes, liked));
        Arc::clone(self)
    }

    pub fn with_suggestion(self: &Arc<Self>, user_id: &str, name: &str) -> Arc<Self> {
        let mut state = self.lock();
        let (count, followed) = state.followers.get(user_id).copied().unwrap_or_default();
        state.suggestions.push(json!({
            "userId": user_id,
            "displayName": name,
            "followerCount": count,
            "isFollowedByViewer": followed,
        }));
        drop(state);
        Arc::clone(self)
    }

    /// Applies the next `n` effects but reports a dropped connection instead of the reply.
    pub fn lose_next_responses(&self, n: usize) {
        self.lock().lost_responses = n;
    }

    /// Holds every reply until the returned `Notify` is signalled once per request.
    pub fn hold_responses(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn followers(&self, user_id: &str) -> (u64, bool) {
        self.lock().followers.get(user_id).copied().unwrap_or_default()
    }

    pub fn likes(&self, post_id: &str) -> (u32, bool) {
        self.lock().likes.get(post_id).copied().unwrap_or_default()
    }

    pub fn effects(&self) -> usize {
        self.lock().effects
    }

    pub fn mutation_requests(&self) -> Vec<ApiRequest> {
        self.lock()
            .requests
            .iter()
            .filter(|request| request.method != HttpMethod::Get)
            .cloned()
            .collect()
    }

    pub async fn wait_for_mutations(&self, n: usize) {
        for _ in 0..500 {
            if self.mutation_requests().len() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("server never saw {n} mutation requests");
    }

    fn apply(state: &mut ServerState, request: &ApiRequest) -> Result<Value, TransportError> {
        let segments: Vec<&str> = request.path.trim_matches('/').split('/').collect();
        match (request.method, segments.as_slice()) {
            (HttpMethod::Get, ["users", "suggestions"]) => Ok(Value::Array(state.suggestions.clone())),
            (HttpMethod::Get, ["users", id, "followers", "summary"]) => {
                let (count, followed) = state.followers.get(*id).copied().ok_or_else(|| missing(id))?;
                Ok(json!({ "followerCount": count, "isFollowedByViewer": followed }))
            }
            (HttpMethod::Get, ["posts", id, "engagement"]) => {
                let (count, liked) = state.likes.get(*id).copied().ok_or_else(|| missing(id))?;
                Ok(json!({ "likeCount": count, "isLikedByViewer": liked }))
            }
            (method, ["users", id, "follow"]) => {
                let follow = method == HttpMethod::Post;
                let entry = state.followers.get_mut(*id).ok_or_else(|| missing(id))?;
                if entry.1 == follow {
                    return Err(conflict());
                }
                entry.0 = if follow { entry.0 + 1 } else { entry.0.saturating_sub(1) };
                entry.1 = follow;
                state.effects += 1;
                Ok(json!({ "followerCount": entry.0 }))
            }
            (method, ["posts", id, "like"]) => {
                let like = method == HttpMethod::Post;
                let entry = state.likes.get_mut(*id).ok_or_else(|| missing(id))?;
                if entry.1 == like {
                    return Err(conflict());
                }
                entry.0 = if like { entry.0 + 1 } else { entry.0.saturating_sub(1) };
                entry.1 = like;
                state.effects += 1;
                Ok(json!({ "likeCount": entry.0 }))
            }
            _ => Err(TransportError::Http {
                status: 400,
                body: format!("unsupported {} {}", request.method, request.path),
            }),
        }
    }
}

fn missing(id: &str) -> TransportError {
    TransportError::Http {
        status: 404,
        body: format!("{id} not found"),
    }
}

fn conflict() -> TransportError {
    TransportError::Http {
        status: 409,
        body: "already in that state".to_string(),
    }
}

#[async_trait]
impl Transport for FakeServer {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let (reply, lost) = {
            let mut state = self.lock();
            state.requests.push(request.clone());
            let key = request.idempotency_key().map(str::to_string);
            let reply = match key.as_ref().and_then(|key| state.replies.get(key)) {
                Some(stored) => stored.clone(),
                None => {
                    let reply = Self::apply(&mut state, &request);
                    if let Some(key) = key {
                        state.replies.insert(key, reply.clone());
                    }
                    reply
                }
            };
            let lost = request.method != HttpMethod::Get && state.lost_responses > 0;
            if lost {
                state.lost_responses -= 1;
            }
            (reply, lost)
        };

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            if request.method != HttpMethod::Get {
                gate.notified().await;
            }
        }
        if lost {
            return Err(TransportError::Network("connection reset".to_string()));
        }
        reply
    }
}

#[async_trait]
impl QueryFetcher for FakeServer {
    async fn fetch(&self, key: &CacheKey) -> Result<CacheValue, AppError> {
        let payload = self
            .send(ApiRequest::new(HttpMethod::Get, fetch_path(key)))
            .await?;
        decode(key, payload)
    }
}

pub fn user(id: &str) -> UserId {
    UserId::new(id.to_string()).unwrap()
}

pub fn signed_in() -> Arc<SessionCredentials> {
    Arc::new(SessionCredentials::signed_in(user(VIEWER), "secret"))
}

pub fn engine(server: &Arc<FakeServer>, credentials: Arc<dyn CredentialProvider>) -> EngineState {
    engine_with(server, credentials, EngineConfig::default())
}

pub fn engine_with(
    server: &Arc<FakeServer>,
    credentials: Arc<dyn CredentialProvider>,
    config: EngineConfig,
) -> EngineState {
    EngineState::new(
        config,
        credentials,
        Arc::clone(server) as Arc<dyn Transport>,
        Arc::clone(server) as Arc<dyn QueryFetcher>,
    )
}

/// Lets spawned fetch tasks publish.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(5)).await;
}
