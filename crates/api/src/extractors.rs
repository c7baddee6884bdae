//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{HeaderName, request::Parts},
    response::Response,
};
use tally_shared::types::ActorId;

use crate::error::bad_request;

/// Header naming the operator behind a request.
pub static ACTOR_HEADER: HeaderName = HeaderName::from_static("x-actor-id");

/// The operator behind a request, if one was named.
///
/// Read from the optional `X-Actor-Id` header; absence means the system.
/// The header is not authenticated here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub Option<ActorId>);

impl Actor {
    /// Returns the operator id, if any.
    #[must_use]
    pub const fn id(self) -> Option<ActorId> {
        self.0
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(&ACTOR_HEADER) else {
            return Ok(Self(None));
        };

        value
            .to_str()
            .ok()
            .and_then(|raw| raw.trim().parse::<ActorId>().ok())
            .map(|id| Self(Some(id)))
            .ok_or_else(|| bad_request("invalid_actor", "X-Actor-Id must be a UUID"))
    }
}
