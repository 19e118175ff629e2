//! Clients for the hosted backend: auth provider, table store, and
//! row-change feed. All three are external managed services; this module
//! only consumes them.

mod auth;
mod error;
mod realtime;
mod rest;
mod store;
mod types;

pub use auth::{AuthClient, AuthSession};
pub use error::BackendError;
pub use realtime::RealtimeFeed;
pub use rest::RestStore;
pub use store::{ChangeFeed, MatchStore, MatchSubscription};
pub use types::{
    CounterPatch, MatchPatch, MatchRow, NewMatch, NewMove, NewProfile, ProfileRow,
};
