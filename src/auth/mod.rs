//! Request authentication and authorization.
//!
//! End users present short-lived access tokens as `Authorization: Bearer`.
//! The payment provider presents a shared key as `Authorization: ApiKey`.
//! Ownership of posts is checked after the caller is identified.

mod errors;
mod extractors;
mod header;
mod mediator;
mod state;

pub use errors::AuthError;
pub use extractors::{BearerAuth, WebhookAuth};
pub use header::{
    API_KEY_SCHEME, BEARER_SCHEME, check_api_key, extract_api_key, extract_bearer,
    parse_credential,
};
pub use mediator::{authenticate, authorize_mutation, authorize_owner};
pub use state::{HasAuthBackend, HasWebhookKey};
