//! Token Management
//!
//! Token lifecycle: the storage capability, the credential vault on top of
//! it, and the service talking to the authorization server.

pub mod service;
pub mod store;
pub mod vault;

pub use service::TokenService;
pub use store::{MockTokenStore, TokenStore, UnimplementedTokenStore};
pub use vault::{CredentialVault, TOKEN_KEY};
