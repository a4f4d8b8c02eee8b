//! Services module
//!
//! Business logic services that sit between the screens and the external
//! collaborators (notification backend, identity provider, credential store).

pub mod auth;
pub mod backend;
pub mod credentials;
pub mod history;
pub mod policy;
pub mod scheduler;

pub use auth::{AuthState, IdentityProvider, OAuthConfig, ScriptedIdentityProvider};
pub use backend::{CronBackend, MemoryBackend, NotificationBackend};
pub use credentials::{CredentialStore, KeyringStore, MemoryStore, TokenCache};
pub use history::NotificationHistory;
pub use scheduler::{NotificationScheduler, PermissionGrant, Subscription};
