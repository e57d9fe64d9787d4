//! # codexec-account
//!
//! Account layer: who the user is and what they saved.
//!
//! - [`SessionAuth`]: single writer of the credential, resolves identity
//! - [`CredentialReader`]: read-only credential handle injected elsewhere
//! - [`FileRegistry`]: saved artifacts and share links

pub mod auth;
pub mod files;

pub use auth::{AuthState, CredentialReader, SessionAuth};
pub use files::FileRegistry;
