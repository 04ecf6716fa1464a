//! Domain models for ogsession.
//!
//! ## Submodules
//!
//! - [`credentials`] - Login input (username, password, OTP secret)
//! - [`server`] - Lobby directory entries, accounts, and server metadata
//! - [`page`] - Page kinds and fetched page bodies
//! - [`session`] - Read-only session snapshots
//! - [`task`] - Arbiter priority classes

mod credentials;
mod page;
mod server;
mod session;
mod task;

pub use credentials::Credentials;
pub use page::{Page, PageKind, Resources};
pub use server::{Account, AccountServer, Server, ServerData, ServerIdentity};
pub use session::{ChatEndpoint, SessionSnapshot};
pub use task::Priority;
