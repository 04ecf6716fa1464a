// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

//! # ogsession Session
//!
//! Everything between a set of credentials and a usable game session.
//!
//! ## Layers
//!
//! - [`LobbyApi`] - Lobby and auth endpoints
//! - [`ChallengeBridge`] - Fetches challenge material and posts answers
//! - [`LoginMachine`] - Credentials to bound universe, with a token fast path
//! - [`SessionController`] - Pages, actions, token cache, re-login on loss
//! - [`PriorityArbiter`] - One task at a time, elevated tasks first
//! - [`SessionHandle`] - Cloneable front door combining the last two
//!
//! ## Example
//!
//! ```rust,ignore
//! use ogsession_core::{Credentials, PageKind};
//! use ogsession_session::{FetchOptions, SessionController, SessionHandle, SessionSettings};
//! use tokio_util::sync::CancellationToken;
//!
//! let settings = SessionSettings::new("Zibal", "en");
//! let controller = SessionController::new(settings, Credentials::new("me@example.com", "pw"))?;
//! let session = SessionHandle::new(controller);
//!
//! let cancel = CancellationToken::new();
//! session.login(&cancel).await?;
//! let overview = session.fetch_page(PageKind::Overview, FetchOptions::default(), &cancel).await?;
//! ```

pub mod arbiter;
pub mod challenge;
pub mod chat;
pub mod controller;
pub mod handle;
pub mod lobby;
pub mod login;
pub mod settings;
pub mod totp;

pub use arbiter::{HeldSlot, PriorityArbiter, SlotGuard};
pub use challenge::ChallengeBridge;
pub use chat::ChatSupervisor;
pub use controller::{ActionResult, ActionSpec, FetchOptions, SessionController, SharedSnapshot};
pub use handle::{ManualSession, SessionFuture, SessionHandle};
pub use lobby::{CHALLENGE_HEADER, GameConfiguration, LobbyApi, find_server_account, parse_server_data};
pub use login::{LoginMachine, LoginOutcome, LoginState, LoginTarget};
pub use settings::{Endpoints, SessionSettings};
