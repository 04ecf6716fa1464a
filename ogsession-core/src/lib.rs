// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # ogsession Core
//!
//! Core types, errors, and capability traits shared by every ogsession crate.
//!
//! ## Key Types
//!
//! ### Session Types
//! - [`SessionSnapshot`] - Read-only copy of the live session state
//! - [`Credentials`] - Login input
//! - [`ServerIdentity`], [`Server`], [`Account`], [`ServerData`] - Universe binding
//!
//! ### Pages
//! - [`PageKind`] - Addressable in-game pages
//! - [`Page`] - A fetched page body
//!
//! ### Capabilities
//! - [`PageExtractor`] - Version-specific page reading
//! - [`ChallengeSolver`] - Interactive challenge answering
//! - [`DeviceFingerprint`] - Lobby device fingerprint
//!
//! ### Errors
//! - [`SessionError`] - The error taxonomy every operation returns

pub mod error;
pub mod models;
pub mod traits;

pub use error::SessionError;

pub use models::{
    // Login input
    Credentials,
    // Universe binding
    Account,
    AccountServer,
    Server,
    ServerData,
    ServerIdentity,
    // Pages
    Page,
    PageKind,
    Resources,
    // Session
    ChatEndpoint,
    SessionSnapshot,
    // Arbiter
    Priority,
};

pub use traits::{ChallengeSolver, DeviceFingerprint, FnSolver, PageExtractor, StaticFingerprint};
