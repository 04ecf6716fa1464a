// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

//! # ogsession Store
//!
//! On-disk state for ogsession.
//!
//! - **SessionConfig**: universe, login name, and tuning knobs
//! - **TokenStore**: saved bearer tokens for the login fast path
//! - **Persistence**: atomic, owner-only JSON file helpers
//!
//! ## Usage
//!
//! ```ignore
//! use ogsession_store::{SessionConfig, TokenStore};
//!
//! let config = SessionConfig::load().await?;
//! config.validate()?;
//! let settings = config.to_settings();
//!
//! let mut tokens = TokenStore::open_default().await;
//! tokens.put(&config.username, "bearer");
//! tokens.save().await?;
//! ```

pub mod config;
pub mod error;
pub mod persistence;
pub mod token_store;

pub use config::SessionConfig;
pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_config_path, default_token_path, ensure_dir, load_json,
    load_json_or_default, save_json,
};
pub use token_store::{SavedToken, TokenStore};
