//! Builds a session from the config file and saved tokens.

use anyhow::{Context, Result};
use ogsession_core::{SessionSnapshot, StaticFingerprint};
use ogsession_session::{SessionController, SessionHandle};
use ogsession_store::{SessionConfig, TokenStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::Cli;
use crate::solver::StdinSolver;

/// A configured session plus the token store backing its fast path.
pub struct CliSession {
    pub handle: SessionHandle,
    pub config: SessionConfig,
    tokens: TokenStore,
}

impl CliSession {
    /// Loads the config and prepares an unauthenticated session.
    pub async fn open(cli: &Cli, use_saved_token: bool) -> Result<Self> {
        let path = cli.config_path();
        let config = SessionConfig::load_from(&path)
            .await
            .with_context(|| format!("failed to load {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config at {}", path.display()))?;

        let credentials = config.credentials()?;
        let tokens = TokenStore::open_default().await;

        let mut controller = SessionController::new(config.to_settings(), credentials)?
            .with_solver(Arc::new(StdinSolver::new()))
            .with_fingerprint(Arc::new(StaticFingerprint::new(config.blackbox.clone())));

        if use_saved_token && config.remember_token {
            if let Some(token) = tokens.bearer_token(&config.username) {
                debug!("Using saved bearer token");
                controller = controller.with_bearer_token(token);
            }
        }

        Ok(Self {
            handle: SessionHandle::new(controller),
            config,
            tokens,
        })
    }

    /// Logs in and keeps the token store in sync with the outcome.
    pub async fn login(&mut self, cancel: &CancellationToken) -> Result<SessionSnapshot> {
        let result = self.handle.login(cancel).await;
        let username = self.config.username.clone();

        match &result {
            Ok(snapshot) if self.config.remember_token => {
                self.tokens.put(&username, &snapshot.bearer_token);
                self.persist_tokens().await;
            }
            Err(e) if e.is_terminal() => {
                if self.tokens.remove(&username).is_some() {
                    self.persist_tokens().await;
                }
            }
            _ => {}
        }

        Ok(result?)
    }

    async fn persist_tokens(&self) {
        if let Err(e) = self.tokens.save().await {
            warn!(error = %e, "Failed to save bearer token");
        }
    }
}

/// Token cancelled on Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    cancel
}
