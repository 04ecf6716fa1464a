//! Login state machine.
//!
//! ```text
//! Idle -> CredentialSubmission -> [ChallengeRequired -> CredentialSubmission]*
//!      -> [OtpSubmission] -> TokenAcquired -> ServerBinding -> Bound
//! ```
//!
//! Any step may end in `Failed`. A known bearer token skips straight to
//! `ServerBinding` and falls back to credentials if the lobby rejects it.
//!
//! The machine never touches session state; it returns a [`LoginOutcome`]
//! the controller applies.

use ogsession_core::{
    Account, ChallengeSolver, Credentials, PageExtractor, Server, ServerData, SessionError,
};
use ogsession_extractors::{Strategy, StrategyRegistry};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::challenge::ChallengeBridge;
use crate::lobby::{GameConfiguration, LobbyApi, find_server_account};

// ============================================================================
// States
// ============================================================================

/// Where a login run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    /// Not started.
    Idle,
    /// Credentials are being posted.
    CredentialSubmission,
    /// The lobby asked for a challenge.
    ChallengeRequired {
        /// Challenge id.
        challenge_id: String,
        /// Solves left after this one.
        remaining: u32,
    },
    /// Credentials are being posted with a one-time passcode.
    OtpSubmission,
    /// A bearer token is available.
    TokenAcquired,
    /// Looking up the account, universe, and universe metadata.
    ServerBinding,
    /// Logged into the universe.
    Bound,
    /// The run failed.
    Failed(SessionError),
}

impl fmt::Display for LoginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::CredentialSubmission => write!(f, "credential-submission"),
            Self::ChallengeRequired { .. } => write!(f, "challenge-required"),
            Self::OtpSubmission => write!(f, "otp-submission"),
            Self::TokenAcquired => write!(f, "token-acquired"),
            Self::ServerBinding => write!(f, "server-binding"),
            Self::Bound => write!(f, "bound"),
            Self::Failed(_) => write!(f, "failed"),
        }
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Everything a successful login produced.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Lobby bearer token.
    pub bearer_token: String,
    /// Bound universe.
    pub server: Server,
    /// Account played.
    pub account: Account,
    /// Universe metadata.
    pub server_data: ServerData,
    /// Universe base URL.
    pub server_url: String,
    /// Strategy for the universe version.
    pub strategy: Arc<Strategy>,
    /// In-game session marker.
    pub session_marker: String,
    /// Body of the page the login link landed on.
    pub landing_page: String,
    /// Whether the known token was reused.
    pub reused_token: bool,
}

/// Universe a login run should bind to.
#[derive(Debug, Clone, Default)]
pub struct LoginTarget {
    /// Universe name.
    pub universe: String,
    /// Language code.
    pub language: String,
    /// Explicit player id.
    pub player_id: Option<i64>,
}

struct Lookup {
    server: Server,
    account: Account,
}

// ============================================================================
// Machine
// ============================================================================

/// One login run.
pub struct LoginMachine {
    lobby: LobbyApi,
    bridge: ChallengeBridge,
    solver: Option<Arc<dyn ChallengeSolver>>,
    target: LoginTarget,
    max_challenge_retries: u32,
    state: LoginState,
    history: Vec<String>,
}

impl fmt::Debug for LoginMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginMachine")
            .field("target", &self.target)
            .field("state", &self.state)
            .field("has_solver", &self.solver.is_some())
            .finish_non_exhaustive()
    }
}

impl LoginMachine {
    /// Creates a machine in the `Idle` state.
    pub fn new(lobby: LobbyApi, target: LoginTarget, max_challenge_retries: u32) -> Self {
        let bridge = ChallengeBridge::new(lobby.client().clone(), lobby.endpoints().clone());
        Self {
            lobby,
            bridge,
            solver: None,
            target,
            max_challenge_retries,
            state: LoginState::Idle,
            history: Vec::new(),
        }
    }

    /// Attaches a challenge solver.
    pub fn with_solver(mut self, solver: Option<Arc<dyn ChallengeSolver>>) -> Self {
        self.solver = solver;
        self
    }

    /// Current state.
    pub fn state(&self) -> &LoginState {
        &self.state
    }

    /// Names of every state visited, in order.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    fn transition(&mut self, next: LoginState) {
        debug!(from = %self.state, to = %next, "Login transition");
        self.history.push(next.to_string());
        self.state = next;
    }

    /// Runs the machine to `Bound` or `Failed`.
    #[instrument(skip_all, fields(universe = %self.target.universe, lang = %self.target.language))]
    pub async fn run(
        &mut self,
        credentials: &Credentials,
        known_token: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<LoginOutcome, SessionError> {
        self.state = LoginState::Idle;
        self.history.clear();

        let result = self.run_inner(credentials, known_token, cancel).await;
        match &result {
            Ok(outcome) => {
                self.transition(LoginState::Bound);
                info!(
                    player = %outcome.account.name,
                    strategy = %outcome.strategy.name(),
                    reused_token = outcome.reused_token,
                    "Logged in"
                );
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.transition(LoginState::Failed(e.clone()));
            }
        }
        result
    }

    async fn run_inner(
        &mut self,
        credentials: &Credentials,
        known_token: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<LoginOutcome, SessionError> {
        if let Some(token) = known_token.filter(|t| !t.is_empty()) {
            self.transition(LoginState::ServerBinding);
            let reused = match self.lookup(token, cancel).await {
                Ok(lookup) => self.bind(token.to_string(), lookup, true, cancel).await,
                Err(e) => Err(e),
            };
            match reused {
                Ok(outcome) => return Ok(outcome),
                Err(e @ (SessionError::Cancelled | SessionError::AccountBlocked)) => {
                    return Err(e);
                }
                Err(e) => {
                    debug!(error = %e, "Known token rejected, submitting credentials");
                }
            }
        }

        let token = self.acquire_token(credentials, cancel).await?;
        self.transition(LoginState::ServerBinding);
        let lookup = self.lookup(&token, cancel).await?;
        self.bind(token, lookup, false, cancel).await
    }

    /// Posts credentials until a token is issued, solving challenges within
    /// the retry budget.
    async fn acquire_token(
        &mut self,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> Result<String, SessionError> {
        let config: GameConfiguration = self.lobby.configuration(cancel).await?;
        let mut budget = self.max_challenge_retries;
        let mut challenge_id = credentials.challenge_id.clone();

        loop {
            self.transition(LoginState::CredentialSubmission);
            if credentials.otp_secret.is_some() {
                self.transition(LoginState::OtpSubmission);
            }

            let attempt = self
                .lobby
                .create_session(credentials, &config, challenge_id.as_deref(), cancel)
                .await;

            match attempt {
                Ok(token) => {
                    self.transition(LoginState::TokenAcquired);
                    return Ok(token);
                }
                Err(SessionError::ChallengeRequired { challenge_id: id }) => {
                    let Some(solver) = self.solver.clone() else {
                        return Err(SessionError::ChallengeRequired { challenge_id: id });
                    };
                    if budget == 0 {
                        return Err(SessionError::ChallengeRequired { challenge_id: id });
                    }
                    budget -= 1;
                    self.transition(LoginState::ChallengeRequired {
                        challenge_id: id.clone(),
                        remaining: budget,
                    });
                    match self.bridge.solve(&id, solver.as_ref(), cancel).await {
                        Ok(()) => {}
                        // Resubmitting with the same id yields a fresh challenge.
                        Err(SessionError::ChallengeRequired { .. }) => {
                            debug!(remaining = budget, "Answer rejected");
                        }
                        Err(e) => return Err(e),
                    }
                    challenge_id = Some(id);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn lookup(&self, token: &str, cancel: &CancellationToken) -> Result<Lookup, SessionError> {
        let accounts = self.lobby.accounts(token, cancel).await?;
        let servers = self.lobby.servers(cancel).await?;
        let (server, account) = find_server_account(
            &accounts,
            &servers,
            &self.target.universe,
            &self.target.language,
            self.target.player_id,
        )?;
        if account.blocked {
            return Err(SessionError::AccountBlocked);
        }
        debug!(
            players_online = server.players_online,
            players = server.player_count,
            "Found account"
        );
        Ok(Lookup { server, account })
    }

    async fn bind(
        &mut self,
        bearer_token: String,
        lookup: Lookup,
        reused_token: bool,
        cancel: &CancellationToken,
    ) -> Result<LoginOutcome, SessionError> {
        let Lookup { server, account } = lookup;
        let server_url = self.lobby.endpoints().server_url(&server.identity());

        let server_data = self.lobby.server_data(&server_url, cancel).await?;
        let strategy = StrategyRegistry::resolve(&server_data.version)?;

        let link = self.lobby.login_link(&bearer_token, &account, cancel).await?;
        let landing_page = self.lobby.open_login_link(&link, cancel).await?;

        let session_marker = strategy
            .extract_session_marker(&landing_page)
            .ok_or(SessionError::BadCredentials)?;

        Ok(LoginOutcome {
            bearer_token,
            server,
            account,
            server_data,
            server_url,
            strategy,
            session_marker,
            landing_page,
            reused_token,
        })
    }
}
