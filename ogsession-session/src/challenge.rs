//! Challenge solver bridge.
//!
//! Drives one image-drop challenge: bootstrap both challenge services, hand
//! the question and icon strip to the solver, and post the answer.

use ogsession_core::{ChallengeSolver, SessionError};
use ogsession_fetch::{Method, RateLimitedClient, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::lobby::check_upstream;
use crate::settings::Endpoints;

/// Locale segment of the image-drop endpoints.
const CHALLENGE_LOCALE: &str = "en-GB";

/// Runs challenges against the Gameforge challenge services.
#[derive(Debug, Clone)]
pub struct ChallengeBridge {
    client: RateLimitedClient,
    endpoints: Endpoints,
}

impl ChallengeBridge {
    /// Creates a bridge.
    pub fn new(client: RateLimitedClient, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    /// Solves one challenge.
    ///
    /// A rejected answer yields [`SessionError::ChallengeRequired`] for the
    /// same id; solver errors are returned unchanged.
    #[instrument(skip(self, solver, cancel))]
    pub async fn solve(
        &self,
        challenge_id: &str,
        solver: &dyn ChallengeSolver,
        cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        let bootstrap = format!("{}/challenge/{challenge_id}", self.endpoints.challenge_base);
        let image_drop = format!(
            "{}/challenge/{challenge_id}/{CHALLENGE_LOCALE}",
            self.endpoints.image_drop_base
        );

        self.fetch(&bootstrap, cancel).await?;
        self.fetch(&image_drop, cancel).await?;
        let question = self.fetch(&format!("{image_drop}/text"), cancel).await?;
        let icons = self.fetch(&format!("{image_drop}/drag-icons"), cancel).await?;

        debug!(
            question_bytes = question.len(),
            icon_bytes = icons.len(),
            "Asking solver"
        );
        let answer = solver.solve(&question, &icons, cancel).await?;
        if !(0..=3).contains(&answer) {
            warn!(answer, "Solver answer out of range");
        }

        let request = self
            .client
            .request(Method::POST, &image_drop)
            .json(&serde_json::json!({ "answer": answer }));
        let response = self.client.execute(request, cancel).await?;

        if response.status != StatusCode::OK {
            warn!(status = %response.status, "Challenge answer rejected");
            return Err(SessionError::ChallengeRequired {
                challenge_id: challenge_id.to_string(),
            });
        }

        info!("Challenge solved");
        Ok(())
    }

    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<Vec<u8>, SessionError> {
        let response = self.client.get(url, cancel).await?;
        check_upstream(&response)?;
        Ok(response.bytes().to_vec())
    }
}
