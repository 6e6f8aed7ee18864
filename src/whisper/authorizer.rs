use crate::db::{MarkOpened, Whisper, WhisperId, WhisperStore};
use crate::error::AppResult;
use crate::whisper::service::normalize_username;
use crate::whisper::transport::PrivateMessenger;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// The user pressing the reveal button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub username: Option<String>,
}

/// Decides whether an actor is the intended recipient of a whisper
pub trait AuthorizationPolicy: Send + Sync {
    fn authorizes(&self, whisper: &Whisper, actor: &Actor) -> bool;
}

/// Case-insensitive match of the actor's current username against the
/// stored target. Actors without a username never match.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsernameMatch;

impl AuthorizationPolicy for UsernameMatch {
    fn authorizes(&self, whisper: &Whisper, actor: &Actor) -> bool {
        match actor.username.as_deref() {
            Some(username) => {
                let username = normalize_username(username);
                !username.is_empty() && username == whisper.target_username
            }
            None => false,
        }
    }
}

/// Outcome of a reveal attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Content was sent privately. `first_reveal` is true only for the call
    /// that moved the whisper from unopened to opened.
    Delivered { first_reveal: bool },
    NotFound,
    /// Actor is not the target; carries the target so the actor can be told
    Forbidden { target_username: String },
    /// Opened earlier by a different account
    AlreadyOpened,
    /// Private delivery failed or timed out; the whisper is left unopened
    DeliveryFailed,
}

/// Runs the reveal state machine: authorize, deliver, then mark opened.
#[derive(Clone)]
pub struct DisclosureAuthorizer {
    store: Arc<dyn WhisperStore>,
    messenger: Arc<dyn PrivateMessenger>,
    policy: Arc<dyn AuthorizationPolicy>,
    delivery_timeout: Duration,
}

impl std::fmt::Debug for DisclosureAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisclosureAuthorizer")
            .field("delivery_timeout", &self.delivery_timeout)
            .finish_non_exhaustive()
    }
}

/// Text of the private message carrying the secret
pub fn secret_message_text(whisper: &Whisper) -> String {
    format!(
        "🔓 Secret message from @{}:\n\n{}",
        whisper.sender.handle_or("Unknown"),
        whisper.secret_text
    )
}

impl DisclosureAuthorizer {
    pub fn new(
        store: Arc<dyn WhisperStore>,
        messenger: Arc<dyn PrivateMessenger>,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            store,
            messenger,
            policy: Arc::new(UsernameMatch),
            delivery_timeout,
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn AuthorizationPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Attempt to reveal a whisper to `actor`.
    ///
    /// Delivery happens before the store transition, so a whisper is never
    /// marked opened without a successful send. Two concurrent authorized
    /// reveals may both deliver; only one of them wins `mark_opened`.
    ///
    /// A repeat reveal by the account that opened the whisper re-delivers the
    /// content without touching the record. Storage failures are returned as
    /// errors, never as `NotFound`.
    pub async fn reveal(&self, id: &WhisperId, actor: &Actor) -> AppResult<RevealOutcome> {
        let whisper = match self.store.get(id).await {
            Ok(Some(whisper)) => whisper,
            Ok(None) => {
                debug!("Reveal of unknown whisper {} by {}", id, actor.id);
                return Ok(RevealOutcome::NotFound);
            }
            Err(e) => {
                error!("Failed to load whisper {}: {}", id, e);
                return Err(e);
            }
        };

        if !self.policy.authorizes(&whisper, actor) {
            info!("Actor {} is not the target of whisper {}", actor.id, id);
            return Ok(RevealOutcome::Forbidden {
                target_username: whisper.target_username,
            });
        }

        if let Some(opened) = whisper.opened {
            if opened.by != actor.id {
                info!(
                    "Whisper {} already opened by {}, refusing {}",
                    id, opened.by, actor.id
                );
                return Ok(RevealOutcome::AlreadyOpened);
            }
            return Ok(if self.deliver(&whisper, actor).await {
                RevealOutcome::Delivered { first_reveal: false }
            } else {
                RevealOutcome::DeliveryFailed
            });
        }

        if !self.deliver(&whisper, actor).await {
            return Ok(RevealOutcome::DeliveryFailed);
        }

        match self.store.mark_opened(id, actor.id).await {
            Ok(MarkOpened::OpenedNow) => {
                info!("Whisper {} opened by {}", id, actor.id);
                Ok(RevealOutcome::Delivered { first_reveal: true })
            }
            Ok(MarkOpened::AlreadyOpened) => {
                warn!(
                    "Whisper {} was opened concurrently; {} received a duplicate delivery",
                    id, actor.id
                );
                Ok(RevealOutcome::Delivered { first_reveal: false })
            }
            Ok(MarkOpened::NotFound) => {
                warn!("Whisper {} disappeared after delivery to {}", id, actor.id);
                Ok(RevealOutcome::Delivered { first_reveal: false })
            }
            Err(e) => {
                error!("Failed to mark whisper {} opened: {}", id, e);
                Err(e)
            }
        }
    }

    async fn deliver(&self, whisper: &Whisper, actor: &Actor) -> bool {
        let text = secret_message_text(whisper);
        let send = self.messenger.send_private_message(actor.id, &text);

        match tokio::time::timeout(self.delivery_timeout, send).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("Failed to deliver whisper {} to {}: {}", whisper.id, actor.id, e);
                false
            }
            Err(_) => {
                warn!(
                    "Delivery of whisper {} to {} timed out after {:?}",
                    whisper.id, actor.id, self.delivery_timeout
                );
                false
            }
        }
    }
}
