//! Whisper lifecycle: composition parsing, creation with audit copies, and the
//! one-time disclosure state machine.
//!
//! ```ignore
//! let service = WhisperService::new(store.clone(), AuditNotifier::new(sink, &config.audit));
//! let authorizer = DisclosureAuthorizer::new(store, messenger, config.whisper.delivery_timeout());
//!
//! if let Submission::Created(artifact) = service.submit("meet me at noon @alice", &sender).await? {
//!     // later, when the button carrying artifact.reveal_token() is pressed
//!     let outcome = authorizer.reveal(&artifact.id, &actor).await?;
//! }
//! ```

pub mod audit;
pub mod authorizer;
pub mod parser;
pub mod service;
pub mod transport;

pub use audit::{AuditNotifier, AuditRecord, AuditReport};
pub use authorizer::{Actor, AuthorizationPolicy, DisclosureAuthorizer, RevealOutcome, UsernameMatch};
pub use parser::{parse_query, ParseError, ParsedQuery};
pub use service::{normalize_username, Submission, WhisperArtifact, WhisperService};
pub use transport::{AuditSink, PrivateMessenger, TransportError};
