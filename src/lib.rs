//! Core engine for adapters targeting declarative control-plane APIs.
//!
//! The crate implements the cross-cutting machinery shared by every
//! resource module of a provider adapter: submission and polling of
//! long-running asynchronous operations ([`operation`]), read-modify-write
//! mutation of shared declarative documents under two optimistic-
//! concurrency regimes ([`document`]), ordered provisioning workflows with
//! reverse-order compensation ([`workflow`]), and a codec for the opaque
//! composite identifiers that stitch multi-part remote resources together
//! ([`resource_id`]).
//!
//! Wire concerns stay outside: HTTP is consumed through the
//! [`transport::Transport`] trait and document marshalling through
//! [`document::Translator`]. The engine holds no state between calls; all
//! persisted state lives in the remote control plane.

pub mod document;
pub mod error;
pub mod kind;
pub mod operation;
pub mod resource_id;
pub mod test_support;
pub mod transport;
pub mod workflow;

pub use document::{
    ConflictGuard, MutateOutcome, Mutator, RetryLimit, Translator, VersionedDocument,
};
pub use error::EngineError;
pub use kind::{Catalog, KindSpec, MutateRegime};
pub use operation::{AsyncOperation, OperationOutcome, PollPolicy, Poller};
pub use resource_id::IdShape;
pub use transport::{
    FetchOutcome, Method, OperationHandle, OperationStatus, StatusSnapshot, SubmitOutcome,
    Transport, TransportFuture, VersionToken,
};
pub use workflow::{CompensationWarning, Step, StepFuture, WorkflowFailure};
