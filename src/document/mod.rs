//! Read-modify-write mutation of shared declarative documents.
//!
//! The control plane exposes two optimistic-concurrency regimes. Versioned
//! resources return a token on every write and reject writes carrying a
//! stale one; the [`Mutator`] retries those from a fresh fetch up to the
//! caller's bound. Unversioned whole-document resources (a configuration
//! blob holding many independent sub-resources) offer no server-side
//! compare-and-swap at all: a second writer racing between fetch and write
//! can silently clobber this writer's change. That hazard is surfaced, not
//! solved: [`ConflictGuard::Checksum`] opts into best-effort detection by
//! re-reading the document right before the write, and callers needing real
//! safety must serialize externally (a single-writer queue per document
//! path).
//!
//! Transforms are pure functions over the translator's in-memory
//! representation; they must not perform I/O. A transform that only touches
//! its own sub-resource leaves every sibling semantically intact in the
//! written document.

use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;
use crate::operation::{AsyncOperation, PollPolicy, Poller};
use crate::transport::{FetchOutcome, Method, Transport, VersionToken};

/// Converts wire bytes to and from the in-memory representation mutated by
/// transforms. Implemented by the embedding application; a decode failure
/// means the remote representation is malformed and surfaces as
/// [`EngineError::Validation`] before any write is attempted.
pub trait Translator<R>: Send + Sync {
    /// Decodes a fetched document body.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] when the body is malformed.
    fn decode(&self, body: &[u8]) -> Result<R, EngineError>;

    /// Encodes a representation for writing.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] when the representation cannot
    /// be rendered.
    fn encode(&self, representation: &R) -> Result<Vec<u8>, EngineError>;

    /// Returns the empty document used when a fetch finds nothing, so
    /// "ensure the configuration contains X" transforms are idempotent.
    fn empty(&self) -> R;
}

/// Write-attempt bound for the versioned retry loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryLimit(u32);

impl RetryLimit {
    /// Creates a bound of `max_attempts` total write attempts (minimum 1).
    #[must_use]
    pub const fn attempts(max_attempts: u32) -> Self {
        Self(if max_attempts == 0 { 1 } else { max_attempts })
    }

    /// Total write attempts allowed.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// A versioned representation together with the token that authorises the
/// next write. Tokens are scoped to a single fetch-mutate-write
/// transaction; chaining one into a later [`Mutator::mutate_versioned`]
/// call is only valid when that call immediately follows the write that
/// issued it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VersionedDocument<R> {
    /// In-memory representation owned by the translator.
    pub representation: R,
    /// Token authorising the next write, when the server issued one.
    pub version: Option<VersionToken>,
}

/// Opt-in race detection for unversioned whole-document writes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ConflictGuard {
    /// Write blind; the documented hazard is accepted.
    #[default]
    None,
    /// Re-fetch immediately before the write and compare a checksum of the
    /// pre-image; a changed document yields [`MutateOutcome::Conflicted`]
    /// instead of a write.
    Checksum,
}

/// Result of an unversioned whole-document mutation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MutateOutcome<R> {
    /// The write went through.
    Applied {
        /// Representation that was written.
        representation: R,
        /// Completed operation record when the write was asynchronous.
        operation: Option<AsyncOperation>,
    },
    /// The checksum guard saw another writer between fetch and write; the
    /// document was left untouched.
    Conflicted,
}

/// Applies pure transformations to shared declarative documents and
/// persists the result, delegating asynchronous writes to the
/// [`Poller`](crate::operation::Poller).
#[derive(Clone, Debug)]
pub struct Mutator<T, L> {
    transport: T,
    translator: L,
}

impl<T: Transport, L> Mutator<T, L> {
    /// Creates a mutator over the given transport and translator.
    #[must_use]
    pub const fn new(transport: T, translator: L) -> Self {
        Self {
            transport,
            translator,
        }
    }

    /// Mutates a versioned resource (Regime A).
    ///
    /// Each attempt fetches the current `{representation, token}`, applies
    /// `transform`, and writes the result under the held token. A version
    /// conflict triggers a fresh fetch and another attempt, up to
    /// `retries`. A write answered asynchronously is polled to completion
    /// under `policy` before being reported applied. A caller chaining
    /// writes in one logical session passes the previous call's return
    /// value as `seed` to skip the first fetch; the seed's token must come
    /// from the immediately preceding write to the same resource.
    ///
    /// An absent resource starts from the translator's empty document.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Conflict`] once the bound is exhausted,
    /// [`EngineError::Validation`] when the fetched body is malformed, and
    /// every failure mode of [`Poller::submit`] for the write itself.
    pub async fn mutate_versioned<R, F>(
        &self,
        path: &str,
        seed: Option<VersionedDocument<R>>,
        retries: RetryLimit,
        policy: PollPolicy,
        cancel: &CancellationToken,
        transform: F,
    ) -> Result<VersionedDocument<R>, EngineError>
    where
        L: Translator<R>,
        F: Fn(R) -> Result<R, EngineError>,
    {
        let mut reusable_seed = seed;
        for attempt in 1..=retries.get() {
            let document = match reusable_seed.take() {
                Some(held) => held,
                None => self.fetch_versioned(path).await?,
            };
            let representation = transform(document.representation)?;
            let body = self.translator.encode(&representation)?;
            let written = self
                .transport
                .submit(Method::Put, path, &body, document.version.as_ref())
                .await?;
            if is_version_conflict(written.http_status) {
                tracing::debug!(path, attempt, "stale version token, refetching");
                continue;
            }
            let outcome = Poller::new(&self.transport)
                .complete(path, written, policy, cancel)
                .await?;
            return Ok(VersionedDocument {
                representation,
                version: outcome.version,
            });
        }
        Err(EngineError::Conflict {
            resource_path: path.to_owned(),
            attempts: retries.get(),
        })
    }

    /// Mutates an unversioned whole-document resource (Regime B).
    ///
    /// Fetches the full document, applies `transform`, and writes the
    /// result back; an asynchronous write is polled to completion under
    /// `policy`. There is no server-side conflict detection in this
    /// regime; see [`ConflictGuard`] for the opt-in pre-image check.
    ///
    /// An absent resource starts from the translator's empty document.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] when the fetched body is
    /// malformed (detected before any write), plus every failure mode of
    /// [`Poller::submit`] for the write itself.
    pub async fn mutate_document<R, F>(
        &self,
        path: &str,
        policy: PollPolicy,
        guard: ConflictGuard,
        cancel: &CancellationToken,
        transform: F,
    ) -> Result<MutateOutcome<R>, EngineError>
    where
        L: Translator<R>,
        F: FnOnce(R) -> Result<R, EngineError>,
    {
        let fetched = self.transport.fetch(path).await?;
        let pre_image = pre_image_digest(&fetched);
        let current = self.decode_fetched(fetched)?;
        let representation = transform(current)?;
        let body = self.translator.encode(&representation)?;

        if matches!(guard, ConflictGuard::Checksum) {
            let recheck = self.transport.fetch(path).await?;
            if pre_image_digest(&recheck) != pre_image {
                tracing::debug!(path, "document changed under checksum guard");
                return Ok(MutateOutcome::Conflicted);
            }
        }

        let written = self.transport.submit(Method::Put, path, &body, None).await?;
        let outcome = Poller::new(&self.transport)
            .complete(path, written, policy, cancel)
            .await?;
        Ok(MutateOutcome::Applied {
            representation,
            operation: outcome.operation,
        })
    }

    async fn fetch_versioned<R>(&self, path: &str) -> Result<VersionedDocument<R>, EngineError>
    where
        L: Translator<R>,
    {
        match self.transport.fetch(path).await? {
            FetchOutcome::Found { body, version } => Ok(VersionedDocument {
                representation: self.translator.decode(&body)?,
                version,
            }),
            FetchOutcome::Absent => Ok(VersionedDocument {
                representation: self.translator.empty(),
                version: None,
            }),
        }
    }

    fn decode_fetched<R>(&self, fetched: FetchOutcome) -> Result<R, EngineError>
    where
        L: Translator<R>,
    {
        match fetched {
            FetchOutcome::Found { body, .. } => self.translator.decode(&body),
            FetchOutcome::Absent => Ok(self.translator.empty()),
        }
    }
}

/// Conflict statuses reported for stale version tokens. 412 is the
/// precondition-failed answer to a stale token; some endpoints report 409
/// for the same condition.
const fn is_version_conflict(http_status: u16) -> bool {
    matches!(http_status, 409 | 412)
}

fn pre_image_digest(fetched: &FetchOutcome) -> Option<[u8; 32]> {
    match fetched {
        FetchOutcome::Found { body, .. } => Some(Sha256::digest(body).into()),
        FetchOutcome::Absent => None,
    }
}
