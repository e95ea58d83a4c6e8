//! Per-resource-kind dispatch table.
//!
//! The control plane exposes many structurally similar resource kinds
//! (virtual networks, load balancers, VPN gateways, disks, deployments)
//! that differ only in which mutate regime applies, what their composite
//! ids look like, and how long their operations take. Those differences
//! are data, not control flow: a [`KindSpec`] entry in the [`Catalog`] is
//! all a new resource kind needs for the engine to handle it.

use std::collections::BTreeMap;

use crate::operation::PollPolicy;
use crate::resource_id::IdShape;

/// Optimistic-concurrency regime of one resource kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MutateRegime {
    /// Writes return a version token and reject stale ones
    /// ([`Mutator::mutate_versioned`](crate::document::Mutator::mutate_versioned)).
    Versioned,
    /// Whole-document resource with no server-side conflict detection
    /// ([`Mutator::mutate_document`](crate::document::Mutator::mutate_document)).
    WholeDocument,
}

/// Engine parameters for one resource kind.
#[derive(Clone, Debug, PartialEq)]
pub struct KindSpec {
    /// Which mutate regime the kind's configuration document uses.
    pub regime: MutateRegime,
    /// Shape of the kind's composite identifiers.
    pub id_shape: IdShape,
    /// Default polling tolerance for the kind's operations. Resource
    /// modules state their tolerance here once; the poller itself never
    /// invents one.
    pub poll: PollPolicy,
}

/// Registry of resource kinds, keyed by kind name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    kinds: BTreeMap<String, KindSpec>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a kind, returning the spec it replaced when the name was
    /// already present.
    pub fn register(&mut self, name: impl Into<String>, spec: KindSpec) -> Option<KindSpec> {
        self.kinds.insert(name.into(), spec)
    }

    /// Looks up a kind. An unknown name is a typed miss, not an error.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&KindSpec> {
        self.kinds.get(name)
    }

    /// Returns the registered kind names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.kinds.keys().map(String::as_str).collect()
    }
}
