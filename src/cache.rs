//! Per-transaction caches.
//!
//! All cached state lives inside one [`ValidationCaches`] value owned by the
//! controller for the duration of a transaction; nothing is process-global.
//! Outcomes are published only after they are fully built, so readers never
//! observe a half-finished record.

use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::graph::RtgKey;
use crate::outcome::RoutingOutcome;
use crate::travel::TravelPath;

#[derive(Default)]
pub struct ValidationCaches {
    /// Travel routes keyed by their flown-sequence signature, so identical
    /// markets share one built path.
    routes: Mutex<FxHashMap<String, Arc<TravelPath>>>,
    /// Finished validation outcomes keyed by travel route and routing
    /// identity.
    outcomes: Mutex<FxHashMap<(String, RtgKey), Arc<RoutingOutcome>>>,
}

impl ValidationCaches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share one built travel path per distinct flown sequence.
    pub fn find_or_insert_route(&self, path: TravelPath) -> Arc<TravelPath> {
        let sig = path.signature();
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        routes.entry(sig).or_insert_with(|| Arc::new(path)).clone()
    }

    pub fn find_outcome(&self, signature: &str, key: &RtgKey) -> Option<Arc<RoutingOutcome>> {
        let outcomes = self.outcomes.lock().unwrap_or_else(|e| e.into_inner());
        let hit = outcomes.get(&(signature.to_string(), key.clone())).cloned();
        if hit.is_some() {
            trace!(routing = %key.routing_number, "routing outcome cache hit");
        }
        hit
    }

    /// Publish a fully built outcome. First writer wins; later publishers
    /// get the already-cached record back.
    pub fn publish_outcome(
        &self,
        signature: &str,
        key: &RtgKey,
        outcome: RoutingOutcome,
    ) -> Arc<RoutingOutcome> {
        let mut outcomes = self.outcomes.lock().unwrap_or_else(|e| e.into_inner());
        outcomes
            .entry((signature.to_string(), key.clone()))
            .or_insert_with(|| Arc::new(outcome))
            .clone()
    }
}
