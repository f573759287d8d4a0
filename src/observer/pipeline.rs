use std::collections::BTreeMap;

use futures::future::join_all;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{ObserverBox, ObserverRing};

/// Executes observers in ring order with selective execution.
///
/// Synchronous rings run one after another; an error in a pre-database ring
/// stops the operation before anything is written. Audit observers run
/// concurrently once the database ring has succeeded and their failures are
/// only logged.
pub struct ObserverPipeline {
    // Observer registry by ring, each ring sorted by priority
    observers: BTreeMap<ObserverRing, Vec<ObserverBox>>,
}

impl ObserverPipeline {
    /// Create new observer pipeline with empty observer registry
    pub fn new() -> Self {
        Self {
            observers: BTreeMap::new(),
        }
    }

    /// Pipeline with every built-in observer registered
    pub fn standard() -> Self {
        let mut pipeline = Self::new();
        crate::observer::implementations::register_standard_observers(&mut pipeline);
        pipeline
    }

    pub fn register_observer(&mut self, observer: ObserverBox) {
        let ring = observer.ring();
        let name = observer.name();
        let ring_observers = self.observers.entry(ring).or_default();
        ring_observers.push(observer);
        ring_observers.sort_by_key(|o| o.priority());

        tracing::debug!("Registered observer '{}' for ring {:?}", name, ring);
    }

    /// Run the operation described by `ctx` and hand the context back with
    /// its results, or the first error raised.
    pub async fn execute(&self, mut ctx: ObserverContext) -> Result<ObserverContext, ObserverError> {
        let relevant_rings = ObserverRing::for_operation(ctx.operation);

        tracing::debug!(
            "Observer pipeline starting: operation={:?}, collection={}, caller={}, rings={:?}",
            ctx.operation,
            ctx.collection,
            ctx.caller.label(),
            relevant_rings
        );

        for &ring in relevant_rings.iter().filter(|r| r.is_synchronous()) {
            ctx.current_ring = Some(ring);
            self.execute_ring(ring, &mut ctx).await;

            if ctx.has_errors() {
                tracing::warn!("Observer pipeline stopped at ring {:?} due to errors", ring);
                return Err(ctx.errors.remove(0));
            }
        }

        self.execute_async_rings(&relevant_rings, &ctx).await;

        tracing::debug!(
            "Observer pipeline finished: operation={:?}, collection={} in {:?}",
            ctx.operation,
            ctx.collection,
            ctx.execution_time()
        );
        Ok(ctx)
    }

    /// Execute observers in a specific ring
    async fn execute_ring(&self, ring: ObserverRing, ctx: &mut ObserverContext) {
        let Some(observers) = self.observers.get(&ring) else {
            tracing::trace!("No observers registered for ring {:?}", ring);
            return;
        };

        for observer in observers {
            if !observer.applies_to(ctx.operation, ctx.collection) {
                tracing::trace!(
                    "Observer {} skipped for {:?} on {}",
                    observer.name(),
                    ctx.operation,
                    ctx.collection
                );
                continue;
            }

            if let Err(error) = observer.execute_sync(ctx).await {
                tracing::debug!("Observer: {} failed: {}", observer.name(), error);
                ctx.errors.push(error);
            }

            // Observers within a ring build on each other's output
            if ctx.has_errors() {
                return;
            }
        }
    }

    async fn execute_async_rings(&self, relevant_rings: &[ObserverRing], ctx: &ObserverContext) {
        let pending: Vec<_> = relevant_rings
            .iter()
            .filter(|r| !r.is_synchronous())
            .filter_map(|ring| self.observers.get(ring))
            .flatten()
            .filter(|o| o.applies_to(ctx.operation, ctx.collection))
            .map(|observer| async move { (observer.name(), observer.execute_async(ctx).await) })
            .collect();

        for (name, result) in join_all(pending).await {
            if let Err(error) = result {
                tracing::error!("Async observer {} failed: {}", name, error);
            }
        }
    }
}

impl Default for ObserverPipeline {
    fn default() -> Self {
        Self::new()
    }
}
