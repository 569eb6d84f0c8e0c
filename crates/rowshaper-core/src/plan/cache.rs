use crate::{
    compile::{CompileContext, PlanCompiler},
    error::InternalError,
    key::ShapeKey,
    obs::sink::{self, MetricsEvent},
    plan::Plan,
    shape::ShapeNode,
};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    sync::{
        Arc, Mutex, MutexGuard, OnceLock, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

static GLOBAL: OnceLock<PlanCache> = OnceLock::new();

///
/// CacheStats
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub size: usize,
}

///
/// PlanCache
///
/// Compiled plans keyed by shape key. Lookups take the lock briefly;
/// compilation happens outside it, so two callers may compile the same
/// shape concurrently. The first insert wins and every caller receives
/// that plan.
///

#[derive(Debug, Default)]
pub struct PlanCache {
    plans: Mutex<BTreeMap<ShapeKey, Arc<Plan>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl PlanCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::new)
    }

    /// Return the cached plan for `shape` under `ctx`, compiling on a miss.
    pub fn get_or_compile(
        &self,
        shape: &ShapeNode,
        ctx: &CompileContext,
    ) -> Result<Arc<Plan>, InternalError> {
        let key = ShapeKey::build(shape, ctx);

        if let Some(plan) = self.lock().get(&key).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            sink::record(MetricsEvent::PlanCacheHit);

            return Ok(plan);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        sink::record(MetricsEvent::PlanCacheMiss);

        let compiled = Arc::new(compile_uncached(shape, ctx, key.clone())?);
        let winner = Arc::clone(self.lock().entry(key).or_insert(compiled));

        Ok(winner)
    }

    /// Cached plan for an already-built key, if any.
    #[must_use]
    pub fn get(&self, key: &ShapeKey) -> Option<Arc<Plan>> {
        self.lock().get(key).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Cache statistics are best-effort only.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.len(),
        }
    }

    /// Drop every cached plan and zero the counters.
    pub fn clear(&self) {
        self.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    // A panic while holding the lock cannot leave the map half-written:
    // every mutation is a single insert or clear.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<ShapeKey, Arc<Plan>>> {
        self.plans.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Compile without consulting any cache.
pub fn compile_uncached(
    shape: &ShapeNode,
    ctx: &CompileContext,
    key: ShapeKey,
) -> Result<Plan, InternalError> {
    let plan = PlanCompiler::compile(shape, ctx, key)?;
    sink::record(MetricsEvent::PlanCompiled {
        nodes: sink::count(plan.node_count()),
    });

    Ok(plan)
}
