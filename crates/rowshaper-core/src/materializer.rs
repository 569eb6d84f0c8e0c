use crate::{
    compile::CompileContext,
    config::MaterializerConfig,
    cursor::RowCursor,
    element::{Element, MergeOption},
    error::InternalError,
    key::ShapeKey,
    obs::sink::{MetricsSink, with_metrics_sink},
    plan::{MaterializeMode, Plan, PlanCache, compile_uncached},
    session::{MaterializeTraceSink, Session, SessionOptions},
    shape::ShapeNode,
    traits::{IdentityResolver, ObjectFactory, TypeCatalog},
};
use std::{fmt, sync::Arc};

///
/// CacheChoice
///

#[derive(Clone)]
enum CacheChoice {
    Global,
    Owned(Arc<PlanCache>),
    Disabled,
}

///
/// Materializer
///
/// Entry point: compiles shapes (through the plan cache) and opens
/// sessions with the configured collaborators and observability policy.
///

#[derive(Clone)]
pub struct Materializer {
    ctx: CompileContext,
    options: SessionOptions,
    cache: CacheChoice,
}

impl Materializer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ctx: CompileContext::default(),
            options: SessionOptions::default(),
            cache: CacheChoice::Global,
        }
    }

    #[must_use]
    pub fn from_config(config: &MaterializerConfig) -> Self {
        let mut materializer = Self::new()
            .merge_option(config.merge_option)
            .mode(config.mode);
        materializer.options.debug = config.debug;
        if !config.plan_cache.enabled {
            materializer.cache = CacheChoice::Disabled;
        }

        materializer
    }

    /// Parse a TOML config and build from it.
    pub fn from_toml_str(source: &str) -> Result<Self, InternalError> {
        let config = MaterializerConfig::from_toml_str(source)?;

        Ok(Self::from_config(&config))
    }

    #[must_use]
    pub fn debug(mut self) -> Self {
        self.options.debug = true;
        self
    }

    #[must_use]
    pub fn metrics_sink(mut self, sink: &'static dyn MetricsSink) -> Self {
        self.options.metrics = Some(sink);
        self
    }

    #[must_use]
    pub fn trace_sink(mut self, sink: &'static dyn MaterializeTraceSink) -> Self {
        self.options.trace = Some(sink);
        self
    }

    #[must_use]
    pub fn merge_option(mut self, merge_option: MergeOption) -> Self {
        self.ctx.merge_option = merge_option;
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: MaterializeMode) -> Self {
        self.ctx.mode = mode;
        self
    }

    #[must_use]
    pub fn object_factory(mut self, factory: Arc<dyn ObjectFactory>) -> Self {
        self.options.collaborators.factory = factory;
        self
    }

    #[must_use]
    pub fn identity_resolver(mut self, resolver: Arc<dyn IdentityResolver>) -> Self {
        self.options.collaborators.identity = resolver;
        self
    }

    #[must_use]
    pub fn catalog(mut self, catalog: Arc<dyn TypeCatalog>) -> Self {
        self.ctx.catalog = catalog;
        self
    }

    /// Use a private plan cache instead of the process-wide one.
    #[must_use]
    pub fn cache(mut self, cache: Arc<PlanCache>) -> Self {
        self.cache = CacheChoice::Owned(cache);
        self
    }

    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.cache = CacheChoice::Disabled;
        self
    }

    #[must_use]
    pub const fn compile_context(&self) -> &CompileContext {
        &self.ctx
    }

    fn with_metrics<T>(&self, f: impl FnOnce() -> T) -> T {
        if let Some(sink) = self.options.metrics {
            with_metrics_sink(sink, f)
        } else {
            f()
        }
    }

    fn debug_log(&self, s: impl AsRef<str>) {
        if self.options.debug {
            println!("[debug] {}", s.as_ref());
        }
    }

    /// Compile `shape`, reusing a cached plan when one exists.
    pub fn compile(&self, shape: &ShapeNode) -> Result<Arc<Plan>, InternalError> {
        let plan = self.with_metrics(|| match &self.cache {
            CacheChoice::Global => PlanCache::global().get_or_compile(shape, &self.ctx),
            CacheChoice::Owned(cache) => cache.get_or_compile(shape, &self.ctx),
            CacheChoice::Disabled => {
                compile_uncached(shape, &self.ctx, ShapeKey::build(shape, &self.ctx)).map(Arc::new)
            }
        })?;

        self.debug_log(format!(
            "plan {}: {} collections, {} state slots, max depth {}",
            plan.fingerprint(),
            plan.node_count(),
            plan.state_slot_count(),
            plan.max_depth()
        ));

        Ok(plan)
    }

    /// Open a session over `cursor` for an already compiled plan.
    #[must_use]
    pub fn session<C: RowCursor>(&self, plan: Arc<Plan>, cursor: C) -> Session<C> {
        Session::new(plan, cursor, self.options.clone())
    }

    /// Compile and open a session in one step.
    pub fn materialize<C: RowCursor>(
        &self,
        shape: &ShapeNode,
        cursor: C,
    ) -> Result<Session<C>, InternalError> {
        let plan = self.compile(shape)?;

        Ok(self.session(plan, cursor))
    }

    /// Materialize every root element eagerly.
    pub fn collect<C: RowCursor>(
        &self,
        shape: &ShapeNode,
        cursor: C,
    ) -> Result<Vec<Element>, InternalError> {
        self.materialize(shape, cursor)?.collect()
    }
}

impl Default for Materializer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Materializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = match self.cache {
            CacheChoice::Global => "global",
            CacheChoice::Owned(_) => "owned",
            CacheChoice::Disabled => "disabled",
        };

        f.debug_struct("Materializer")
            .field("ctx", &self.ctx)
            .field("options", &self.options)
            .field("cache", &cache)
            .finish()
    }
}
