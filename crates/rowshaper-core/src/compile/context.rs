use crate::{
    element::MergeOption,
    plan::MaterializeMode,
    traits::{OpenCatalog, TypeCatalog},
};
use std::{fmt, sync::Arc};

///
/// CompileContext
///
/// Everything besides the shape that changes compiled accessors.
/// Mode and merge option are folded into the plan cache key, the catalog
/// through how it resolves each structure type the shape names.
///

#[derive(Clone)]
pub struct CompileContext {
    pub mode: MaterializeMode,
    pub merge_option: MergeOption,
    pub catalog: Arc<dyn TypeCatalog>,
}

impl CompileContext {
    #[must_use]
    pub fn new(mode: MaterializeMode, merge_option: MergeOption) -> Self {
        Self {
            mode,
            merge_option,
            catalog: Arc::new(OpenCatalog),
        }
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: Arc<dyn TypeCatalog>) -> Self {
        self.catalog = catalog;
        self
    }
}

impl Default for CompileContext {
    fn default() -> Self {
        Self::new(MaterializeMode::default(), MergeOption::default())
    }
}

impl fmt::Debug for CompileContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileContext")
            .field("mode", &self.mode)
            .field("merge_option", &self.merge_option)
            .finish_non_exhaustive()
    }
}
