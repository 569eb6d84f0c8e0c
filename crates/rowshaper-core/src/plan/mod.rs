//! Compiled materialization plans.
//!
//! A `Plan` is immutable once compiled and shared across sessions and
//! threads through `Arc`. It carries no per-session state: every mutable
//! value a session needs lives in that session's state slots.

mod cache;


use crate::{
    element::{Element, MergeOption},
    error::InternalError,
    key::{ShapeFingerprint, ShapeKey},
    session::RowContext,
    value::{Value, key_eq},
};
use derive_more::{Display, From};
use std::{fmt, sync::Arc};

// re-exports
pub use cache::{CacheStats, PlanCache, compile_uncached};

/// Compiled row accessor.
pub(crate) type Accessor<T> =
    Arc<dyn Fn(&mut RowContext<'_>) -> Result<T, InternalError> + Send + Sync>;

/// Box a closure as an accessor; the bound fixes the closure signature.
pub(crate) fn accessor<T, F>(f: F) -> Accessor<T>
where
    F: Fn(&mut RowContext<'_>) -> Result<T, InternalError> + Send + Sync + 'static,
{
    Arc::new(f)
}

///
/// AccessorPair
///
/// Fast accessor plus its diagnostic twin. The diagnostic accessor is only
/// run after the fast one failed, to describe the failing column.
///

pub(crate) struct AccessorPair<T> {
    pub(crate) fast: Accessor<T>,
    pub(crate) diagnostic: Accessor<T>,
}

impl<T> AccessorPair<T> {
    pub(crate) fn new(fast: Accessor<T>, diagnostic: Accessor<T>) -> Self {
        Self { fast, diagnostic }
    }

    /// One body for both paths, told whether it runs as the diagnostic one.
    pub(crate) fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut RowContext<'_>, bool) -> Result<T, InternalError> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let fast = Arc::clone(&f);

        Self::new(
            accessor(move |ctx| fast(ctx, false)),
            accessor(move |ctx| f(ctx, true)),
        )
    }

    /// Both paths share one accessor.
    pub(crate) fn shared(accessor: Accessor<T>) -> Self {
        Self {
            fast: Arc::clone(&accessor),
            diagnostic: accessor,
        }
    }
}

impl<T> Clone for AccessorPair<T> {
    fn clone(&self) -> Self {
        Self {
            fast: Arc::clone(&self.fast),
            diagnostic: Arc::clone(&self.diagnostic),
        }
    }
}

///
/// SlotId
/// Index into a session's state-slot array.
///

#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd)]
pub struct SlotId(usize);

impl SlotId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

///
/// CollectionId
/// Index of a collection node within its plan.
///

#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd)]
pub struct CollectionId(usize);

impl CollectionId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

///
/// MaterializeMode
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterializeMode {
    /// Structures become objects or records as the type catalog decides.
    #[default]
    Objects,

    /// Every structure becomes a record.
    Records,
}

impl MaterializeMode {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Objects => "objects",
            Self::Records => "records",
        }
    }
}

///
/// PlanNode
///
/// Compiled collection: the factory for one coordinator per session.
///

pub struct PlanNode {
    pub(crate) id: CollectionId,
    pub(crate) depth: usize,
    pub(crate) parent: Option<CollectionId>,
    pub(crate) children: Vec<CollectionId>,
    pub(crate) state_slot: SlotId,
    pub(crate) key_slots: Vec<SlotId>,
    pub(crate) key_readers: Vec<AccessorPair<Value>>,
    pub(crate) has_data: Option<AccessorPair<bool>>,
    pub(crate) element: AccessorPair<Element>,
}

impl PlanNode {
    #[must_use]
    pub const fn id(&self) -> CollectionId {
        self.id
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub const fn parent(&self) -> Option<CollectionId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[CollectionId] {
        &self.children
    }

    #[must_use]
    pub const fn state_slot(&self) -> SlotId {
        self.state_slot
    }

    #[must_use]
    pub fn key_slots(&self) -> &[SlotId] {
        &self.key_slots
    }

    /// Whether rows are filtered before reaching this collection, by a
    /// discriminator or by outer-join padding.
    #[must_use]
    pub const fn has_row_filter(&self) -> bool {
        self.has_data.is_some()
    }

    /// No nesting, no discriminator and no keys: one row is one element.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.children.is_empty() && self.has_data.is_none() && self.key_slots.is_empty()
    }

    pub(crate) fn has_data(&self, ctx: &mut RowContext<'_>) -> Result<bool, InternalError> {
        let Some(test) = &self.has_data else {
            return Ok(true);
        };

        (test.fast)(ctx).map_err(|err| {
            let diagnostic = (test.diagnostic)(ctx).err();
            err.upgraded_with(diagnostic)
        })
    }

    /// CheckKeys, then SetKeys when the row starts a new element; returns
    /// whether it does. A failed key read is re-run through the diagnostic
    /// readers so the error names the key column.
    pub(crate) fn enter_keys(
        &self,
        ctx: &mut RowContext<'_>,
        entered: bool,
    ) -> Result<bool, InternalError> {
        self.starts_element(ctx, entered).map_err(|err| {
            let diagnostic = self
                .key_readers
                .iter()
                .find_map(|reader| (reader.diagnostic)(ctx).err());
            err.upgraded_with(diagnostic)
        })
    }

    fn starts_element(
        &self,
        ctx: &mut RowContext<'_>,
        entered: bool,
    ) -> Result<bool, InternalError> {
        // A keyless collection starts a new element on every row it accepts.
        if entered && !self.key_slots.is_empty() && self.check_keys(ctx)? {
            return Ok(false);
        }
        self.set_keys(ctx)?;

        Ok(true)
    }

    /// Compare recorded key slots with the row's key columns.
    fn check_keys(&self, ctx: &mut RowContext<'_>) -> Result<bool, InternalError> {
        for (slot, reader) in self.key_slots.iter().zip(&self.key_readers) {
            let value = (reader.fast)(ctx)?;
            if !ctx.key_matches(*slot, &value) {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Record the row's key columns; every key is read before any is stored.
    fn set_keys(&self, ctx: &mut RowContext<'_>) -> Result<(), InternalError> {
        let values = self
            .key_readers
            .iter()
            .map(|reader| (reader.fast)(ctx))
            .collect::<Result<Vec<_>, _>>()?;

        for (slot, value) in self.key_slots.iter().zip(values) {
            ctx.set_value(*slot, value);
        }

        Ok(())
    }
}

impl fmt::Debug for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanNode")
            .field("id", &self.id)
            .field("depth", &self.depth)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("state_slot", &self.state_slot)
            .field("key_slots", &self.key_slots)
            .field("has_data", &self.has_data.is_some())
            .finish_non_exhaustive()
    }
}

///
/// Plan
///
/// Root collection plus every nested collection in compile order (the root
/// is always first), the total state-slot count and the cache identity.
///

#[derive(Debug)]
pub struct Plan {
    pub(crate) nodes: Vec<PlanNode>,
    pub(crate) state_slot_count: usize,
    pub(crate) key: ShapeKey,
    pub(crate) fingerprint: ShapeFingerprint,
    pub(crate) mode: MaterializeMode,
    pub(crate) merge_option: MergeOption,
}

impl Plan {
    #[must_use]
    pub fn root(&self) -> &PlanNode {
        &self.nodes[0]
    }

    #[must_use]
    pub fn node(&self, id: CollectionId) -> Option<&PlanNode> {
        self.nodes.get(id.index())
    }

    #[must_use]
    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub const fn state_slot_count(&self) -> usize {
        self.state_slot_count
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(PlanNode::depth).max().unwrap_or(0)
    }

    #[must_use]
    pub const fn key(&self) -> &ShapeKey {
        &self.key
    }

    #[must_use]
    pub const fn fingerprint(&self) -> ShapeFingerprint {
        self.fingerprint
    }

    #[must_use]
    pub const fn mode(&self) -> MaterializeMode {
        self.mode
    }

    #[must_use]
    pub const fn merge_option(&self) -> MergeOption {
        self.merge_option
    }

    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.root().is_simple()
    }
}

/// Key equality over a recorded slot value.
pub(crate) fn slot_key_eq(recorded: Option<&Value>, value: &Value) -> bool {
    recorded.is_some_and(|recorded| key_eq(recorded, value))
}
