use crate::{
    element::Element,
    error::{ErrorClass, ErrorOrigin, InternalError},
    plan::{AccessorPair, CollectionId, PlanNode, SlotId},
    value::Value,
};

///
/// CoordinatorScratchpad
///
/// Mutable builder for one collection while the compiler is inside its
/// scope. Discarded once turned into a `PlanNode`.
///

pub(super) struct CoordinatorScratchpad {
    pub(super) id: CollectionId,
    pub(super) depth: usize,
    pub(super) parent: Option<CollectionId>,
    pub(super) children: Vec<CollectionId>,
    pub(super) state_slot: Option<SlotId>,
    pub(super) key_slots: Vec<SlotId>,
    pub(super) key_readers: Vec<AccessorPair<Value>>,
    pub(super) has_data: Option<AccessorPair<bool>>,
    pub(super) element: Option<AccessorPair<Element>>,
}

impl CoordinatorScratchpad {
    pub(super) const fn new(id: CollectionId, depth: usize, parent: Option<CollectionId>) -> Self {
        Self {
            id,
            depth,
            parent,
            children: Vec::new(),
            state_slot: None,
            key_slots: Vec::new(),
            key_readers: Vec::new(),
            has_data: None,
            element: None,
        }
    }

    pub(super) fn into_plan_node(self) -> Result<PlanNode, InternalError> {
        let (Some(state_slot), Some(element)) = (self.state_slot, self.element) else {
            return Err(InternalError::new(
                ErrorClass::InvariantViolation,
                ErrorOrigin::Compile,
                format!("collection {} left its scope unfinished", self.id),
            ));
        };

        Ok(PlanNode {
            id: self.id,
            depth: self.depth,
            parent: self.parent,
            children: self.children,
            state_slot,
            key_slots: self.key_slots,
            key_readers: self.key_readers,
            has_data: self.has_data,
            element,
        })
    }
}
