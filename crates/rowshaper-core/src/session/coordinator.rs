use crate::{
    cursor::RowCursor,
    element::Element,
    error::InternalError,
    plan::{Plan, PlanNode},
    session::shaper::{Collaborators, RowContext, StateSlot},
};
use derive_more::{Display, From};
use std::{collections::VecDeque, mem, sync::Arc};

///
/// CoordinatorId
/// Index of a coordinator within its session's arena.
///

#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd)]
pub struct CoordinatorId(usize);

impl CoordinatorId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

///
/// Coordinator
///
/// Per-session runtime state of one plan node. `child` is the first
/// coordinator of the nested chain, `next` the following alternative at
/// the same depth.
///

#[derive(Debug)]
struct Coordinator {
    node: usize,
    depth: usize,
    parent: Option<CoordinatorId>,
    child: Option<CoordinatorId>,
    next: Option<CoordinatorId>,
    is_entered: bool,
    current: Option<Element>,
    elements: Vec<Element>,
}

///
/// CoordinatorTree
///
/// The row engine. Owns the coordinator arena, the state slots and the
/// queue of root elements that are complete and ready to hand out.
///

pub(crate) struct CoordinatorTree {
    plan: Arc<Plan>,
    coordinators: Vec<Coordinator>,
    slots: Vec<StateSlot>,
    released: VecDeque<Element>,
    elements_per_depth: Vec<usize>,
}

impl CoordinatorTree {
    const ROOT: CoordinatorId = CoordinatorId(0);

    pub(crate) fn new(plan: Arc<Plan>) -> Self {
        let nodes = plan.nodes();
        let id = |index: usize| CoordinatorId(index);

        let mut coordinators: Vec<Coordinator> = nodes
            .iter()
            .map(|node| Coordinator {
                node: node.id().index(),
                depth: node.depth(),
                parent: node.parent().map(|parent| id(parent.index())),
                child: node.children().first().map(|child| id(child.index())),
                next: None,
                is_entered: false,
                current: None,
                elements: Vec::new(),
            })
            .collect();
        for node in nodes {
            for pair in node.children().windows(2) {
                coordinators[pair[0].index()].next = Some(id(pair[1].index()));
            }
        }

        let mut slots = vec![StateSlot::Empty; plan.state_slot_count()];
        for (index, node) in nodes.iter().enumerate() {
            if let Some(slot) = slots.get_mut(node.state_slot().index()) {
                *slot = StateSlot::Coordinator(id(index));
            }
        }

        let elements_per_depth = vec![0; plan.max_depth() + 1];

        Self {
            plan,
            coordinators,
            slots,
            released: VecDeque::new(),
            elements_per_depth,
        }
    }

    pub(crate) fn pop_released(&mut self) -> Option<Element> {
        self.released.pop_front()
    }

    pub(crate) fn elements_per_depth(&self) -> &[usize] {
        &self.elements_per_depth
    }

    /// Shape one row. On failure every in-flight element is discarded;
    /// roots released before the failing row stay queued.
    pub(crate) fn process_row(
        &mut self,
        cursor: &dyn RowCursor,
        collaborators: &Collaborators,
    ) -> Result<(), InternalError> {
        let result = if self.plan.is_simple() {
            self.simple_row(cursor, collaborators)
        } else {
            self.general_row(cursor, collaborators)
        };
        if result.is_err() {
            self.discard();
        }

        result
    }

    /// Cursor exhausted: close every open collection, releasing the last root.
    pub(crate) fn flush(&mut self) {
        self.reset_chain(Some(Self::ROOT), true);
    }

    /// Drop all in-flight state without publishing anything.
    pub(crate) fn discard(&mut self) {
        self.reset_chain(Some(Self::ROOT), false);
    }

    // ------------------------------------------------------------------
    // Row processing
    // ------------------------------------------------------------------

    fn simple_row(
        &mut self,
        cursor: &dyn RowCursor,
        collaborators: &Collaborators,
    ) -> Result<(), InternalError> {
        let mut element = self.build_element(Self::ROOT, cursor, collaborators)?;
        element.accept_pending_values();

        self.elements_per_depth[0] += 1;
        self.released.push_back(element);

        Ok(())
    }

    fn general_row(
        &mut self,
        cursor: &dyn RowCursor,
        collaborators: &Collaborators,
    ) -> Result<(), InternalError> {
        let plan = Arc::clone(&self.plan);
        let mut candidate = Some(Self::ROOT);

        while let Some(first) = candidate {
            let Some(id) = self.select(&plan, first, cursor, collaborators)? else {
                break;
            };
            let coordinator = &self.coordinators[id.index()];
            let node = &plan.nodes()[coordinator.node];
            let depth = coordinator.depth;

            let starts_element = {
                let entered = coordinator.is_entered;
                let mut ctx = RowContext::new(cursor, &mut self.slots, collaborators);
                node.enter_keys(&mut ctx, entered)?
            };

            if starts_element {
                self.coordinators[id.index()].is_entered = true;

                let child = self.coordinators[id.index()].child;
                self.reset_chain(child, true);
                if let Some(previous) = self.coordinators[id.index()].current.take() {
                    self.finalize(id, previous);
                }

                let element = self.build_element(id, cursor, collaborators)?;
                self.elements_per_depth[depth] += 1;
                self.coordinators[id.index()].current = Some(element);
            }

            candidate = self.coordinators[id.index()].child;
        }

        Ok(())
    }

    /// First coordinator in the chain starting at `first` whose data test
    /// accepts the row.
    fn select(
        &mut self,
        plan: &Plan,
        first: CoordinatorId,
        cursor: &dyn RowCursor,
        collaborators: &Collaborators,
    ) -> Result<Option<CoordinatorId>, InternalError> {
        let mut next = Some(first);

        while let Some(id) = next {
            let coordinator = &self.coordinators[id.index()];
            let node: &PlanNode = &plan.nodes()[coordinator.node];
            let mut ctx = RowContext::new(cursor, &mut self.slots, collaborators);
            if node.has_data(&mut ctx)? {
                return Ok(Some(id));
            }
            next = coordinator.next;
        }

        Ok(None)
    }

    /// Run the fast element accessor; on failure re-run the diagnostic
    /// twin to sharpen the error.
    fn build_element(
        &mut self,
        id: CoordinatorId,
        cursor: &dyn RowCursor,
        collaborators: &Collaborators,
    ) -> Result<Element, InternalError> {
        let node = &self.plan.nodes()[self.coordinators[id.index()].node];
        let mut ctx = RowContext::new(cursor, &mut self.slots, collaborators);

        match (node.element.fast)(&mut ctx) {
            Ok(element) => Ok(element),
            Err(err) => {
                let diagnostic = (node.element.diagnostic)(&mut ctx).err();

                Err(err.upgraded_with(diagnostic))
            }
        }
    }

    // ------------------------------------------------------------------
    // Closing collections
    // ------------------------------------------------------------------

    /// Move a finished element to where it belongs: the release queue for
    /// roots, the coordinator's element list otherwise.
    fn finalize(&mut self, id: CoordinatorId, mut element: Element) {
        let coordinator = &mut self.coordinators[id.index()];

        if coordinator.parent.is_none() {
            element.accept_pending_values();
            self.released.push_back(element);
        } else if !element.is_null_instance() {
            coordinator.elements.push(element);
        }
    }

    /// Reset every coordinator in the chain starting at `first`, deepest
    /// first. With `publish`, each closed collection is placed into the
    /// parent's current element.
    fn reset_chain(&mut self, first: Option<CoordinatorId>, publish: bool) {
        let mut next = first;

        while let Some(id) = next {
            let child = self.coordinators[id.index()].child;
            self.reset_chain(child, publish);

            let coordinator = &mut self.coordinators[id.index()];
            coordinator.is_entered = false;
            next = coordinator.next;
            let parent = coordinator.parent;
            let current = coordinator.current.take();

            if !publish {
                coordinator.elements.clear();
                continue;
            }

            if let Some(element) = current {
                self.finalize(id, element);
            }
            let items = mem::take(&mut self.coordinators[id.index()].elements);
            if let Some(parent) = parent {
                self.publish(parent, id, items);
            }
        }
    }

    fn publish(&mut self, parent: CoordinatorId, owner: CoordinatorId, items: Vec<Element>) {
        if let Some(element) = self.coordinators[parent.index()].current.as_mut() {
            let mut items = Some(items);
            element.fill_pending(owner, &mut items);
        }
    }
}
