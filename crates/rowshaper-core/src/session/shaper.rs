use crate::{
    cursor::RowCursor,
    error::InternalError,
    plan::{SlotId, slot_key_eq},
    session::CoordinatorId,
    traits::{DefaultObjectFactory, IdentityResolver, NoTracking, ObjectFactory},
    value::Value,
};
use std::{fmt, sync::Arc};

///
/// StateSlot
///
/// One entry of a session's state-slot array.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub enum StateSlot {
    #[default]
    Empty,
    Value(Value),
    Coordinator(CoordinatorId),
    EntitySet(Option<String>),
}

///
/// Collaborators
///
/// Construction and identity collaborators handed to every accessor.
///

#[derive(Clone)]
pub struct Collaborators {
    pub factory: Arc<dyn ObjectFactory>,
    pub identity: Arc<dyn IdentityResolver>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            factory: Arc::new(DefaultObjectFactory),
            identity: Arc::new(NoTracking),
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

///
/// RowContext
///
/// What a compiled accessor sees for one row: the cursor positioned on the
/// row, the session's state slots and the collaborators.
///

pub struct RowContext<'a> {
    cursor: &'a dyn RowCursor,
    slots: &'a mut [StateSlot],
    collaborators: &'a Collaborators,
}

impl<'a> RowContext<'a> {
    pub(crate) fn new(
        cursor: &'a dyn RowCursor,
        slots: &'a mut [StateSlot],
        collaborators: &'a Collaborators,
    ) -> Self {
        Self {
            cursor,
            slots,
            collaborators,
        }
    }

    pub(crate) fn read(&self, ordinal: usize) -> Result<&'a Value, InternalError> {
        let cursor = self.cursor;

        cursor
            .value(ordinal)
            .map_err(|err| InternalError::row_read(&err))
    }

    pub(crate) fn is_null(&self, ordinal: usize) -> Result<bool, InternalError> {
        self.cursor
            .is_null(ordinal)
            .map_err(|err| InternalError::row_read(&err))
    }

    pub(crate) fn factory(&self) -> &'a dyn ObjectFactory {
        let collaborators = self.collaborators;

        collaborators.factory.as_ref()
    }

    pub(crate) fn identity(&self) -> &'a dyn IdentityResolver {
        let collaborators = self.collaborators;

        collaborators.identity.as_ref()
    }

    pub(crate) fn key_matches(&self, slot: SlotId, value: &Value) -> bool {
        let recorded = match self.slots.get(slot.index()) {
            Some(StateSlot::Value(recorded)) => Some(recorded),
            _ => None,
        };

        slot_key_eq(recorded, value)
    }

    pub(crate) fn set_value(&mut self, slot: SlotId, value: Value) {
        if let Some(entry) = self.slots.get_mut(slot.index()) {
            *entry = StateSlot::Value(value);
        }
    }

    pub(crate) fn coordinator(&self, slot: SlotId) -> Result<CoordinatorId, InternalError> {
        match self.slots.get(slot.index()) {
            Some(StateSlot::Coordinator(id)) => Ok(*id),
            other => Err(InternalError::session_invariant(format!(
                "state slot {slot} does not hold a coordinator: {other:?}"
            ))),
        }
    }

    pub(crate) fn set_entity_set(&mut self, slot: SlotId, entity_set: Option<String>) {
        if let Some(entry) = self.slots.get_mut(slot.index()) {
            *entry = StateSlot::EntitySet(entity_set);
        }
    }

    pub(crate) fn entity_set(&self, slot: SlotId) -> Result<Option<String>, InternalError> {
        match self.slots.get(slot.index()) {
            Some(StateSlot::EntitySet(entity_set)) => Ok(entity_set.clone()),
            other => Err(InternalError::session_invariant(format!(
                "state slot {slot} does not hold an entity set: {other:?}"
            ))),
        }
    }
}
