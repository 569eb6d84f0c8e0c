use crate::value::Value;
use serde::Deserialize;
use std::fmt;

///
/// EntityKey
///
/// Identity of a materialized entity: its entity set plus key values in
/// declaration order.
///

#[derive(Clone, Debug, PartialEq)]
pub struct EntityKey {
    pub entity_set: String,
    pub values: Vec<Value>,
}

impl EntityKey {
    #[must_use]
    pub fn new(entity_set: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            entity_set: entity_set.into(),
            values,
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.entity_set)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{value:?}")?;
        }
        f.write_str(")")
    }
}

///
/// MergeOption
///
/// How freshly materialized entities combine with already-tracked ones.
/// Interpreted by the identity resolver; the materializer only forwards it.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum MergeOption {
    #[default]
    AppendOnly,
    NoTracking,
    OverwriteChanges,
    PreserveChanges,
}

impl MergeOption {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AppendOnly => "append_only",
            Self::NoTracking => "no_tracking",
            Self::OverwriteChanges => "overwrite_changes",
            Self::PreserveChanges => "preserve_changes",
        }
    }
}

impl fmt::Display for MergeOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
