use std::fmt;

/// Semantic classification of a template cell.
///
/// Roles drive merge behavior: `Header` and `Data` cells are never written,
/// `Add` cells accumulate text in place, `Stub`/`GroupStub` cells identify
/// rows, and `Input` cells receive record values.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum Role {
    Header,
    Stub,
    GroupStub,
    Input,
    Add,
    Data,
    Unclassified,
}

impl Role {
    /// Header and Data cells are preserved verbatim by every merge.
    pub fn is_immutable(self) -> bool {
        matches!(self, Self::Header | Self::Data)
    }

    /// Stub and GroupStub cells carry row-identifying labels.
    pub fn is_label(self) -> bool {
        matches!(self, Self::Stub | Self::GroupStub)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Header => "header",
            Self::Stub => "stub",
            Self::GroupStub => "gstub",
            Self::Input => "input",
            Self::Add => "add",
            Self::Data => "data",
            Self::Unclassified => "unclassified",
        };
        f.write_str(name)
    }
}

/// Identifier unifying cells that represent the same logical field.
///
/// Only `Input` cells share a `RoleId` across rows; every other role's
/// identity is the cell itself and receives a unique id at classification.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct RoleId(String);

impl RoleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
