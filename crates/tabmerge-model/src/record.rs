use std::collections::BTreeMap;

use crate::role::RoleId;

/// One unit of incoming data: a read-only mapping from role id to value.
///
/// Records are consumed strictly in input order and never mutated by the
/// engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<RoleId, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, role_id: RoleId, value: impl Into<String>) -> Self {
        self.values.insert(role_id, value.into());
        self
    }

    pub fn set(&mut self, role_id: RoleId, value: impl Into<String>) {
        self.values.insert(role_id, value.into());
    }

    pub fn get(&self, role_id: &RoleId) -> Option<&str> {
        self.values.get(role_id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RoleId, &str)> {
        self.values.iter().map(|(id, value)| (id, value.as_str()))
    }

    pub fn role_ids(&self) -> impl Iterator<Item = &RoleId> {
        self.values.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Keep only the fields whose role id satisfies `keep`.
    pub fn project(&self, mut keep: impl FnMut(&RoleId) -> bool) -> Record {
        Record {
            values: self
                .values
                .iter()
                .filter(|(id, _)| keep(id))
                .map(|(id, value)| (id.clone(), value.clone()))
                .collect(),
        }
    }

    /// Parse a record stream from a JSON array of objects.
    pub fn stream_from_json(json: &str) -> serde_json::Result<Vec<Record>> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_parses_from_json() {
        let records = Record::stream_from_json(
            r#"[{"gstub-0001": "A", "input-0001": "1"}, {"input-0001": "2"}]"#,
        )
        .expect("parse stream");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get(&RoleId::new("gstub-0001")), Some("A"));
        assert_eq!(records[1].get(&RoleId::new("gstub-0001")), None);
    }

    #[test]
    fn project_filters_fields() {
        let record = Record::new()
            .with(RoleId::new("a"), "1")
            .with(RoleId::new("b"), "2");
        let projected = record.project(|id| id.as_str() == "a");
        assert_eq!(projected.len(), 1);
        assert_eq!(projected.get(&RoleId::new("a")), Some("1"));
    }
}
