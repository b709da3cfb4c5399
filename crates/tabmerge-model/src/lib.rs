pub mod cell;
pub mod error;
pub mod raw;
pub mod record;
pub mod role;
pub mod table;

pub use cell::{Cell, GridPos};
pub use error::{GridError, Result};
pub use raw::{Color, RawCell, RawGrid};
pub use record::Record;
pub use role::{Role, RoleId};
pub use table::{FieldSummary, Table, TableSummary};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_serializes() {
        let mut table = Table::new(1, 1);
        table.insert_cell(Cell::new(
            GridPos::new(0, 0),
            1,
            1,
            Role::Input,
            RoleId::new("input-0001"),
        ));
        let summary = table.summary();
        let json = serde_json::to_string(&summary).expect("serialize summary");
        let round: TableSummary = serde_json::from_str(&json).expect("deserialize summary");
        assert_eq!(round.row_count, 1);
        assert_eq!(round.fields.len(), 1);
        assert_eq!(round.empty_cells, vec![GridPos::new(0, 0)]);
    }

    #[test]
    fn record_round_trips() {
        let record = Record::new()
            .with(RoleId::new("gstub-0001"), "group A")
            .with(RoleId::new("input-0001"), "42");
        let json = serde_json::to_string(&record).expect("serialize record");
        let round: Record = serde_json::from_str(&json).expect("deserialize record");
        assert_eq!(round, record);
    }
}
