use tabmerge_engine::{find_row, merge, DegradePolicy, MergeOptions, Merger};
use tabmerge_model::{Cell, GridPos, Record, Role, RoleId, Table};

fn id(name: &str) -> RoleId {
    RoleId::new(name)
}

/// Text layout of the grid, one line per row. Continuation coordinates of a
/// spanned cell render as `^`, empty cells as `.`.
fn render(table: &Table) -> String {
    let mut lines = Vec::new();
    for row in 0..table.row_count {
        let mut cols = Vec::new();
        for col in 0..table.col_count {
            let pos = GridPos::new(row, col);
            let cell = table.cell(pos).expect("covered coordinate");
            if cell.origin == pos {
                let text = cell.text();
                cols.push(if text.is_empty() { ".".to_string() } else { text });
            } else {
                cols.push("^".to_string());
            }
        }
        lines.push(cols.join(" | "));
    }
    lines.join("\n")
}

/// Header row over one group region: a group stub and its input column.
fn group_template() -> Table {
    let mut table = Table::new(2, 2);
    table.insert_cell(
        Cell::new(GridPos::new(0, 0), 1, 1, Role::Header, id("header-0001"))
            .with_text("A")
            .with_shaded(true),
    );
    table.insert_cell(
        Cell::new(GridPos::new(0, 1), 1, 1, Role::Header, id("header-0002"))
            .with_text("B")
            .with_shaded(true),
    );
    table.insert_cell(
        Cell::new(GridPos::new(1, 0), 1, 1, Role::GroupStub, id("gstub-0001")).with_text("X"),
    );
    table.insert_cell(Cell::new(
        GridPos::new(1, 1),
        1,
        1,
        Role::Input,
        id("input-0001"),
    ));
    table
}

#[test]
fn fills_then_extends_then_starts_a_new_group() {
    let template = group_template();
    let records = vec![
        Record::new().with(id("gstub-0001"), "X").with(id("input-0001"), "1"),
        Record::new().with(id("gstub-0001"), "X").with(id("input-0001"), "2"),
        Record::new().with(id("gstub-0001"), "Y").with(id("input-0001"), "3"),
    ];

    let outcome = merge(&template, &records).expect("merge");

    insta::assert_snapshot!(render(&outcome.table), @r"
    A | B
    X | 1
    ^ | 2
    Y | 3
    ");
    assert_eq!(outcome.report.records_merged, 3);
    assert_eq!(outcome.report.rows_inserted, 2);
    assert_eq!(outcome.report.cells_filled, 1);
    assert!(!outcome.report.has_warnings());
    // The input table is untouched.
    assert_eq!(template.row_count, 2);
}

#[test]
fn group_stub_grows_downward_without_moving() {
    let template = group_template();
    let records: Vec<Record> = (1..=3)
        .map(|n| {
            Record::new()
                .with(id("gstub-0001"), "X")
                .with(id("input-0001"), n.to_string())
        })
        .collect();

    let outcome = merge(&template, &records).expect("merge");

    let group = outcome
        .table
        .cell_at_origin(GridPos::new(1, 0))
        .expect("group stub");
    assert_eq!(group.row_span, 3);
    assert_eq!(outcome.table.origins_for(&id("gstub-0001")), &[GridPos::new(1, 0)]);
    assert_eq!(outcome.table.row_count, 4);
}

#[test]
fn record_without_input_values_is_a_noop() {
    let template = group_template();
    let records = vec![Record::new()
        .with(id("gstub-0001"), "X")
        .with(id("input-0001"), "  ")];

    let outcome = merge(&template, &records).expect("merge");

    assert_eq!(outcome.table, template);
    assert_eq!(outcome.report.records_merged, 0);
    assert_eq!(outcome.report.records_skipped, 1);
}

#[test]
fn add_fields_accumulate_without_new_rows() {
    let mut template = Table::new(2, 1);
    template.insert_cell(
        Cell::new(GridPos::new(0, 0), 1, 1, Role::Header, id("header-0001"))
            .with_text("Notes")
            .with_shaded(true),
    );
    template.insert_cell(Cell::new(
        GridPos::new(1, 0),
        1,
        1,
        Role::Add,
        id("add-0001"),
    ));

    let records: Vec<Record> = (0..10)
        .map(|n| Record::new().with(id("add-0001"), format!("note{n}")))
        .collect();
    let outcome = merge(&template, &records).expect("merge");

    assert_eq!(outcome.table.row_count, 2);
    assert_eq!(outcome.report.rows_inserted, 0);
    assert_eq!(outcome.report.records_merged, 10);
    let text = outcome
        .table
        .cell_at_origin(GridPos::new(1, 0))
        .map(|cell| cell.text())
        .unwrap_or_default();
    assert_eq!(
        text,
        "note0 note1 note2 note3 note4 note5 note6 note7 note8 note9"
    );
}

#[test]
fn add_fields_can_append_as_paragraphs() {
    let mut template = Table::new(1, 1);
    template.insert_cell(
        Cell::new(GridPos::new(0, 0), 1, 1, Role::Add, id("add-0001")).with_text("first"),
    );
    let options = MergeOptions {
        add_paragraph_break: true,
        ..MergeOptions::default()
    };
    let records = vec![Record::new().with(id("add-0001"), "second")];

    let outcome = Merger::new(options).merge(&template, &records).expect("merge");

    let cell = outcome
        .table
        .cell_at_origin(GridPos::new(0, 0))
        .expect("add cell");
    assert_eq!(cell.paragraphs, vec!["first", "second"]);
}

#[test]
fn fills_empty_cells_before_appending_rows() {
    let mut template = Table::new(3, 1);
    template.insert_cell(
        Cell::new(GridPos::new(0, 0), 1, 1, Role::Header, id("header-0001"))
            .with_text("V")
            .with_shaded(true),
    );
    template.insert_cell(
        Cell::new(GridPos::new(1, 0), 1, 1, Role::Input, id("input-0001")).with_text("seed"),
    );
    template.insert_cell(Cell::new(
        GridPos::new(2, 0),
        1,
        1,
        Role::Input,
        id("input-0001"),
    ));

    let records = vec![
        Record::new().with(id("input-0001"), "1"),
        Record::new().with(id("input-0001"), "2"),
    ];
    let outcome = merge(&template, &records).expect("merge");

    insta::assert_snapshot!(render(&outcome.table), @r"
    V
    seed
    1
    2
    ");
    assert_eq!(outcome.report.cells_filled, 1);
    assert_eq!(outcome.report.rows_inserted, 1);
}

#[test]
fn fill_can_be_disabled() {
    let mut template = Table::new(2, 1);
    template.insert_cell(
        Cell::new(GridPos::new(0, 0), 1, 1, Role::Header, id("header-0001"))
            .with_text("V")
            .with_shaded(true),
    );
    template.insert_cell(Cell::new(
        GridPos::new(1, 0),
        1,
        1,
        Role::Input,
        id("input-0001"),
    ));

    let options = MergeOptions {
        fill_empty_first: false,
        ..MergeOptions::default()
    };
    let records = vec![Record::new().with(id("input-0001"), "1")];
    let outcome = Merger::new(options).merge(&template, &records).expect("merge");

    // The empty template cell stays empty; the value lands in a new row.
    assert_eq!(outcome.table.row_count, 3);
    assert_eq!(outcome.report.rows_inserted, 1);
    assert_eq!(outcome.report.cells_filled, 0);
}

#[test]
fn unknown_field_drops_the_whole_record() {
    let template = group_template();
    let records = vec![
        Record::new()
            .with(id("mystery-0001"), "?")
            .with(id("input-0001"), "1"),
        Record::new().with(id("input-0001"), "2"),
    ];

    let outcome = merge(&template, &records).expect("merge");

    assert_eq!(outcome.report.records_skipped, 1);
    assert_eq!(outcome.report.records_merged, 1);
    assert_eq!(outcome.report.skipped_fields.len(), 1);
    assert_eq!(outcome.report.skipped_fields[0].record_index, 0);
    assert_eq!(outcome.report.skipped_fields[0].role_id, id("mystery-0001"));
    // Only the second record landed.
    assert_eq!(
        outcome
            .table
            .cell_at_origin(GridPos::new(1, 1))
            .map(|cell| cell.text()),
        Some("2".to_string())
    );
}

#[test]
fn ambiguous_stub_match_uses_the_earliest_row() {
    let mut template = Table::new(3, 2);
    template.insert_cell(
        Cell::new(GridPos::new(0, 0), 1, 1, Role::Header, id("header-0001"))
            .with_text("S")
            .with_shaded(true),
    );
    template.insert_cell(
        Cell::new(GridPos::new(0, 1), 1, 1, Role::Header, id("header-0002"))
            .with_text("V")
            .with_shaded(true),
    );
    for row in 1..3 {
        template.insert_cell(
            Cell::new(GridPos::new(row, 0), 1, 1, Role::Stub, id("stub-0001")).with_text("same"),
        );
        template.insert_cell(Cell::new(
            GridPos::new(row, 1),
            1,
            1,
            Role::Input,
            id("input-0001"),
        ));
    }

    let records = vec![Record::new()
        .with(id("stub-0001"), "same")
        .with(id("input-0001"), "v")];
    let outcome = merge(&template, &records).expect("merge");

    assert_eq!(
        outcome
            .table
            .cell_at_origin(GridPos::new(1, 1))
            .map(|cell| cell.text()),
        Some("v".to_string())
    );
    assert!(outcome.report.has_warnings());
    assert_eq!(outcome.report.tie_breaks.len(), 1);
    assert_eq!(outcome.report.tie_breaks[0].chosen_row, 1);
    assert_eq!(outcome.report.tie_breaks[0].candidate_rows, vec![1, 2]);
}

#[test]
fn header_and_data_values_are_ignored_silently() {
    let template = group_template();
    let records = vec![Record::new()
        .with(id("header-0001"), "overwritten?")
        .with(id("gstub-0001"), "X")
        .with(id("input-0001"), "1")];

    let outcome = merge(&template, &records).expect("merge");

    assert_eq!(
        outcome
            .table
            .cell_at_origin(GridPos::new(0, 0))
            .map(|cell| cell.text()),
        Some("A".to_string())
    );
    assert!(outcome.report.skipped_fields.is_empty());
    assert_eq!(outcome.report.records_merged, 1);
}

#[test]
fn stub_row_match_duplicates_the_stub() {
    let mut template = Table::new(2, 2);
    template.insert_cell(
        Cell::new(GridPos::new(0, 0), 1, 1, Role::Header, id("header-0001"))
            .with_text("S")
            .with_shaded(true),
    );
    template.insert_cell(
        Cell::new(GridPos::new(0, 1), 1, 1, Role::Header, id("header-0002"))
            .with_text("V")
            .with_shaded(true),
    );
    template.insert_cell(
        Cell::new(GridPos::new(1, 0), 1, 1, Role::Stub, id("stub-0001")).with_text("dose"),
    );
    template.insert_cell(
        Cell::new(GridPos::new(1, 1), 1, 1, Role::Input, id("input-0001")).with_text("10mg"),
    );

    let records = vec![Record::new()
        .with(id("stub-0001"), "dose")
        .with(id("input-0001"), "20mg")];
    let outcome = merge(&template, &records).expect("merge");

    insta::assert_snapshot!(render(&outcome.table), @r"
    S | V
    dose | 10mg
    dose | 20mg
    ");
}

#[test]
fn degrade_policy_controls_unlabeled_appends() {
    let mut template = Table::new(2, 2);
    template.insert_cell(
        Cell::new(GridPos::new(0, 0), 1, 1, Role::Header, id("header-0001"))
            .with_text("S")
            .with_shaded(true),
    );
    template.insert_cell(
        Cell::new(GridPos::new(0, 1), 1, 1, Role::Header, id("header-0002"))
            .with_text("V")
            .with_shaded(true),
    );
    template.insert_cell(
        Cell::new(GridPos::new(1, 0), 1, 1, Role::Stub, id("stub-0001")).with_text("last"),
    );
    template.insert_cell(
        Cell::new(GridPos::new(1, 1), 1, 1, Role::Input, id("input-0001")).with_text("seed"),
    );
    let records = vec![Record::new().with(id("input-0001"), "9")];

    let duplicated = Merger::new(MergeOptions::default())
        .merge(&template, &records)
        .expect("merge");
    assert_eq!(
        duplicated
            .table
            .cell_at_origin(GridPos::new(2, 0))
            .map(|cell| cell.text()),
        Some("last".to_string())
    );

    let options = MergeOptions {
        degrade: DegradePolicy::LeaveEmpty,
        ..MergeOptions::default()
    };
    let emptied = Merger::new(options).merge(&template, &records).expect("merge");
    assert_eq!(
        emptied
            .table
            .cell_at_origin(GridPos::new(2, 0))
            .map(|cell| cell.text()),
        Some(String::new())
    );
}

#[test]
fn nested_tables_receive_their_own_fields() {
    let mut inner = Table::new(1, 2);
    inner.insert_cell(
        Cell::new(GridPos::new(0, 0), 1, 1, Role::Stub, id("stub-0001")).with_text("inner"),
    );
    inner.insert_cell(Cell::new(
        GridPos::new(0, 1),
        1,
        1,
        Role::Input,
        id("input-0002"),
    ));

    let mut template = Table::new(1, 2);
    template.insert_cell(Cell::new(
        GridPos::new(0, 0),
        1,
        1,
        Role::Input,
        id("input-0001"),
    ));
    let mut host = Cell::new(GridPos::new(0, 1), 1, 1, Role::Data, id("data-0001"));
    host.nested = Some(Box::new(inner));
    template.insert_cell(host);

    let records = vec![Record::new()
        .with(id("input-0001"), "outer value")
        .with(id("input-0002"), "inner value")];
    let outcome = merge(&template, &records).expect("merge");

    assert_eq!(outcome.table.row_count, 1);
    assert_eq!(
        outcome
            .table
            .cell_at_origin(GridPos::new(0, 0))
            .map(|cell| cell.text()),
        Some("outer value".to_string())
    );
    let nested = outcome
        .table
        .cell_at_origin(GridPos::new(0, 1))
        .and_then(|cell| cell.nested.as_deref())
        .expect("nested table");
    assert_eq!(
        nested
            .cell_at_origin(GridPos::new(0, 1))
            .map(|cell| cell.text()),
        Some("inner value".to_string())
    );
    assert_eq!(outcome.report.records_merged, 1);
}

#[test]
fn find_row_resolves_labels_to_the_covered_rows() {
    let template = group_template();
    let matched = find_row(
        &template,
        &Record::new().with(id("gstub-0001"), "X"),
    )
    .expect("match");
    assert_eq!(matched.row, 1);
    assert_eq!(matched.groups, vec![GridPos::new(1, 0)]);

    assert!(find_row(&template, &Record::new().with(id("gstub-0001"), "Z")).is_none());
}

#[test]
fn classified_template_merges_end_to_end() {
    use tabmerge_classify::Classifier;
    use tabmerge_model::{Color, RawCell, RawGrid};

    let gray = Color::new(204, 204, 204);
    let grid = RawGrid::new(2, 2)
        .with_cell(RawCell::new(0, 0).with_text("Item").with_background(gray))
        .with_cell(RawCell::new(0, 1).with_text("Qty").with_background(gray))
        .with_cell(RawCell::new(1, 0).with_text("apples"))
        .with_cell(RawCell::new(1, 1));
    let template = Classifier::default().classify(&grid).expect("classify");

    let records = Record::stream_from_json(
        r#"[
            {"stub-0001": "apples", "input-0001": "4"},
            {"stub-0001": "pears", "input-0001": "2"}
        ]"#,
    )
    .expect("records");
    let outcome = merge(&template, &records).expect("merge");

    insta::assert_snapshot!(render(&outcome.table), @r"
    Item | Qty
    apples | 4
    pears | 2
    ");
    let report = serde_json::to_value(&outcome.report).expect("report json");
    assert_eq!(report["records_merged"], 2);
    assert_eq!(report["rows_inserted"], 1);
}

#[test]
fn merged_tables_keep_full_coverage() {
    let template = group_template();
    let records: Vec<Record> = (0..6)
        .map(|n| {
            Record::new()
                .with(id("gstub-0001"), if n % 2 == 0 { "X" } else { "Y" })
                .with(id("input-0001"), n.to_string())
        })
        .collect();

    let outcome = merge(&template, &records).expect("merge");
    assert!(outcome.table.verify_coverage().is_ok());
}
