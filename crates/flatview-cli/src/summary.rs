use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use flatview_core::MigrationSummary;
use flatview_verify::IntegrityReport;
use flatview_cli::logging::redact_value;

/// Mismatched cells shown on the terminal; `--diff-out` has the rest.
const MAX_PRINTED_CELLS: usize = 20;

pub fn print_migration_summary(summary: &MigrationSummary) {
    println!("Database: {}", summary.database);
    println!("View: {} ({})", summary.view, summary.view_action);

    let mut table = Table::new();
    table.set_header(vec![header_cell("Collection"), header_cell("Documents")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    let mut total = 0usize;
    for collection in &summary.collections {
        total += collection.count;
        let count = if collection.count == 0 {
            Cell::new(0).fg(Color::Yellow)
        } else {
            Cell::new(collection.count)
        };
        table.add_row(vec![Cell::new(&collection.name), count]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    if !summary.roles.is_empty() {
        println!("Roles: {}", summary.roles.join(", "));
    }
}

pub fn print_integrity_report(report: &IntegrityReport) {
    let types = &report.type_report;
    let values = &report.value_report;

    let mut table = Table::new();
    table.set_header(vec![header_cell("Check"), header_cell("Result"), header_cell("Detail")]);
    apply_table_style(&mut table);
    table.add_row(vec![
        Cell::new("Types"),
        status_cell(types.is_clean()),
        Cell::new(format!(
            "{} columns, {} differences",
            types.columns_checked,
            types.differences.len()
        )),
    ]);
    table.add_row(vec![
        Cell::new("Values"),
        status_cell(values.is_clean()),
        Cell::new(format!(
            "{} / {} rows, {} differing cells",
            values.actual_rows, values.expected_rows, values.cell_difference_count
        )),
    ]);
    println!("{table}");

    if !types.is_clean() {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Column"),
            header_cell("Kind"),
            header_cell("Source"),
            header_cell("View"),
        ]);
        apply_table_style(&mut table);
        align_column(&mut table, 2, CellAlignment::Right);
        align_column(&mut table, 3, CellAlignment::Right);
        for diff in &types.differences {
            table.add_row(vec![
                Cell::new(&diff.column),
                Cell::new(diff.kind),
                Cell::new(diff.expected),
                Cell::new(diff.actual).fg(Color::Red),
            ]);
        }
        println!("{table}");
    }

    for column in &values.missing_columns {
        eprintln!("- column '{column}' is missing from the view");
    }
    for column in &values.extra_columns {
        eprintln!("- column '{column}' is not in the source");
    }

    if !values.cells.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Row"),
            header_cell("Column"),
            header_cell("Source"),
            header_cell("View"),
        ]);
        apply_table_style(&mut table);
        align_column(&mut table, 0, CellAlignment::Right);
        for cell in values.cells.iter().take(MAX_PRINTED_CELLS) {
            let expected = cell.expected.to_string();
            let actual = cell.actual.to_string();
            table.add_row(vec![
                Cell::new(cell.row),
                Cell::new(&cell.column),
                Cell::new(redact_value(&expected)),
                Cell::new(redact_value(&actual)).fg(Color::Red),
            ]);
        }
        println!("{table}");
        if values.cell_difference_count > MAX_PRINTED_CELLS {
            println!(
                "... {} more differing cells (use --diff-out to export them)",
                values.cell_difference_count - MAX_PRINTED_CELLS
            );
        }
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn status_cell(clean: bool) -> Cell {
    if clean {
        Cell::new("pass").fg(Color::Green)
    } else {
        Cell::new("FAIL").fg(Color::Red).add_attribute(Attribute::Bold)
    }
}
