use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::generate::GenerationReport;

pub fn summary_table(report: &GenerationReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        header_cell("Platform"),
        header_cell("Build"),
        header_cell("Build file"),
        header_cell("Nodes"),
        header_cell("Tests"),
        header_cell("Scenarios"),
    ]);
    for index in 3..6 {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
    for cell in &report.cells {
        table.add_row(vec![
            Cell::new(cell.platform),
            Cell::new(cell.build_type),
            Cell::new(cell.path.display()),
            Cell::new(cell.nodes),
            Cell::new(cell.tests),
            Cell::new(cell.scenarios),
        ]);
    }
    table
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Prints the generation summary to stdout.
pub fn print_summary(report: &GenerationReport) {
    if report.cells.is_empty() {
        return;
    }
    println!("{}", summary_table(report));
    if !report.disabled_tests.is_empty() {
        println!("Disabled: {}", report.disabled_tests.join(", "));
    }
}
