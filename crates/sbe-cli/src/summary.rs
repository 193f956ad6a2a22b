use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use sbe_model::ValidationResult;
use sbe_resources::ResourceEntry;
use sbe_transform::PipelineReport;

use sbe_cli::types::{ConvertOutcome, ValidateOutcome};

pub fn print_validation(outcome: &ValidateOutcome) {
    println!("Input: {}", outcome.input.display());
    println!("Schema: {}", outcome.schema);
    if let Some(path) = &outcome.event_log {
        println!("Event log: {}", path.display());
    }
    println!("{}", counts_table(&outcome.result));
    println!("Verdict: {}", verdict(outcome.result.is_valid()));
}

pub fn print_conversion(outcome: &ConvertOutcome) {
    println!("SBE version: {}", outcome.version);
    println!("{}", stage_table(&outcome.report));
    println!("Schema: {}", outcome.schema.display());
    match &outcome.validation {
        Some(result) => {
            println!("{}", counts_table(result));
            println!("Verdict: {}", verdict(result.is_valid()));
        }
        None => println!("Validation skipped"),
    }
}

pub fn print_resources(entries: &[ResourceEntry]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Name"),
        header_cell("Source"),
        header_cell("URL"),
    ]);
    apply_table_style(&mut table);
    for entry in entries {
        let source = if entry.packaged {
            dim_cell("packaged")
        } else {
            Cell::new("file").fg(Color::Blue)
        };
        table.add_row(vec![Cell::new(&entry.name), source, Cell::new(entry.url.as_str())]);
    }
    println!("{table}");
}

fn stage_table(report: &PipelineReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Script"),
        header_cell("Output"),
        header_cell("Bytes"),
        header_cell("ms"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for (index, stage) in report.stages.iter().enumerate() {
        let script = stage
            .script
            .file_name()
            .map_or_else(|| stage.script.display().to_string(), |name| name.to_string_lossy().into_owned());
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(script).fg(Color::Blue).add_attribute(Attribute::Bold),
            Cell::new(stage.output.display()),
            Cell::new(stage.bytes),
            dim_cell(stage.elapsed.as_millis()),
        ]);
    }
    table
}

fn counts_table(result: &ValidationResult) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Fatal errors"),
        header_cell("Errors"),
        header_cell("Warnings"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 0..3 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        count_cell(result.fatal_errors(), Color::Red),
        count_cell(result.errors(), Color::Red),
        count_cell(result.warnings(), Color::Yellow),
    ]);
    table
}

fn verdict(valid: bool) -> &'static str {
    if valid { "valid" } else { "invalid" }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
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

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
