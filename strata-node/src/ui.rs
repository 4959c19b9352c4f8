use comfy_table::{presets, CellAlignment, ContentArrangement, Table};
use strata_precompiles::Precompile;
use strata_types::primitives::address_to_hex;

/// Data table with a header row and dynamic width.
pub fn data_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(headers);
    table
}

pub fn cell_right(content: impl ToString) -> comfy_table::Cell {
    comfy_table::Cell::new(content).set_alignment(CellAlignment::Right)
}

/// Selector, signature, classification and static gas of every method.
pub fn methods_table(precompile: &dyn Precompile) -> Table {
    let mut table = data_table(&["Selector", "Method", "Kind", "Gas"]);
    for method in precompile.methods() {
        table.add_row(vec![
            comfy_table::Cell::new(format!("0x{}", hex::encode(method.selector))),
            comfy_table::Cell::new(method.signature),
            comfy_table::Cell::new(method.kind),
            cell_right(method.gas),
        ]);
    }
    table
}

pub fn print_methods(precompile: &dyn Precompile) {
    println!(
        "  {} at {}",
        precompile.name(),
        address_to_hex(&precompile.address())
    );
    print_table(&methods_table(precompile));
}

/// Print with a 2-space left indent.
pub fn print_table(table: &Table) {
    for line in table.lines() {
        println!("  {}", line);
    }
}
