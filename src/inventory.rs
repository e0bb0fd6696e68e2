use tracing::{info, warn};

use crate::backend::Backend;
use crate::schema::{TableDescriptor, ALL_TABLES};
use crate::ui::Ui;

/// A registry table with its current row count and whether the user picked it
#[derive(Debug, Clone, PartialEq)]
pub struct TableSelection {
    pub table: &'static TableDescriptor,
    pub row_count: u64,
    pub selected: bool,
}

impl TableSelection {
    pub fn toggle(&mut self) {
        self.selected = !self.selected;
    }
}

/// Count the rows of every registry table, in registry order.
///
/// A table whose count fails is logged and left out; the rest of the
/// inventory is still returned. Every entry starts selected.
pub fn load_inventory(backend: &dyn Backend, ui: &mut impl Ui) -> Vec<TableSelection> {
    load_inventory_of(backend, ALL_TABLES, ui)
}

pub fn load_inventory_of(
    backend: &dyn Backend,
    tables: &[&'static TableDescriptor],
    ui: &mut impl Ui,
) -> Vec<TableSelection> {
    let mut inventory = Vec::with_capacity(tables.len());

    for (idx, table) in tables.iter().copied().enumerate() {
        ui.set_progress(idx as u64, tables.len() as u64, table.name);
        match backend.count(table.name) {
            Ok(row_count) => inventory.push(TableSelection {
                table,
                row_count,
                selected: true,
            }),
            Err(e) => {
                warn!(table = table.name, error = %e, "skipping table, row count failed");
                ui.log(format!("{}: تعذر حساب عدد السجلات ({})", table.name, e));
            }
        }
    }

    ui.clear_progress();
    info!(
        tables = inventory.len(),
        rows = inventory.iter().map(|t| t.row_count).sum::<u64>(),
        "inventory loaded from {}",
        backend.describe()
    );
    ui.show_inventory(&inventory);
    inventory
}

/// The tables the user left selected, in inventory order
pub fn selected_tables(inventory: &[TableSelection]) -> Vec<&'static TableDescriptor> {
    inventory
        .iter()
        .filter(|t| t.selected)
        .map(|t| t.table)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Call, MemoryBackend};
    use crate::parser::{FieldValue, Row};
    use crate::schema::tables::{BRANCHES, NEWS, PERSONS};
    use crate::ui::SilentUi;

    fn rows(n: i64) -> Vec<Row> {
        (1..=n)
            .map(|id| {
                let mut row = Row::new();
                row.insert("id".into(), FieldValue::Integer(id));
                row
            })
            .collect()
    }

    #[test]
    fn test_counts_every_registry_table_in_order() {
        let backend = MemoryBackend::new().with_rows(PERSONS.name, "id", rows(3));
        let inventory = load_inventory(&backend, &mut SilentUi::new());

        assert_eq!(inventory.len(), ALL_TABLES.len());
        assert!(inventory.iter().all(|t| t.selected));
        let persons = inventory.iter().find(|t| t.table.name == PERSONS.name).unwrap();
        assert_eq!(persons.row_count, 3);

        let counted: Vec<Call> = ALL_TABLES.iter().map(|t| Call::Count(t.name.into())).collect();
        assert_eq!(backend.calls(), counted);
    }

    #[test]
    fn test_failed_count_skips_only_that_table() {
        let backend = MemoryBackend::new();
        backend.fail_count(NEWS.name);

        let inventory = load_inventory(&backend, &mut SilentUi::new());
        assert_eq!(inventory.len(), ALL_TABLES.len() - 1);
        assert!(inventory.iter().all(|t| t.table.name != NEWS.name));
    }

    #[test]
    fn test_selected_tables_respects_toggles() {
        let backend = MemoryBackend::new();
        let mut inventory = load_inventory_of(&backend, &[&BRANCHES, &PERSONS], &mut SilentUi::new());
        inventory[0].toggle();
        let picked: Vec<_> = selected_tables(&inventory).iter().map(|t| t.name).collect();
        assert_eq!(picked, vec![PERSONS.name]);
    }
}
