use anyhow::{bail, Result};
use tracing::info;

use crate::schema::{get_table, TableDescriptor, ALL_TABLES};

/// Resolves which tables to process based on include/exclude filters.
/// The result is always in registry order.
pub fn resolve_tables(
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
) -> Result<Vec<&'static TableDescriptor>> {
    match (include, exclude) {
        (Some(_), Some(_)) => {
            bail!("Cannot use both --tables and --exclude at the same time");
        }
        (Some(include_list), None) => {
            check_known(&include_list)?;
            let tables: Vec<_> = ALL_TABLES
                .iter()
                .copied()
                .filter(|t| include_list.iter().any(|n| n == t.name))
                .collect();
            info!("Including {} tables", tables.len());
            Ok(tables)
        }
        (None, Some(exclude_list)) => {
            check_known(&exclude_list)?;
            let tables: Vec<_> = ALL_TABLES
                .iter()
                .copied()
                .filter(|t| !exclude_list.iter().any(|n| n == t.name))
                .collect();
            info!("Including {} tables (after exclusions)", tables.len());
            Ok(tables)
        }
        (None, None) => Ok(ALL_TABLES.to_vec()),
    }
}

fn check_known(names: &[String]) -> Result<()> {
    for name in names {
        if get_table(name).is_none() {
            bail!("Unknown table: {}", name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_keeps_registry_order() {
        let tables = resolve_tables(Some(vec!["الأخبار".into(), "الفروع".into()]), None).unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["الفروع", "الأخبار"]);
    }

    #[test]
    fn test_exclude() {
        let tables = resolve_tables(None, Some(vec!["الأخبار".into()])).unwrap();
        assert_eq!(tables.len(), ALL_TABLES.len() - 1);
        assert!(tables.iter().all(|t| t.name != "الأخبار"));
    }

    #[test]
    fn test_unknown_table_error() {
        assert!(resolve_tables(Some(vec!["nonexistent".into()]), None).is_err());
        assert!(resolve_tables(None, Some(vec!["nonexistent".into()])).is_err());
    }

    #[test]
    fn test_both_filters_rejected() {
        assert!(resolve_tables(Some(vec![]), Some(vec![])).is_err());
    }
}
