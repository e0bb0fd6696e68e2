use crate::schema::TableDescriptor;

/// Quote an identifier for SQLite (table and column names are Arabic)
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Generate CREATE TABLE SQL for a registry table.
///
/// Columns are left untyped so SQLite keeps whatever affinity the imported
/// value has, the same way the hosted tables accept whatever the forms send.
pub fn generate_create_table(table: &TableDescriptor) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", quote_ident(table.name));
    let mut columns = Vec::new();

    for col in table.expected_columns {
        let pk = if *col == table.primary_key { " PRIMARY KEY" } else { "" };
        columns.push(format!("    {}{}", quote_ident(col), pk));
    }

    for managed in ["created_at", "updated_at"] {
        columns.push(format!(
            "    {} TEXT DEFAULT CURRENT_TIMESTAMP",
            quote_ident(managed)
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate the upsert statement for one row shape
pub fn generate_upsert(
    table: &str,
    columns: &[&str],
    conflict_key: &str,
    ignore_duplicates: bool,
) -> String {
    let quoted: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();

    let updates: Vec<String> = columns
        .iter()
        .filter(|c| **c != conflict_key)
        .map(|c| format!("{0} = excluded.{0}", quote_ident(c)))
        .collect();

    let on_conflict = if ignore_duplicates || updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };

    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) {}",
        quote_ident(table),
        quoted.join(", "),
        placeholders.join(", "),
        quote_ident(conflict_key),
        on_conflict
    )
}
