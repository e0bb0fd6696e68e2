/// Static description of one backend table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Backend table name (also the sheet name in Excel exports)
    pub name: &'static str,
    /// Human-readable description shown next to the table
    pub description: &'static str,
    /// Conflict target for upserts
    pub primary_key: &'static str,
    /// Columns written to blank templates, in order
    pub expected_columns: &'static [&'static str],
}

impl TableDescriptor {
    /// Whether `column` belongs to the expected column list
    pub fn expects(&self, column: &str) -> bool {
        self.expected_columns.iter().any(|c| *c == column)
    }
}

impl std::fmt::Display for TableDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.description)
    }
}
