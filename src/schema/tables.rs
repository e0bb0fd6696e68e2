//! Registry of the archive tables that can be exported and imported.
//!
//! Order matters: parents come before the tables that reference them, so an
//! import that walks the registry in order never trips a foreign key.

use super::types::*;

// =============================================================================
// Reference tables
// =============================================================================

pub static BRANCHES: TableDescriptor = TableDescriptor {
    name: "الفروع",
    description: "فروع العائلة",
    primary_key: "id",
    expected_columns: &["id", "اسم_الفرع", "الوصف", "مؤسس_الفرع_id"],
};

pub static LOCATIONS: TableDescriptor = TableDescriptor {
    name: "المواقع",
    description: "المدن والقرى والمواقع الجغرافية",
    primary_key: "id",
    expected_columns: &["id", "اسم_الموقع", "الدولة", "المنطقة", "خط_العرض", "خط_الطول"],
};

// =============================================================================
// People
// =============================================================================

pub static PERSONS: TableDescriptor = TableDescriptor {
    name: "الأشخاص",
    description: "أفراد العائلة من الذكور",
    primary_key: "id",
    expected_columns: &[
        "id",
        "الاسم_الأول",
        "اسم_الشهرة",
        "رقم_الهوية_الوطنية",
        "تاريخ_الميلاد",
        "تاريخ_الوفاة",
        "مكان_الميلاد_id",
        "الأب_id",
        "الأم_id",
        "الفرع_id",
        "المهنة",
        "ملاحظات",
    ],
};

pub static WOMEN: TableDescriptor = TableDescriptor {
    name: "النساء",
    description: "نساء العائلة والزوجات",
    primary_key: "id",
    expected_columns: &[
        "id",
        "الاسم_الأول",
        "اسم_العائلة",
        "رقم_الهوية_الوطنية",
        "تاريخ_الميلاد",
        "تاريخ_الوفاة",
        "الأب_id",
        "الزوج_id",
        "ملاحظات",
    ],
};

// =============================================================================
// Archive content
// =============================================================================

pub static EVENTS: TableDescriptor = TableDescriptor {
    name: "الأحداث",
    description: "الأحداث والمناسبات العائلية",
    primary_key: "id",
    expected_columns: &["id", "عنوان_الحدث", "نوع_الحدث", "تاريخ_الحدث", "الموقع_id", "الشخص_id", "الوصف"],
};

pub static AUDIO_RECORDINGS: TableDescriptor = TableDescriptor {
    name: "التسجيلات_الصوتية",
    description: "التسجيلات الصوتية والروايات الشفهية",
    primary_key: "id",
    expected_columns: &["id", "العنوان", "الراوي", "رابط_الملف", "المدة_بالثواني", "الشخص_id", "الوصف"],
};

pub static TEXT_DOCUMENTS: TableDescriptor = TableDescriptor {
    name: "الوثائق_النصية",
    description: "الوثائق والمخطوطات النصية",
    primary_key: "id",
    expected_columns: &["id", "العنوان", "نوع_الوثيقة", "المحتوى", "رابط_الملف", "الشخص_id", "تاريخ_الوثيقة"],
};

pub static NEWS: TableDescriptor = TableDescriptor {
    name: "الأخبار",
    description: "أخبار العائلة والإعلانات",
    primary_key: "id",
    expected_columns: &["id", "العنوان", "المحتوى", "الكاتب", "صورة_الغلاف", "تاريخ_النشر", "منشور"],
};

pub static NOTABLES: TableDescriptor = TableDescriptor {
    name: "الشخصيات_البارزة",
    description: "الشخصيات البارزة في العائلة",
    primary_key: "id",
    expected_columns: &["id", "الشخص_id", "اللقب", "المجال", "السيرة", "الإنجازات", "الصورة"],
};

// =============================================================================
// Registry
// =============================================================================

/// All tables, parents first
pub static ALL_TABLES: &[&TableDescriptor] = &[
    &BRANCHES,
    &LOCATIONS,
    &PERSONS,
    &WOMEN,
    &EVENTS,
    &AUDIO_RECORDINGS,
    &TEXT_DOCUMENTS,
    &NEWS,
    &NOTABLES,
];

/// Get table descriptor by name
pub fn get_table(name: &str) -> Option<&'static TableDescriptor> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

/// Get all table names
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}

/// Upsert conflict column for a table, if it is registered
pub fn primary_key_for(name: &str) -> Option<&'static str> {
    get_table(name).map(|t| t.primary_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = table_names().into_iter().collect();
        assert_eq!(names.len(), ALL_TABLES.len());
    }

    #[test]
    fn test_primary_key_is_an_expected_column() {
        for table in ALL_TABLES {
            assert!(
                table.expects(table.primary_key),
                "{} does not list its primary key",
                table.name
            );
        }
    }

    #[test]
    fn test_parents_come_first() {
        let pos = |name: &str| table_names().iter().position(|n| *n == name).unwrap();
        assert!(pos("الفروع") < pos("الأشخاص"));
        assert!(pos("المواقع") < pos("الأحداث"));
        assert!(pos("الأشخاص") < pos("الشخصيات_البارزة"));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(get_table("الأخبار").map(|t| t.description), Some("أخبار العائلة والإعلانات"));
        assert_eq!(primary_key_for("النساء"), Some("id"));
        assert!(get_table("nonexistent").is_none());
    }
}
