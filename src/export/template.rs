use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook};

use super::{ExportError, ExportFile};
use crate::schema::TableDescriptor;

pub const DATA_SHEET: &str = "البيانات";
pub const INSTRUCTIONS_SHEET: &str = "تعليمات";

const GUIDANCE: &[&str] = &[
    "املأ البيانات في ورقة \"البيانات\" ابتداءً من الصف الثاني.",
    "لا تغيّر أسماء الأعمدة في الصف الأول.",
    "السجل الذي يطابق مفتاحه سجلاً موجوداً سيستبدل السجل الموجود بالكامل.",
    "أعمدة تاريخ الإنشاء والتحديث تُدار تلقائياً ويتم تجاهلها عند الاستيراد.",
    "اترك الخلية فارغة إذا لم تتوفر القيمة.",
    "احفظ الملف بصيغة xlsx ثم استورده مع تحديد الجدول المستهدف.",
];

/// `template-<table>-<YYYY-MM-DD>.xlsx`
pub fn template_file_name(table: &TableDescriptor, now: DateTime<Utc>) -> String {
    format!("template-{}-{}.xlsx", table.name, now.format("%Y-%m-%d"))
}

/// Blank workbook for filling in rows of one table by hand
pub fn template_xlsx(table: &TableDescriptor, now: DateTime<Utc>) -> Result<ExportFile, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let data = workbook.add_worksheet();
    data.set_name(DATA_SHEET)?;
    data.set_right_to_left(true);
    for (col, name) in table.expected_columns.iter().enumerate() {
        data.write_string_with_format(0, col as u16, *name, &bold)?;
        data.set_column_width(col as u16, 18)?;
    }

    let help = workbook.add_worksheet();
    help.set_name(INSTRUCTIONS_SHEET)?;
    help.set_right_to_left(true);
    help.set_column_width(0, 90)?;
    help.write_string_with_format(
        0,
        0,
        format!("قالب جدول {} ({})", table.name, table.description),
        &bold,
    )?;
    help.write_string(1, 0, format!("المفتاح الأساسي: {}", table.primary_key))?;
    for (i, line) in GUIDANCE.iter().enumerate() {
        help.write_string(i as u32 + 3, 0, format!("{}. {}", i + 1, line))?;
    }

    Ok(ExportFile {
        file_name: template_file_name(table, now),
        bytes: workbook.save_to_buffer()?,
    })
}
