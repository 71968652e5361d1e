use anyhow::bail;

use super::fields::{required_text, text};
use super::{Formatter, Sql, copy_from_stdin};

const COLUMNS: &[&str] = &[
    "table_name",
    "field_name",
    "language",
    "translation",
    "record_id",
    "record_sub_id",
    "field_value",
];

pub(super) fn translations() -> Formatter {
    Formatter::new()
        .setup(Sql::dynamic(|opts| {
            let table = opts.qualify("translations");
            format!(
                r#"CREATE TABLE {table} (
	table_name TEXT NOT NULL,
	field_name TEXT NOT NULL,
	language TEXT NOT NULL
		CONSTRAINT valid_language CHECK ({schema}.is_bcp_47_code(language)),
	translation TEXT NOT NULL,
	record_id TEXT,
	record_sub_id TEXT,
	field_value TEXT
);

{copy}"#,
                schema = opts.schema(),
                copy = copy_from_stdin(&table, COLUMNS),
            )
        }))
        .row(|row, _| {
            let record_id = text(row, "record_id");
            let field_value = text(row, "field_value");
            if !record_id.is_null() && !field_value.is_null() {
                bail!("record_id and field_value are mutually exclusive");
            }

            Ok(vec![
                required_text(row, "table_name")?,
                required_text(row, "field_name")?,
                required_text(row, "language")?,
                required_text(row, "translation")?,
                record_id,
                text(row, "record_sub_id"),
                field_value,
            ])
        })
        .teardown(Sql::dynamic(|opts| {
            format!(
                "\\.\n\nCREATE INDEX ON {} (table_name, field_name, language)",
                opts.qualify("translations")
            )
        }))
}
