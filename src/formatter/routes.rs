use super::fields::{integer, required_integer, required_text, text};
use super::{Formatter, Sql, copy_from_stdin};
use crate::encode::Value;

const COLUMNS: &[&str] = &[
    "route_id",
    "agency_id",
    "route_short_name",
    "route_long_name",
    "route_desc",
    "route_type",
    "route_url",
    "route_color",
    "route_text_color",
    "route_sort_order",
];

pub(super) fn routes() -> Formatter {
    Formatter::new()
        .setup(Sql::dynamic(|opts| {
            let table = opts.qualify("routes");
            let agency_id = if opts.routes_without_agency_id {
                String::from("agency_id TEXT")
            } else {
                format!(
                    "agency_id TEXT REFERENCES {agency} (agency_id)",
                    agency = opts.qualify("agency"),
                )
            };

            format!(
                r#"CREATE TABLE {table} (
	route_id TEXT PRIMARY KEY,
	{agency_id},
	route_short_name TEXT,
	route_long_name TEXT,
	route_desc TEXT,
	route_type INTEGER NOT NULL,
	route_url TEXT,
	route_color TEXT,
	route_text_color TEXT,
	route_sort_order INTEGER
		CONSTRAINT valid_route_sort_order CHECK (route_sort_order >= 0)
);

{copy}"#,
                copy = copy_from_stdin(&table, COLUMNS),
            )
        }))
        .row(|row, opts| {
            let agency_id = match row.get("agency_id") {
                Some(id) => id.into(),
                // single-agency feeds may omit it, matching agency's default
                None if !opts.routes_without_agency_id => "".into(),
                None => Value::Null,
            };

            Ok(vec![
                required_text(row, "route_id")?,
                agency_id,
                text(row, "route_short_name"),
                text(row, "route_long_name"),
                text(row, "route_desc"),
                required_integer(row, "route_type")?,
                text(row, "route_url"),
                text(row, "route_color"),
                text(row, "route_text_color"),
                integer(row, "route_sort_order")?,
            ])
        })
        .teardown(Sql::dynamic(|opts| {
            format!(
                "\\.\n\nCREATE INDEX ON {} (route_short_name)",
                opts.qualify("routes")
            )
        }))
}
