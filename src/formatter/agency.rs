use super::fields::{required_text, text};
use super::{Formatter, Sql, copy_from_stdin};
use crate::encode::Value;

const COLUMNS: &[&str] = &[
    "agency_id",
    "agency_name",
    "agency_url",
    "agency_timezone",
    "agency_lang",
    "agency_phone",
    "agency_fare_url",
    "agency_email",
];

pub(super) fn agency() -> Formatter {
    Formatter::new()
        .setup(Sql::dynamic(|opts| {
            let table = opts.qualify("agency");
            format!(
                r#"CREATE TABLE {table} (
	agency_id TEXT PRIMARY KEY,
	agency_name TEXT NOT NULL,
	agency_url TEXT NOT NULL,
	agency_timezone TEXT NOT NULL
		CONSTRAINT valid_timezone CHECK ({schema}.is_timezone(agency_timezone)),
	agency_lang TEXT,
	agency_phone TEXT,
	agency_fare_url TEXT,
	agency_email TEXT
);

{copy}"#,
                schema = opts.schema(),
                copy = copy_from_stdin(&table, COLUMNS),
            )
        }))
        .row(|row, _| {
            Ok(vec![
                // agency_id may be omitted by single-agency feeds
                row.get("agency_id").map_or(Value::text(""), Value::from),
                required_text(row, "agency_name")?,
                required_text(row, "agency_url")?,
                required_text(row, "agency_timezone")?,
                text(row, "agency_lang"),
                text(row, "agency_phone"),
                text(row, "agency_fare_url"),
                text(row, "agency_email"),
            ])
        })
        .teardown(Sql::Static("\\.\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Options;
    use crate::reader::RawRow;

    #[test]
    fn test_agency_row() {
        let formatter = agency();
        let row = RawRow::from_pairs([
            ("agency_name", "Acme"),
            ("agency_url", "http://x"),
            ("agency_timezone", "UTC"),
        ]);

        let values = (formatter.row.unwrap())(&row, &Options::default()).unwrap();
        assert_eq!(values.len(), COLUMNS.len());
        assert_eq!(values[0], Value::text(""));
        assert_eq!(values[1], Value::from("Acme"));
        assert_eq!(values[2], Value::from("http://x"));
        assert_eq!(values[3], Value::from("UTC"));
        assert!(values[4..].iter().all(|value| *value == Value::Null));
    }

    #[test]
    fn test_agency_requires_name() {
        let formatter = agency();
        let row = RawRow::from_pairs([("agency_url", "http://x"), ("agency_timezone", "UTC")]);
        let err = (formatter.row.unwrap())(&row, &Options::default()).unwrap_err();
        assert!(err.to_string().contains("agency_name"));
    }
}
