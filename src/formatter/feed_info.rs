use super::fields::{date, required_text, text};
use super::{Formatter, Sql, copy_from_stdin};

const COLUMNS: &[&str] = &[
    "feed_publisher_name",
    "feed_publisher_url",
    "feed_lang",
    "default_lang",
    "feed_start_date",
    "feed_end_date",
    "feed_version",
    "feed_contact_email",
    "feed_contact_url",
];

pub(super) fn feed_info() -> Formatter {
    Formatter::new()
        .setup(Sql::dynamic(|opts| {
            let table = opts.qualify("feed_info");
            format!(
                r#"CREATE TABLE {table} (
	feed_publisher_name TEXT PRIMARY KEY,
	feed_publisher_url TEXT NOT NULL,
	feed_lang TEXT NOT NULL
		CONSTRAINT valid_feed_lang CHECK ({schema}.is_bcp_47_code(feed_lang) OR feed_lang = 'mul'),
	default_lang TEXT
		CONSTRAINT valid_default_lang CHECK ({schema}.is_bcp_47_code(default_lang)),
	feed_start_date DATE,
	feed_end_date DATE,
	feed_version TEXT,
	feed_contact_email TEXT,
	feed_contact_url TEXT
);

{copy}"#,
                schema = opts.schema(),
                copy = copy_from_stdin(&table, COLUMNS),
            )
        }))
        .row(|row, _| {
            Ok(vec![
                required_text(row, "feed_publisher_name")?,
                required_text(row, "feed_publisher_url")?,
                required_text(row, "feed_lang")?,
                text(row, "default_lang"),
                date(row, "feed_start_date")?,
                date(row, "feed_end_date")?,
                text(row, "feed_version"),
                text(row, "feed_contact_email"),
                text(row, "feed_contact_url"),
            ])
        })
        .teardown(Sql::Static("\\.\n"))
}
