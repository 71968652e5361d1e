use super::fields::{flag, required_date, required_integer, required_text};
use super::{Formatter, Sql, copy_from_stdin};
use crate::Options;
use crate::encode::Value;

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const CALENDAR_COLUMNS: &[&str] = &[
    "service_id",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
    "start_date",
    "end_date",
];

const CALENDAR_DATES_COLUMNS: &[&str] = &["service_id", "date", "exception_type"];

fn calendar_table(opts: &Options, if_not_exists: bool) -> String {
    let guard = if if_not_exists { "IF NOT EXISTS " } else { "" };
    format!(
        r#"CREATE TABLE {guard}{table} (
	service_id TEXT PRIMARY KEY,
	monday BOOLEAN NOT NULL,
	tuesday BOOLEAN NOT NULL,
	wednesday BOOLEAN NOT NULL,
	thursday BOOLEAN NOT NULL,
	friday BOOLEAN NOT NULL,
	saturday BOOLEAN NOT NULL,
	sunday BOOLEAN NOT NULL,
	start_date DATE NOT NULL,
	end_date DATE NOT NULL
);
"#,
        table = opts.qualify("calendar"),
    )
}

fn calendar_dates_table(opts: &Options, if_not_exists: bool) -> String {
    let guard = if if_not_exists { "IF NOT EXISTS " } else { "" };
    format!(
        r#"CREATE TABLE {guard}{table} (
	service_id TEXT NOT NULL,
	date DATE NOT NULL,
	exception_type INTEGER NOT NULL
		CONSTRAINT valid_exception_type CHECK (exception_type IN (1, 2)),
	PRIMARY KEY (service_id, date)
);
"#,
        table = opts.qualify("calendar_dates"),
    )
}

pub(super) fn calendar() -> Formatter {
    Formatter::new()
        .setup(Sql::dynamic(|opts| {
            format!(
                "{}\n{}",
                calendar_table(opts, false),
                copy_from_stdin(&opts.qualify("calendar"), CALENDAR_COLUMNS)
            )
        }))
        .row(|row, _| {
            let mut values = Vec::with_capacity(CALENDAR_COLUMNS.len());
            values.push(required_text(row, "service_id")?);
            for day in WEEKDAYS {
                values.push(flag(row, day)?);
            }
            values.push(required_date(row, "start_date")?);
            values.push(required_date(row, "end_date")?);
            Ok(values)
        })
        .teardown(Sql::Static("\\.\n"))
}

pub(super) fn calendar_dates() -> Formatter {
    Formatter::new()
        .setup(Sql::dynamic(|opts| {
            format!(
                "{}\n{}",
                calendar_dates_table(opts, false),
                copy_from_stdin(&opts.qualify("calendar_dates"), CALENDAR_DATES_COLUMNS)
            )
        }))
        .row(|row, _| {
            let exception_type = required_integer(row, "exception_type")?;
            if !matches!(exception_type, Value::Integer(1 | 2)) {
                anyhow::bail!("invalid exception_type: {exception_type:?}, expected 1 or 2");
            }

            Ok(vec![
                required_text(row, "service_id")?,
                required_date(row, "date")?,
                exception_type,
            ])
        })
        .teardown(Sql::dynamic(|opts| {
            format!(
                "\\.\n\nCREATE INDEX ON {} (exception_type)",
                opts.qualify("calendar_dates")
            )
        }))
}

/// Every date each service is running on, from both `calendar` and
/// `calendar_dates`. Either file may be absent, so the view makes sure both
/// tables exist before it reads them.
pub(super) fn service_days() -> Formatter {
    Formatter::new()
        .setup(Sql::dynamic(|opts| {
            let calendar = opts.qualify("calendar");
            let calendar_dates = opts.qualify("calendar_dates");
            let service_days = opts.qualify("service_days");

            format!(
                r#"{calendar_ddl}
{calendar_dates_ddl}
CREATE MATERIALIZED VIEW {service_days} AS
SELECT base_days.service_id, base_days.date
FROM (
	SELECT service_id, "date"
	FROM (
		SELECT
			service_id,
			"date",
			extract(isodow FROM "date") AS dow,
			monday, tuesday, wednesday, thursday, friday, saturday, sunday
		FROM (
			SELECT
				*,
				generate_series(start_date::TIMESTAMP, end_date::TIMESTAMP, '1 day')::DATE AS "date"
			FROM {calendar}
		) all_days_raw
	) all_days
	WHERE (monday AND dow = 1)
	OR (tuesday AND dow = 2)
	OR (wednesday AND dow = 3)
	OR (thursday AND dow = 4)
	OR (friday AND dow = 5)
	OR (saturday AND dow = 6)
	OR (sunday AND dow = 7)
	UNION
	SELECT service_id, "date"
	FROM {calendar_dates}
	WHERE exception_type = 1
) base_days
WHERE (base_days.service_id, base_days.date) NOT IN (
	SELECT service_id, "date"
	FROM {calendar_dates}
	WHERE exception_type = 2
)
ORDER BY service_id, "date";

CREATE UNIQUE INDEX ON {service_days} (service_id, "date");
CREATE INDEX ON {service_days} ("date");

"#,
                calendar_ddl = calendar_table(opts, true),
                calendar_dates_ddl = calendar_dates_table(opts, true),
            )
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::RawRow;

    #[test]
    fn test_calendar_row() {
        let row = RawRow::from_pairs([
            ("service_id", "weekdays"),
            ("monday", "1"),
            ("tuesday", "1"),
            ("wednesday", "1"),
            ("thursday", "1"),
            ("friday", "1"),
            ("saturday", "0"),
            ("sunday", "0"),
            ("start_date", "20240101"),
            ("end_date", "20241231"),
        ]);

        let values = (calendar().row.unwrap())(&row, &Options::default()).unwrap();
        assert_eq!(values.len(), CALENDAR_COLUMNS.len());
        assert_eq!(values[1], Value::Bool(true));
        assert_eq!(values[7], Value::Bool(false));
        assert_eq!(values[8], Value::from("2024-01-01"));
    }

    #[test]
    fn test_calendar_dates_exception_type() {
        let formatter = calendar_dates();
        let row_fn = formatter.row.unwrap();
        let opts = Options::default();

        let row = RawRow::from_pairs([
            ("service_id", "s"),
            ("date", "20240101"),
            ("exception_type", "2"),
        ]);
        assert_eq!(row_fn(&row, &opts).unwrap()[2], Value::Integer(2));

        let row = RawRow::from_pairs([
            ("service_id", "s"),
            ("date", "20240101"),
            ("exception_type", "3"),
        ]);
        assert!(row_fn(&row, &opts).is_err());
    }

    #[test]
    fn test_service_days_creates_missing_tables() {
        let sql = service_days().setup.unwrap().resolve(&Options::default());
        assert!(sql.contains(r#"CREATE TABLE IF NOT EXISTS "public".calendar ("#));
        assert!(sql.contains(r#"CREATE TABLE IF NOT EXISTS "public".calendar_dates ("#));
        assert!(sql.contains(r#"CREATE MATERIALIZED VIEW "public".service_days AS"#));
    }
}
