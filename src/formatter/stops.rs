use super::fields::{integer, point, required_float, required_text, text};
use super::{Formatter, Sql, copy_from_stdin};
use crate::Options;

fn stops_columns(opts: &Options) -> Vec<&'static str> {
    let mut columns = vec![
        "stop_id",
        "stop_code",
        "stop_name",
        "stop_desc",
        "stop_loc",
        "zone_id",
        "stop_url",
        "location_type",
        "parent_station",
        "stop_timezone",
        "wheelchair_boarding",
    ];
    if !opts.stops_without_level_id() {
        columns.push("level_id");
    }
    columns.push("platform_code");
    columns
}

pub(super) fn stops() -> Formatter {
    Formatter::new()
        .setup(Sql::dynamic(|opts| {
            let table = opts.qualify("stops");
            let level_id = if opts.stops_without_level_id() {
                String::new()
            } else {
                format!(
                    "\tlevel_id TEXT REFERENCES {levels} (level_id),\n",
                    levels = opts.qualify("levels"),
                )
            };

            format!(
                r#"CREATE TABLE {table} (
	stop_id TEXT PRIMARY KEY,
	stop_code TEXT,
	stop_name TEXT,
	stop_desc TEXT,
	stop_loc geography(POINT),
	zone_id TEXT,
	stop_url TEXT,
	location_type INTEGER
		CONSTRAINT valid_location_type CHECK (location_type BETWEEN 0 AND 4),
	parent_station TEXT,
	stop_timezone TEXT
		CONSTRAINT valid_timezone CHECK ({schema}.is_timezone(stop_timezone)),
	wheelchair_boarding INTEGER
		CONSTRAINT valid_wheelchair_boarding CHECK (wheelchair_boarding BETWEEN 0 AND 2),
{level_id}	platform_code TEXT
);

{copy}"#,
                schema = opts.schema(),
                copy = copy_from_stdin(&table, &stops_columns(opts)),
            )
        }))
        .row(|row, opts| {
            let mut values = vec![
                required_text(row, "stop_id")?,
                text(row, "stop_code"),
                text(row, "stop_name"),
                text(row, "stop_desc"),
                point(row, "stop_lat", "stop_lon")?,
                text(row, "zone_id"),
                text(row, "stop_url"),
                integer(row, "location_type")?,
                text(row, "parent_station"),
                text(row, "stop_timezone"),
                integer(row, "wheelchair_boarding")?,
            ];
            if !opts.stops_without_level_id() {
                values.push(text(row, "level_id"));
            }
            values.push(text(row, "platform_code"));
            Ok(values)
        })
        .teardown(Sql::dynamic(|opts| {
            let table = opts.qualify("stops");
            // parent stations may come after their children in the file
            let mut sql = format!(
                r#"\.

ALTER TABLE {table}
ADD CONSTRAINT stops_parent_station_fkey
FOREIGN KEY (parent_station) REFERENCES {table};

CREATE INDEX ON {table} (parent_station)"#
            );
            if !opts.stops_without_level_id() {
                sql.push_str(&format!(";\nCREATE INDEX ON {table} (level_id)"));
            }
            if opts.stops_location_index {
                sql.push_str(&format!(";\nCREATE INDEX ON {table} USING GIST (stop_loc)"));
            }
            sql
        }))
}

const LEVELS_COLUMNS: &[&str] = &["level_id", "level_index", "level_name"];

pub(super) fn levels() -> Formatter {
    Formatter::new()
        .setup(Sql::dynamic(|opts| {
            let table = opts.qualify("levels");
            format!(
                r#"CREATE TABLE {table} (
	level_id TEXT PRIMARY KEY,
	level_index DOUBLE PRECISION NOT NULL,
	level_name TEXT
);

{copy}"#,
                copy = copy_from_stdin(&table, LEVELS_COLUMNS),
            )
        }))
        .row(|row, _| {
            Ok(vec![
                required_text(row, "level_id")?,
                required_float(row, "level_index")?,
                text(row, "level_name"),
            ])
        })
        .teardown(Sql::Static("\\.\n"))
}
