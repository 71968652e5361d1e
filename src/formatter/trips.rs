use super::fields::{integer, required_integer, required_text, required_time, text};
use super::{Formatter, Sql, copy_from_stdin};
use crate::Options;

const TRIPS_COLUMNS: &[&str] = &[
    "trip_id",
    "route_id",
    "service_id",
    "trip_headsign",
    "trip_short_name",
    "direction_id",
    "block_id",
    "shape_id",
    "wheelchair_accessible",
    "bikes_allowed",
];

pub(super) fn trips() -> Formatter {
    Formatter::new()
        .setup(Sql::dynamic(|opts| {
            let table = opts.qualify("trips");
            let shape_id = if opts.trips_without_shape_id() {
                String::from("shape_id TEXT")
            } else {
                format!(
                    "shape_id TEXT\n\t\tCONSTRAINT valid_shape_id CHECK ({schema}.shape_exists(shape_id))",
                    schema = opts.schema(),
                )
            };

            format!(
                r#"CREATE TABLE {table} (
	trip_id TEXT PRIMARY KEY,
	route_id TEXT NOT NULL REFERENCES {routes},
	service_id TEXT NOT NULL,
	trip_headsign TEXT,
	trip_short_name TEXT,
	direction_id INTEGER
		CONSTRAINT valid_direction_id CHECK (direction_id IN (0, 1)),
	block_id TEXT,
	{shape_id},
	wheelchair_accessible INTEGER
		CONSTRAINT valid_wheelchair_accessible CHECK (wheelchair_accessible BETWEEN 0 AND 2),
	bikes_allowed INTEGER
		CONSTRAINT valid_bikes_allowed CHECK (bikes_allowed BETWEEN 0 AND 2)
);

{copy}"#,
                routes = opts.qualify("routes"),
                copy = copy_from_stdin(&table, TRIPS_COLUMNS),
            )
        }))
        .row(|row, _| {
            Ok(vec![
                required_text(row, "trip_id")?,
                required_text(row, "route_id")?,
                required_text(row, "service_id")?,
                text(row, "trip_headsign"),
                text(row, "trip_short_name"),
                integer(row, "direction_id")?,
                text(row, "block_id"),
                text(row, "shape_id"),
                integer(row, "wheelchair_accessible")?,
                integer(row, "bikes_allowed")?,
            ])
        })
        .teardown(Sql::dynamic(|opts| {
            let table = opts.qualify("trips");
            format!(
                "\\.\n\nCREATE INDEX ON {table} (route_id);\nCREATE INDEX ON {table} (service_id)"
            )
        }))
}

const FREQUENCIES_COLUMNS: &[&str] = &[
    "trip_id",
    "start_time",
    "end_time",
    "headway_secs",
    "exact_times",
];

pub(super) fn frequencies_table(opts: &Options, if_not_exists: bool) -> String {
    let guard = if if_not_exists { "IF NOT EXISTS " } else { "" };
    format!(
        r#"CREATE TABLE {guard}{table} (
	trip_id TEXT NOT NULL REFERENCES {trips},
	start_time INTERVAL NOT NULL,
	end_time INTERVAL NOT NULL,
	headway_secs INTEGER NOT NULL
		CONSTRAINT valid_headway_secs CHECK (headway_secs > 0),
	exact_times INTEGER
		CONSTRAINT valid_exact_times CHECK (exact_times IN (0, 1)),
	PRIMARY KEY (trip_id, start_time)
);
"#,
        table = opts.qualify("frequencies"),
        trips = opts.qualify("trips"),
    )
}

pub(super) fn frequencies() -> Formatter {
    Formatter::new()
        .setup(Sql::dynamic(|opts| {
            format!(
                "{}\n{}",
                frequencies_table(opts, false),
                copy_from_stdin(&opts.qualify("frequencies"), FREQUENCIES_COLUMNS)
            )
        }))
        .row(|row, _| {
            Ok(vec![
                required_text(row, "trip_id")?,
                required_time(row, "start_time")?,
                required_time(row, "end_time")?,
                required_integer(row, "headway_secs")?,
                integer(row, "exact_times")?,
            ])
        })
        .teardown(Sql::Static("\\.\n"))
}
