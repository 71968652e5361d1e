use super::fields::{float, integer, required_integer, required_text, text, time};
use super::trips::frequencies_table;
use super::{Formatter, Sql, copy_from_stdin};
use crate::Options;

const COLUMNS: &[&str] = &[
    "trip_id",
    "arrival_time",
    "departure_time",
    "stop_id",
    "stop_sequence",
    "stop_headsign",
    "pickup_type",
    "drop_off_type",
    "shape_dist_traveled",
    "timepoint",
];

pub(super) fn stop_times() -> Formatter {
    Formatter::new()
        .setup(Sql::dynamic(|opts| {
            let table = opts.qualify("stop_times");
            format!(
                r#"CREATE TABLE {table} (
	trip_id TEXT NOT NULL REFERENCES {trips},
	arrival_time INTERVAL,
	departure_time INTERVAL,
	stop_id TEXT NOT NULL REFERENCES {stops},
	stop_sequence INTEGER NOT NULL
		CONSTRAINT valid_stop_sequence CHECK (stop_sequence >= 0),
	stop_headsign TEXT,
	pickup_type INTEGER
		CONSTRAINT valid_pickup_type CHECK (pickup_type BETWEEN 0 AND 3),
	drop_off_type INTEGER
		CONSTRAINT valid_drop_off_type CHECK (drop_off_type BETWEEN 0 AND 3),
	shape_dist_traveled DOUBLE PRECISION,
	timepoint INTEGER
		CONSTRAINT valid_timepoint CHECK (timepoint IN (0, 1)),
	PRIMARY KEY (trip_id, stop_sequence)
);

{copy}"#,
                trips = opts.qualify("trips"),
                stops = opts.qualify("stops"),
                copy = copy_from_stdin(&table, COLUMNS),
            )
        }))
        .row(|row, _| {
            let arrival_time = time(row, "arrival_time")?;
            let departure_time = time(row, "departure_time")?;

            Ok(vec![
                required_text(row, "trip_id")?,
                arrival_time,
                departure_time,
                required_text(row, "stop_id")?,
                required_integer(row, "stop_sequence")?,
                text(row, "stop_headsign"),
                integer(row, "pickup_type")?,
                integer(row, "drop_off_type")?,
                float(row, "shape_dist_traveled")?,
                integer(row, "timepoint")?,
            ])
        })
        .teardown(Sql::dynamic(|opts| {
            let table = opts.qualify("stop_times");
            format!(
                "\\.\n\nCREATE INDEX ON {table} (stop_id);\nCREATE INDEX ON {table} (trip_id, stop_sequence);\n\n{views}",
                views = views(opts),
            )
        }))
}

/// Every arrival and departure on every service day, with trips running on
/// `frequencies` expanded into their individual runs, and the connections
/// between consecutive stops of each run. `frequencies` is optional, so its
/// table is created empty if it hasn't been provided.
fn views(opts: &Options) -> String {
    format!(
        r#"{frequencies_ddl}
CREATE OR REPLACE VIEW {arrivals_departures} AS
WITH stop_times_based AS NOT MATERIALIZED (
	SELECT
		st.trip_id,
		t.route_id,
		t.service_id,
		sd."date",
		NULL::INTERVAL AS frequencies_start_time,
		NULL::INTEGER AS frequencies_it,
		st.stop_sequence,
		st.stop_id,
		st.arrival_time,
		st.departure_time
	FROM {stop_times} st
	JOIN {trips} t ON t.trip_id = st.trip_id
	JOIN {service_days} sd ON sd.service_id = t.service_id
	WHERE NOT EXISTS (
		SELECT 1
		FROM {frequencies} f
		WHERE f.trip_id = st.trip_id
	)
),
frequencies_based AS NOT MATERIALIZED (
	SELECT
		st.trip_id,
		t.route_id,
		t.service_id,
		sd."date",
		f.start_time AS frequencies_start_time,
		it AS frequencies_it,
		st.stop_sequence,
		st.stop_id,
		f.start_time + it * make_interval(secs => f.headway_secs)
			+ (st.arrival_time - first_stop.departure_time) AS arrival_time,
		f.start_time + it * make_interval(secs => f.headway_secs)
			+ (st.departure_time - first_stop.departure_time) AS departure_time
	FROM {stop_times} st
	JOIN {trips} t ON t.trip_id = st.trip_id
	JOIN {service_days} sd ON sd.service_id = t.service_id
	JOIN {frequencies} f ON f.trip_id = st.trip_id
	JOIN (
		SELECT trip_id, min(coalesce(departure_time, arrival_time)) AS departure_time
		FROM {stop_times}
		GROUP BY trip_id
	) first_stop ON first_stop.trip_id = st.trip_id
	CROSS JOIN LATERAL generate_series(
		0,
		ceil(extract(epoch FROM f.end_time - f.start_time) / f.headway_secs)::INTEGER - 1
	) AS it
)
SELECT
	trip_id,
	route_id,
	service_id,
	"date",
	frequencies_start_time,
	frequencies_it,
	stop_sequence,
	stop_id,
	"date" + arrival_time AS t_arrival,
	"date" + departure_time AS t_departure
FROM (
	SELECT * FROM stop_times_based
	UNION ALL
	SELECT * FROM frequencies_based
) all_stop_times;

CREATE OR REPLACE VIEW {connections} AS
SELECT *
FROM (
	SELECT
		trip_id,
		route_id,
		service_id,
		"date",
		frequencies_start_time,
		frequencies_it,
		stop_sequence AS from_stop_sequence,
		stop_id AS from_stop_id,
		t_departure,
		lead(stop_sequence) OVER run AS to_stop_sequence,
		lead(stop_id) OVER run AS to_stop_id,
		lead(t_arrival) OVER run AS t_arrival
	FROM {arrivals_departures}
	WINDOW run AS (
		PARTITION BY trip_id, "date", frequencies_start_time, frequencies_it
		ORDER BY stop_sequence
	)
) consecutive
WHERE to_stop_id IS NOT NULL"#,
        frequencies_ddl = frequencies_table(opts, true),
        arrivals_departures = opts.qualify("arrivals_departures"),
        connections = opts.qualify("connections"),
        stop_times = opts.qualify("stop_times"),
        trips = opts.qualify("trips"),
        service_days = opts.qualify("service_days"),
        frequencies = opts.qualify("frequencies"),
    )
}
