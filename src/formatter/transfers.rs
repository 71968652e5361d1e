use super::fields::{flag, float, integer, required_integer, required_text, text};
use super::{Formatter, Sql, copy_from_stdin};
use crate::encode::Value;

const TRANSFERS_COLUMNS: &[&str] = &[
    "from_stop_id",
    "to_stop_id",
    "transfer_type",
    "min_transfer_time",
];

pub(super) fn transfers() -> Formatter {
    Formatter::new()
        .setup(Sql::dynamic(|opts| {
            let table = opts.qualify("transfers");
            format!(
                r#"CREATE TABLE {table} (
	id SERIAL PRIMARY KEY,
	from_stop_id TEXT NOT NULL REFERENCES {stops},
	to_stop_id TEXT NOT NULL REFERENCES {stops},
	transfer_type INTEGER NOT NULL
		CONSTRAINT valid_transfer_type CHECK (transfer_type BETWEEN 0 AND 5),
	min_transfer_time INTEGER
		CONSTRAINT valid_min_transfer_time CHECK (min_transfer_time >= 0)
);

{copy}"#,
                stops = opts.qualify("stops"),
                copy = copy_from_stdin(&table, TRANSFERS_COLUMNS),
            )
        }))
        .row(|row, _| {
            // an empty transfer_type means 0, "recommended transfer point"
            let transfer_type = match integer(row, "transfer_type")? {
                Value::Null => Value::Integer(0),
                value => value,
            };

            Ok(vec![
                required_text(row, "from_stop_id")?,
                required_text(row, "to_stop_id")?,
                transfer_type,
                integer(row, "min_transfer_time")?,
            ])
        })
        .teardown(Sql::Static("\\.\n"))
}

const PATHWAYS_COLUMNS: &[&str] = &[
    "pathway_id",
    "from_stop_id",
    "to_stop_id",
    "pathway_mode",
    "is_bidirectional",
    "length",
    "traversal_time",
    "stair_count",
    "max_slope",
    "min_width",
    "signposted_as",
    "reversed_signposted_as",
];

pub(super) fn pathways() -> Formatter {
    Formatter::new()
        .setup(Sql::dynamic(|opts| {
            let table = opts.qualify("pathways");
            format!(
                r#"CREATE TABLE {table} (
	pathway_id TEXT PRIMARY KEY,
	from_stop_id TEXT NOT NULL REFERENCES {stops},
	to_stop_id TEXT NOT NULL REFERENCES {stops},
	pathway_mode INTEGER NOT NULL
		CONSTRAINT valid_pathway_mode CHECK (pathway_mode BETWEEN 1 AND 7),
	is_bidirectional BOOLEAN NOT NULL,
	length DOUBLE PRECISION
		CONSTRAINT valid_length CHECK (length >= 0),
	traversal_time INTEGER
		CONSTRAINT valid_traversal_time CHECK (traversal_time > 0),
	stair_count INTEGER,
	max_slope DOUBLE PRECISION,
	min_width DOUBLE PRECISION
		CONSTRAINT valid_min_width CHECK (min_width > 0),
	signposted_as TEXT,
	reversed_signposted_as TEXT
);

{copy}"#,
                stops = opts.qualify("stops"),
                copy = copy_from_stdin(&table, PATHWAYS_COLUMNS),
            )
        }))
        .row(|row, _| {
            Ok(vec![
                required_text(row, "pathway_id")?,
                required_text(row, "from_stop_id")?,
                required_text(row, "to_stop_id")?,
                required_integer(row, "pathway_mode")?,
                flag(row, "is_bidirectional")?,
                float(row, "length")?,
                integer(row, "traversal_time")?,
                integer(row, "stair_count")?,
                float(row, "max_slope")?,
                float(row, "min_width")?,
                text(row, "signposted_as"),
                text(row, "reversed_signposted_as"),
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
    fn test_transfer_type_defaults_to_zero() {
        let row = RawRow::from_pairs([("from_stop_id", "a"), ("to_stop_id", "b")]);
        let values = (transfers().row.unwrap())(&row, &Options::default()).unwrap();
        assert_eq!(values[2], Value::Integer(0));
        assert_eq!(values[3], Value::Null);
    }

    #[test]
    fn test_pathway_row() {
        let row = RawRow::from_pairs([
            ("pathway_id", "p1"),
            ("from_stop_id", "a"),
            ("to_stop_id", "b"),
            ("pathway_mode", "2"),
            ("is_bidirectional", "1"),
            ("stair_count", "-12"),
        ]);
        let values = (pathways().row.unwrap())(&row, &Options::default()).unwrap();
        assert_eq!(values.len(), PATHWAYS_COLUMNS.len());
        assert_eq!(values[4], Value::Bool(true));
        assert_eq!(values[7], Value::Integer(-12));
    }
}
