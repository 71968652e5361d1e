use anyhow::bail;

use super::fields::{float, point, required_integer, required_text};
use super::{Formatter, Sql, copy_from_stdin};
use crate::Options;
use crate::encode::Value;

const COLUMNS: &[&str] = &[
    "shape_id",
    "shape_pt_loc",
    "shape_pt_sequence",
    "shape_dist_traveled",
];

pub(super) fn shapes_table(opts: &Options, if_not_exists: bool) -> String {
    let guard = if if_not_exists { "IF NOT EXISTS " } else { "" };
    format!(
        r#"CREATE TABLE {guard}{table} (
	id SERIAL PRIMARY KEY,
	shape_id TEXT NOT NULL,
	shape_pt_loc geography(POINT) NOT NULL,
	shape_pt_sequence INTEGER NOT NULL,
	shape_dist_traveled DOUBLE PRECISION
);
"#,
        table = opts.qualify("shapes"),
    )
}

pub(super) fn shapes() -> Formatter {
    Formatter::new()
        .setup(Sql::dynamic(|opts| {
            format!(
                "{}\n{}",
                shapes_table(opts, false),
                copy_from_stdin(&opts.qualify("shapes"), COLUMNS)
            )
        }))
        .row(|row, _| {
            let location = point(row, "shape_pt_lat", "shape_pt_lon")?;
            if location == Value::Null {
                bail!("missing required columns shape_pt_lat/shape_pt_lon");
            }

            Ok(vec![
                required_text(row, "shape_id")?,
                location,
                required_integer(row, "shape_pt_sequence")?,
                float(row, "shape_dist_traveled")?,
            ])
        })
        .teardown(Sql::dynamic(|opts| {
            format!(
                "\\.\n\nCREATE INDEX ON {} (shape_id, shape_pt_sequence)",
                opts.qualify("shapes")
            )
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::RawRow;

    #[test]
    fn test_shape_point() {
        let row = RawRow::from_pairs([
            ("shape_id", "s1"),
            ("shape_pt_lat", "52.5"),
            ("shape_pt_lon", "13.4"),
            ("shape_pt_sequence", "0"),
        ]);
        let values = (shapes().row.unwrap())(&row, &Options::default()).unwrap();
        assert_eq!(values[1], Value::from("POINT(13.4 52.5)"));
        assert_eq!(values[3], Value::Null);
    }

    #[test]
    fn test_shape_point_is_required() {
        let row = RawRow::from_pairs([("shape_id", "s1"), ("shape_pt_sequence", "0")]);
        assert!((shapes().row.unwrap())(&row, &Options::default()).is_err());
    }
}
