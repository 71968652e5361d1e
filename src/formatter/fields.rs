//! Column accessors shared by the file formatters.

use anyhow::{Context, anyhow, bail};

use crate::encode::Value;
use crate::reader::RawRow;

pub(super) fn required<'a>(row: &'a RawRow, column: &str) -> anyhow::Result<&'a str> {
    row.get(column)
        .ok_or_else(|| anyhow!("missing required column {column}"))
}

pub(super) fn text(row: &RawRow, column: &str) -> Value {
    row.get(column).map(Value::from).into()
}

pub(super) fn required_text(row: &RawRow, column: &str) -> anyhow::Result<Value> {
    required(row, column).map(Value::from)
}

pub(super) fn integer(row: &RawRow, column: &str) -> anyhow::Result<Value> {
    row.get(column)
        .map(|raw| parse_integer(raw, column))
        .transpose()
        .map(Value::from)
}

pub(super) fn required_integer(row: &RawRow, column: &str) -> anyhow::Result<Value> {
    parse_integer(required(row, column)?, column)
}

pub(super) fn float(row: &RawRow, column: &str) -> anyhow::Result<Value> {
    row.get(column)
        .map(|raw| parse_float(raw, column))
        .transpose()
        .map(Value::from)
}

pub(super) fn required_float(row: &RawRow, column: &str) -> anyhow::Result<Value> {
    parse_float(required(row, column)?, column)
}

/// A `0`/`1` column as boolean.
pub(super) fn flag(row: &RawRow, column: &str) -> anyhow::Result<Value> {
    match required(row, column)? {
        "0" => Ok(Value::Bool(false)),
        "1" => Ok(Value::Bool(true)),
        other => bail!("invalid {column}: {other:?}, expected 0 or 1"),
    }
}

/// A `YYYYMMDD` date, passed through for PostgreSQL to parse.
pub(super) fn date(row: &RawRow, column: &str) -> anyhow::Result<Value> {
    row.get(column)
        .map(|raw| parse_date(raw, column))
        .transpose()
        .map(Value::from)
}

pub(super) fn required_date(row: &RawRow, column: &str) -> anyhow::Result<Value> {
    parse_date(required(row, column)?, column)
}

/// A `H:MM:SS` time of the service day, which may exceed 24 hours.
pub(super) fn time(row: &RawRow, column: &str) -> anyhow::Result<Value> {
    row.get(column)
        .map(|raw| parse_time(raw, column))
        .transpose()
        .map(Value::from)
}

pub(super) fn required_time(row: &RawRow, column: &str) -> anyhow::Result<Value> {
    parse_time(required(row, column)?, column)
}

/// A WKT point built from two coordinate columns, `NULL` if both are empty.
pub(super) fn point(row: &RawRow, lat: &str, lon: &str) -> anyhow::Result<Value> {
    match (row.get(lat), row.get(lon)) {
        (None, None) => Ok(Value::Null),
        (Some(raw_lat), Some(raw_lon)) => {
            let lat_value: f64 = raw_lat
                .parse()
                .with_context(|| format!("invalid {lat}: {raw_lat:?}"))?;
            let lon_value: f64 = raw_lon
                .parse()
                .with_context(|| format!("invalid {lon}: {raw_lon:?}"))?;

            if !(-90.0..=90.0).contains(&lat_value) || !(-180.0..=180.0).contains(&lon_value) {
                bail!("{lat}/{lon} out of range: {raw_lat}, {raw_lon}");
            }

            Ok(Value::text(format!("POINT({lon_value} {lat_value})")))
        }
        (None, Some(_)) => bail!("{lon} given without {lat}"),
        (Some(_), None) => bail!("{lat} given without {lon}"),
    }
}

fn parse_integer(raw: &str, column: &str) -> anyhow::Result<Value> {
    raw.parse::<i64>()
        .map(Value::Integer)
        .with_context(|| format!("invalid {column}: {raw:?}"))
}

fn parse_float(raw: &str, column: &str) -> anyhow::Result<Value> {
    raw.parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .map(Value::Float)
        .ok_or_else(|| anyhow!("invalid {column}: {raw:?}"))
}

fn parse_date(raw: &str, column: &str) -> anyhow::Result<Value> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        bail!("invalid {column}: {raw:?}, expected YYYYMMDD");
    }

    Ok(Value::text(format!(
        "{}-{}-{}",
        &raw[0..4],
        &raw[4..6],
        &raw[6..8]
    )))
}

fn parse_time(raw: &str, column: &str) -> anyhow::Result<Value> {
    let mut parts = raw.split(':');
    let valid = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(m), Some(s), None) => {
            (1..=3).contains(&h.len())
                && m.len() == 2
                && s.len() == 2
                && [h, m, s]
                    .iter()
                    .all(|part| part.bytes().all(|b| b.is_ascii_digit()))
                && m < "60"
                && s < "60"
        }
        _ => false,
    };

    if !valid {
        bail!("invalid {column}: {raw:?}, expected H:MM:SS");
    }

    Ok(Value::from(raw))
}
