//! Encoding of formatted rows for `COPY … FROM STDIN csv`.
//!
//! Every non-null field is double-quoted and embedded quotes are doubled, so
//! a line can be embedded into the script as is. `NULL` is written as an
//! empty unquoted field, which PostgreSQL's CSV format tells apart from the
//! quoted empty string `""`.
//!
//! psql ends the data of `COPY ... FROM STDIN` at any line consisting of
//! `\.`, quoted or not, and CSV has no way to escape it. Text containing
//! such a line is rejected.

use std::borrow::Cow;
use std::fmt::Write;

use anyhow::bail;

/// A single scalar of a formatted row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(Cow<'static, str>),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Value {
    pub fn text(text: impl Into<Cow<'static, str>>) -> Self {
        Value::Text(text.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<Option<Value>> for Value {
    fn from(value: Option<Value>) -> Self {
        value.unwrap_or(Value::Null)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(Cow::Owned(text.to_owned()))
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(Cow::Owned(text))
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Value::Integer(number)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Value::Float(number)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Bool(flag)
    }
}

/// Encodes one row as a newline-terminated CSV line.
pub fn encode_row(values: &[Value]) -> anyhow::Result<String> {
    let mut line = String::with_capacity(values.len() * 8);

    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }

        match value {
            Value::Null => {}
            Value::Text(text) => {
                if ends_copy_data(text) {
                    bail!(
                        "field {} contains a line with only \\., which would end the COPY data",
                        i + 1
                    );
                }
                quote(&mut line, text);
            }
            Value::Integer(number) => {
                // writing into a String never fails
                let _ = write!(line, "\"{number}\"");
            }
            Value::Float(number) => {
                let _ = write!(line, "\"{number}\"");
            }
            Value::Bool(flag) => {
                line.push_str(if *flag { "\"true\"" } else { "\"false\"" });
            }
        }
    }

    line.push('\n');
    Ok(line)
}

fn ends_copy_data(text: &str) -> bool {
    text.contains("\n\\.\n") || text.contains("\n\\.\r\n")
}

fn quote(line: &mut String, text: &str) {
    line.push('"');
    for (i, part) in text.split('"').enumerate() {
        if i > 0 {
            line.push_str("\"\"");
        }
        line.push_str(part);
    }
    line.push('"');
}
