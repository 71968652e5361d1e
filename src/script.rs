//! The streaming statement generator.
//!
//! A [`Script`] walks the scheduled tasks and yields the SQL text piece by
//! piece: the envelope, then for every task its header, setup, one line per
//! row and teardown. Rows are only pulled from an input when the consumer
//! asks for the next chunk, so memory stays flat no matter how large the
//! files are.

use std::borrow::Cow;
use std::iter::FusedIterator;
use std::sync::Arc;

use tracing::info;

use crate::encode::encode_row;
use crate::error::ConvertError;
use crate::formatter::Formatter;
use crate::io::Progress;
use crate::options::Options;
use crate::reader::Input;
use crate::task::{Body, Task};

/// Rows between two progress updates.
const PROGRESS_EVERY: u64 = 10_000;

/// A lazily generated SQL script.
///
/// Concatenating all chunks gives one script running in a single
/// transaction. After an error the iterator is exhausted.
pub struct Script {
    opts: Options,
    tasks: std::vec::IntoIter<Task>,
    state: State,
    progress: Progress,
}

enum State {
    Preamble,
    Section(Section),
    Closing,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Header,
    Setup,
    Rows,
    Teardown,
}

/// The task currently being written.
struct Section {
    name: String,
    formatter: Option<Arc<Formatter>>,
    source: Option<Input>,
    stage: Stage,
    rows: u64,
}

impl Section {
    fn new(task: Task) -> Self {
        let (formatter, source) = match task.body {
            Body::Mock => (None, None),
            Body::Concrete { formatter, source } => (Some(formatter), source),
        };

        Self {
            name: task.name,
            formatter,
            source,
            stage: Stage::Header,
            rows: 0,
        }
    }

    /// Pulls and encodes the next row, `None` once the source is drained.
    fn next_row(&mut self, opts: &Options) -> Option<Result<String, ConvertError>> {
        let source = self.source.as_mut()?;
        let row_fn = self.formatter.as_ref()?.row.as_ref()?;

        let raw = match source.rows.next()? {
            Ok(raw) => raw,
            Err(err) => {
                return Some(Err(ConvertError::Read {
                    task: self.name.clone(),
                    source: err,
                }));
            }
        };
        self.rows += 1;

        match row_fn(&raw, opts).and_then(|values| encode_row(&values)) {
            Ok(line) => Some(Ok(line)),
            Err(err) => Some(Err(ConvertError::RowFormat {
                task: self.name.clone(),
                row: self.rows,
                source: err,
            })),
        }
    }
}

impl Script {
    /// Generates the script for tasks which are already in execution order.
    pub fn new(tasks: Vec<Task>, opts: Options) -> Self {
        let progress = Progress::new(tasks.len(), opts.silent);

        Self {
            opts,
            tasks: tasks.into_iter(),
            state: State::Preamble,
            progress,
        }
    }

    fn advance(tasks: &mut std::vec::IntoIter<Task>) -> State {
        match tasks.next() {
            Some(task) => State::Section(Section::new(task)),
            None => State::Closing,
        }
    }

    /// Collects the whole script into one string.
    pub fn into_string(self) -> Result<String, ConvertError> {
        self.collect()
    }
}

impl Iterator for Script {
    type Item = Result<Cow<'static, str>, ConvertError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let section = match &mut self.state {
                State::Preamble => {
                    self.state = Self::advance(&mut self.tasks);
                    return Some(Ok(Cow::Owned(preamble(&self.opts))));
                }
                State::Closing => {
                    self.state = State::Done;
                    self.progress.finish();
                    return Some(Ok(Cow::Owned(closing(&self.opts))));
                }
                State::Done => return None,
                State::Section(section) => section,
            };

            match section.stage {
                Stage::Header => {
                    section.stage = Stage::Setup;
                    self.progress.task(&section.name);
                    let header = format!("-- {}\n-----------------\n\n", section.name);
                    return Some(Ok(Cow::Owned(header)));
                }
                Stage::Setup => {
                    section.stage = Stage::Rows;
                    let setup = section.formatter.as_ref().and_then(|f| f.setup.as_ref());
                    if let Some(sql) = setup {
                        return Some(Ok(sql.resolve(&self.opts)));
                    }
                }
                Stage::Rows => match section.next_row(&self.opts) {
                    Some(Ok(line)) => {
                        if section.rows % PROGRESS_EVERY == 0 {
                            self.progress.rows(&section.name, section.rows);
                        }
                        return Some(Ok(Cow::Owned(line)));
                    }
                    Some(Err(err)) => {
                        self.progress.abandon(&section.name);
                        self.state = State::Done;
                        return Some(Err(err));
                    }
                    None => section.stage = Stage::Teardown,
                },
                Stage::Teardown => {
                    if section.source.is_some() {
                        info!(task = %section.name, rows = section.rows, "converted");
                    }

                    let teardown = section
                        .formatter
                        .as_ref()
                        .and_then(|f| f.teardown.as_ref())
                        .map(|sql| sql.resolve(&self.opts) + ";\n");

                    self.progress.done();
                    self.state = Self::advance(&mut self.tasks);

                    if let Some(text) = teardown {
                        return Some(Ok(text));
                    }
                }
            }
        }
    }
}

impl FusedIterator for Script {}

fn preamble(opts: &Options) -> String {
    let mut text = format!(
        "-- GTFS SQL dump generated by {} v{}\n-- {}\n-- options:\n{}\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_HOMEPAGE"),
        opts.dump(),
    );

    text.push_str("\\set ON_ERROR_STOP True\n");
    text.push_str("CREATE EXTENSION IF NOT EXISTS postgis;\n");
    if opts.schema != "public" {
        text.push_str(&format!("CREATE SCHEMA IF NOT EXISTS {};\n", opts.schema()));
    }
    text.push_str("BEGIN;\n\n\n");

    text
}

fn closing(opts: &Options) -> String {
    let mut text = String::from("\n");

    if opts.postgraphile {
        text.push_str(&format!(
            r#"-- seal imported data
DO $$
BEGIN
	IF EXISTS (
		SELECT FROM pg_catalog.pg_roles
		WHERE rolname = 'postgraphile'
	) THEN
		RAISE NOTICE 'Role "postgraphile" already exists, skipping creation.';
	ELSE
		CREATE ROLE postgraphile LOGIN;
	END IF;
END
$$;
DO $$
	DECLARE
		db TEXT := current_database();
	BEGIN
		EXECUTE format('GRANT ALL PRIVILEGES ON DATABASE %I TO %I', db, 'postgraphile');
	END
$$;
GRANT USAGE ON SCHEMA {schema} TO postgraphile;
REVOKE CREATE ON SCHEMA {schema} FROM PUBLIC;
GRANT SELECT ON ALL TABLES IN SCHEMA {schema} TO postgraphile;

"#,
            schema = opts.schema(),
        ));
    }

    text.push_str("COMMIT;\n");
    text
}
