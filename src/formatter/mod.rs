//! Per-name SQL for every task: setup and teardown text plus the row
//! function turning a [`RawRow`] into typed [`Value`]s.
//!
//! [`Formatters::builtin`] knows the core GTFS files and the helper objects
//! they rely on. Callers may add or replace entries before converting.

mod agency;
mod calendar;
mod feed_info;
mod fields;
mod helpers;
mod routes;
mod shapes;
mod stop_times;
mod stops;
mod transfers;
mod translations;
mod trips;

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::Options;
use crate::encode::Value;
use crate::reader::RawRow;

/// Row function of a formatter.
pub type RowFn = Arc<dyn Fn(&RawRow, &Options) -> anyhow::Result<Vec<Value>> + Send + Sync>;

/// Setup or teardown text, either fixed or derived from the options.
#[derive(Clone)]
pub enum Sql {
    Static(&'static str),
    Dynamic(Arc<dyn Fn(&Options) -> String + Send + Sync>),
}

impl Sql {
    pub fn dynamic<F>(func: F) -> Self
    where
        F: Fn(&Options) -> String + Send + Sync + 'static,
    {
        Sql::Dynamic(Arc::new(func))
    }

    pub fn resolve(&self, opts: &Options) -> Cow<'static, str> {
        match self {
            Sql::Static(text) => Cow::Borrowed(*text),
            Sql::Dynamic(func) => Cow::Owned(func(opts)),
        }
    }
}

impl std::fmt::Debug for Sql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sql::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Sql::Dynamic(_) => write!(f, "Dynamic(*)"),
        }
    }
}

/// Everything a task contributes to the script besides its header.
#[derive(Clone, Default)]
pub struct Formatter {
    pub setup: Option<Sql>,
    pub teardown: Option<Sql>,
    pub row: Option<RowFn>,
}

impl Formatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn setup(mut self, sql: Sql) -> Self {
        self.setup = Some(sql);
        self
    }

    pub fn teardown(mut self, sql: Sql) -> Self {
        self.teardown = Some(sql);
        self
    }

    pub fn row<F>(mut self, func: F) -> Self
    where
        F: Fn(&RawRow, &Options) -> anyhow::Result<Vec<Value>> + Send + Sync + 'static,
    {
        self.row = Some(Arc::new(func));
        self
    }
}

impl std::fmt::Debug for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Formatter")
            .field("setup", &self.setup)
            .field("teardown", &self.teardown)
            .field("row", &self.row.as_ref().map(|_| "*"))
            .finish()
    }
}

/// The `COPY` statement rows of a file formatter are streamed into.
fn copy_from_stdin(table: &str, columns: &[&str]) -> String {
    format!(
        "COPY {table} (\n\t{}\n) FROM STDIN csv;\n",
        columns.join(",\n\t")
    )
}

/// Formatters by task name.
#[derive(Debug, Clone, Default)]
pub struct Formatters {
    map: HashMap<String, Arc<Formatter>>,
}

impl Formatters {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The formatters for the supported GTFS files and their helpers.
    pub fn builtin() -> Self {
        Self::new()
            .register("is_bcp_47_code", helpers::is_bcp_47_code())
            .register("is_timezone", helpers::is_timezone())
            .register("shape_exists", helpers::shape_exists())
            .register("agency", agency::agency())
            .register("levels", stops::levels())
            .register("stops", stops::stops())
            .register("routes", routes::routes())
            .register("calendar", calendar::calendar())
            .register("calendar_dates", calendar::calendar_dates())
            .register("service_days", calendar::service_days())
            .register("trips", trips::trips())
            .register("frequencies", trips::frequencies())
            .register("stop_times", stop_times::stop_times())
            .register("shapes", shapes::shapes())
            .register("transfers", transfers::transfers())
            .register("pathways", transfers::pathways())
            .register("feed_info", feed_info::feed_info())
            .register("translations", translations::translations())
    }

    /// Adds a formatter, replacing any previous one of the same name.
    pub fn register(mut self, name: impl Into<String>, formatter: Formatter) -> Self {
        self.map.insert(name.into(), Arc::new(formatter));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Formatter>> {
        self.map.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }
}
