use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

/// Run configuration.
///
/// Resolved once per conversion with [`Options::resolve`] and then only ever
/// borrowed immutably, by the builder, every formatter and the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Don't report per-task progress on stderr.
    pub silent: bool,
    /// Fail if an input depends on a file that hasn't been provided.
    pub require_dependencies: bool,
    /// Skip inputs without a formatter instead of failing.
    pub ignore_unsupported_files: bool,
    /// Don't require trips to reference an existing shape. Unset means
    /// "true unless `shapes` is among the inputs".
    pub trips_without_shape_id: Option<bool>,
    /// Don't require routes to reference an agency.
    pub routes_without_agency_id: bool,
    /// Don't import `stops.level_id`. Unset means "true unless `levels` is
    /// among the inputs".
    pub stops_without_level_id: Option<bool>,
    /// Create a spatial index on the stop locations.
    pub stops_location_index: bool,
    /// Schema all tables, views and functions are created in.
    pub schema: String,
    /// Create a read-only `postgraphile` role at the end of the script.
    pub postgraphile: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            silent: false,
            require_dependencies: false,
            ignore_unsupported_files: false,
            trips_without_shape_id: None,
            routes_without_agency_id: false,
            stops_without_level_id: None,
            stops_location_index: false,
            schema: String::from("public"),
            postgraphile: false,
        }
    }
}

impl Options {
    /// Fills in the defaults that depend on the set of provided inputs and
    /// checks the schema name.
    pub fn resolve<'a>(
        mut self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ConvertError> {
        let names: Vec<&str> = names.into_iter().collect();
        let has = |file: &str| names.iter().any(|name| *name == file);

        if self.stops_without_level_id.is_none() {
            self.stops_without_level_id = Some(!has("levels"));
        }
        if self.trips_without_shape_id.is_none() {
            self.trips_without_shape_id = Some(!has("shapes"));
        }

        if self.schema.is_empty() || self.schema.contains(['"', '\0']) {
            return Err(ConvertError::InvalidSchema(self.schema));
        }

        Ok(self)
    }

    pub fn stops_without_level_id(&self) -> bool {
        self.stops_without_level_id.unwrap_or(true)
    }

    pub fn trips_without_shape_id(&self) -> bool {
        self.trips_without_shape_id.unwrap_or(true)
    }

    /// The quoted schema name, e.g. `"public"`.
    pub fn schema(&self) -> String {
        format!("\"{}\"", self.schema)
    }

    /// A schema-qualified identifier, e.g. `"public".stops`.
    pub fn qualify(&self, name: &str) -> String {
        format!("\"{}\".{}", self.schema, name)
    }

    /// Pretty-printed JSON, each line prefixed as an SQL comment.
    pub(crate) fn dump(&self) -> String {
        // serializing a struct of plain fields can't fail
        let json = serde_json::to_string_pretty(self).unwrap_or_default();

        json.lines()
            .map(|line| format!("-- {line}\n"))
            .collect()
    }
}
