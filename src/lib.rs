#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub mod catalog;
pub mod encode;
mod error;
pub mod formatter;
pub mod graph;
mod io;
mod options;
pub mod reader;
pub mod schedule;
mod script;
pub mod task;

use tracing::debug;

pub use crate::error::*;
pub use crate::formatter::{Formatter, Formatters, Sql};
pub use crate::graph::Registry;
pub use crate::options::Options;
pub use crate::reader::{Input, RawRow};
pub use crate::script::Script;

/// Converts the inputs with the built-in formatters.
///
/// Everything that can fail before the first row is read fails here, so an
/// `Err` means no SQL has been produced at all. Errors in the rows themselves
/// come out of the returned [`Script`].
pub fn convert(inputs: Vec<Input>, opts: Options) -> Result<Script, ConvertError> {
    convert_with(inputs, opts, &Formatters::builtin())
}

/// Like [`convert`], with a custom set of formatters.
pub fn convert_with(
    inputs: Vec<Input>,
    opts: Options,
    formatters: &Formatters,
) -> Result<Script, ConvertError> {
    let opts = opts.resolve(inputs.iter().map(|input| input.name.as_str()))?;
    debug!(?opts, "resolved options");

    let registry = Registry::build(&opts, inputs, formatters)?;
    let tasks = schedule::schedule(registry)?;

    Ok(Script::new(tasks, opts))
}

/// The task graph [`convert`] would run, e.g. for rendering it with
/// [`Registry`]'s `Display` implementation.
pub fn plan(inputs: Vec<Input>, opts: Options) -> Result<Registry, ConvertError> {
    let opts = opts.resolve(inputs.iter().map(|input| input.name.as_str()))?;
    Registry::build(&opts, inputs, &Formatters::builtin())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silent() -> Options {
        Options {
            silent: true,
            ..Options::default()
        }
    }

    fn section(script: &str, name: &str) -> Option<usize> {
        script.find(&format!("-- {name}\n-----------------\n"))
    }

    #[test]
    fn test_single_agency() {
        let agency = Input::from_rows(
            "agency",
            vec![RawRow::from_pairs([
                ("agency_name", "Acme"),
                ("agency_url", "http://x"),
                ("agency_timezone", "UTC"),
            ])],
        );
        let script = convert(vec![agency], silent()).unwrap().into_string().unwrap();

        let begin = script.find("BEGIN;").unwrap();
        let commit = script.find("COMMIT;").unwrap();
        let agency = section(&script, "agency").unwrap();
        assert!(begin < agency && agency < commit);

        // the first section with data
        let row = script.find("\"\",\"Acme\",\"http://x\",\"UTC\",,,,\n").unwrap();
        assert!(agency < row && row < commit);
        assert_eq!(script.matches("\"Acme\"").count(), 1);

        // no shapes, so nothing may refer to them
        assert!(section(&script, "shape_exists").is_none());
        assert!(!script.contains(".shapes"));
    }

    #[test]
    fn test_shapes_precede_shape_check() {
        let shapes = Input::from_rows(
            "shapes",
            vec![RawRow::from_pairs([
                ("shape_id", "s1"),
                ("shape_pt_lat", "52.5"),
                ("shape_pt_lon", "13.4"),
                ("shape_pt_sequence", "0"),
            ])],
        );
        let trips = Input::from_rows(
            "trips",
            vec![RawRow::from_pairs([
                ("trip_id", "t1"),
                ("route_id", "r1"),
                ("service_id", "s1"),
                ("shape_id", "s1"),
            ])],
        );
        let script = convert(vec![trips, shapes], silent())
            .unwrap()
            .into_string()
            .unwrap();

        let shapes = section(&script, "shapes").unwrap();
        let shape_exists = section(&script, "shape_exists").unwrap();
        let trips = section(&script, "trips").unwrap();
        assert!(shapes < shape_exists && shape_exists < trips);
        assert!(script.contains("CHECK (\"public\".shape_exists(shape_id))"));
    }

    #[test]
    fn test_end_of_data_line_in_a_value() {
        let agency = Input::from_rows(
            "agency",
            vec![RawRow::from_pairs([
                ("agency_name", "Acme \\.\n\\.\nSELECT 'injected'; --"),
                ("agency_url", "http://x"),
                ("agency_timezone", "UTC"),
            ])],
        );
        let chunks: Vec<_> = convert(vec![agency], silent()).unwrap().collect();

        let err = chunks.last().unwrap().as_ref().unwrap_err();
        assert!(matches!(err, ConvertError::RowFormat { task, row: 1, .. } if task == "agency"));
        let text: String = chunks.iter().filter_map(|chunk| chunk.as_deref().ok()).collect();
        assert!(!text.contains("injected"));
    }

    #[test]
    fn test_calendar_dates_without_calendar() {
        let calendar_dates = Input::from_rows(
            "calendar_dates",
            vec![RawRow::from_pairs([
                ("service_id", "s1"),
                ("date", "20240101"),
                ("exception_type", "1"),
            ])],
        );
        let script = convert(vec![calendar_dates], silent())
            .unwrap()
            .into_string()
            .unwrap();

        let calendar = section(&script, "calendar").unwrap();
        let service_days = section(&script, "service_days").unwrap();
        let commit = script.find("COMMIT;").unwrap();
        assert!(calendar < service_days && service_days < commit);

        // the calendar mock is nothing but its header
        assert!(script.contains("-- calendar\n-----------------\n\n-- "));
        assert!(script.contains("\"s1\",\"2024-01-01\",\"1\"\n"));
    }

    #[test]
    fn test_stop_times_views_without_frequencies() {
        let stop_times = Input::from_rows(
            "stop_times",
            vec![RawRow::from_pairs([
                ("trip_id", "t1"),
                ("arrival_time", "08:00:00"),
                ("departure_time", "08:01:00"),
                ("stop_id", "a"),
                ("stop_sequence", "0"),
            ])],
        );
        let script = convert(vec![stop_times], silent())
            .unwrap()
            .into_string()
            .unwrap();

        let service_days = section(&script, "service_days").unwrap();
        let frequencies = section(&script, "frequencies").unwrap();
        let stop_times = section(&script, "stop_times").unwrap();
        assert!(service_days < stop_times && frequencies < stop_times);

        // the frequencies mock creates nothing, the views do
        let table = script.find("CREATE TABLE IF NOT EXISTS \"public\".frequencies").unwrap();
        let view = script.find("VIEW \"public\".arrivals_departures").unwrap();
        assert!(stop_times < table && table < view);
        assert!(script.contains("VIEW \"public\".connections"));
    }

    #[test]
    fn test_unsupported_input() {
        let foobar = Input::from_rows("foobar", vec![RawRow::from_pairs([("foo", "bar")])]);
        let result = convert(vec![foobar], silent());
        assert!(matches!(result, Err(ConvertError::UnsupportedInput(name)) if name == "foobar"));
    }

    #[test]
    fn test_calendar_overrides_mock() {
        let calendar = Input::from_rows(
            "calendar",
            vec![RawRow::from_pairs([
                ("service_id", "s1"),
                ("monday", "1"),
                ("tuesday", "1"),
                ("wednesday", "1"),
                ("thursday", "1"),
                ("friday", "1"),
                ("saturday", "0"),
                ("sunday", "0"),
                ("start_date", "20240101"),
                ("end_date", "20241231"),
            ])],
        );
        let script = convert(vec![calendar], silent()).unwrap().into_string().unwrap();

        let calendar = section(&script, "calendar").unwrap();
        let calendar_dates = section(&script, "calendar_dates").unwrap();
        let service_days = section(&script, "service_days").unwrap();
        assert!(calendar < service_days && calendar_dates < service_days);
        assert!(script.contains("CREATE TABLE \"public\".calendar ("));
        assert!(script.contains("\"s1\",\"true\",\"true\",\"true\",\"true\",\"true\",\"false\",\"false\""));
    }

    #[test]
    fn test_require_dependencies_produces_nothing() {
        let trips = Input::from_rows("trips", vec![]);
        let opts = Options {
            require_dependencies: true,
            ..silent()
        };
        let result = convert(vec![trips], opts);
        assert!(matches!(result, Err(ConvertError::MissingDependency { .. })));
    }

    #[test]
    fn test_invalid_schema() {
        let opts = Options {
            schema: String::from("evil\"; DROP TABLE stops; --"),
            ..silent()
        };
        assert!(matches!(convert(vec![], opts), Err(ConvertError::InvalidSchema(_))));
    }

    #[test]
    fn test_deterministic() {
        let run = || {
            let inputs = vec![
                Input::from_rows(
                    "stops",
                    vec![RawRow::from_pairs([
                        ("stop_id", "a"),
                        ("stop_name", "A"),
                        ("stop_lat", "52.5"),
                        ("stop_lon", "13.4"),
                    ])],
                ),
                Input::from_rows(
                    "agency",
                    vec![RawRow::from_pairs([
                        ("agency_name", "Acme"),
                        ("agency_url", "http://x"),
                        ("agency_timezone", "UTC"),
                    ])],
                ),
            ];
            convert(inputs, silent()).unwrap().into_string().unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_custom_formatter() {
        let formatters = Formatters::builtin().register(
            "foobar",
            Formatter::new()
                .setup(Sql::Static("COPY foobar (foo) FROM STDIN csv;\n"))
                .row(|row, _| Ok(vec![row.get("foo").map(encode::Value::from).into()]))
                .teardown(Sql::Static("\\.\n")),
        );
        let foobar = Input::from_rows("foobar", vec![RawRow::from_pairs([("foo", "bar")])]);
        let script = convert_with(vec![foobar], silent(), &formatters)
            .unwrap()
            .into_string()
            .unwrap();
        assert!(script.contains("COPY foobar (foo) FROM STDIN csv;\n\"bar\"\n\\.\n;\n"));
    }

    #[test]
    fn test_plan_renders() {
        let registry = plan(vec![Input::from_rows("trips", vec![])], silent()).unwrap();
        let mermaid = registry.to_string();
        assert!(mermaid.starts_with("graph LR\n"));
        assert!(mermaid.contains("[\"trips\"]"));
    }
}
