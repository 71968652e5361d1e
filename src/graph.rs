//! The task registry and how it is assembled for one run.
//!
//! Besides one task per input, the registry always holds a few structural
//! tasks: the validation helpers, `shape_exists`, and the `calendar`,
//! `calendar_dates` and `frequencies` mocks. The mocks let derived objects
//! such as `service_days` depend on files that may or may not be provided.
//! When an input of the same name shows up, it is merged into the mock.
//!
//! Dependencies are edges by name, so a merged task stays wired to
//! everything that already pointed at it.

use std::collections::HashMap;
use std::fmt::{self, Display};

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::ConvertError;
use crate::formatter::Formatters;
use crate::options::Options;
use crate::reader::Input;
use crate::task::Task;

/// Tasks by name, in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry for one run.
    ///
    /// `opts` are expected to be resolved against the input names already,
    /// see [`Options::resolve`].
    pub fn build(
        opts: &Options,
        inputs: Vec<Input>,
        formatters: &Formatters,
    ) -> Result<Self, ConvertError> {
        let inputs: Vec<Input> = if opts.ignore_unsupported_files {
            inputs
                .into_iter()
                .filter(|input| {
                    let supported = formatters.contains(&input.name);
                    if !supported {
                        warn!(input = %input.name, "ignoring unsupported file");
                    }
                    supported
                })
                .collect()
        } else {
            inputs
        };

        let names: Vec<String> = inputs.iter().map(|input| input.name.clone()).collect();
        let provided: Vec<&str> = names.iter().map(String::as_str).collect();
        let catalog = Catalog::new(opts, &provided);
        debug!(?catalog, "computed dependency catalog");

        let structural = |name: &str, dependencies: &[&str]| {
            let dependencies = dependencies.iter().copied();
            match formatters.get(name) {
                Some(formatter) => Task::concrete(name, dependencies, formatter.clone(), None),
                None => Task::mock(name, dependencies),
            }
        };

        let mut registry = Self::new();
        registry.insert(structural("is_bcp_47_code", &[]));
        registry.insert(structural("is_timezone", &[]));
        if !opts.trips_without_shape_id() {
            registry.insert(structural("shape_exists", catalog.get("shape_exists")));
        }
        registry.insert(Task::mock("calendar", catalog.get("calendar").iter().copied()));
        registry.insert(Task::mock(
            "calendar_dates",
            catalog.get("calendar_dates").iter().copied(),
        ));
        registry.insert(structural("service_days", &["calendar", "calendar_dates"]));
        registry.insert(Task::mock(
            "frequencies",
            catalog.get("frequencies").iter().copied(),
        ));

        for input in inputs {
            let Some(formatter) = formatters.get(&input.name) else {
                return Err(ConvertError::UnsupportedInput(input.name));
            };

            let dependencies = catalog.get(&input.name);
            if opts.require_dependencies {
                let missing = dependencies.iter().find(|dependency| {
                    !registry.contains(dependency)
                        && !provided.iter().any(|name| name == *dependency)
                });
                if let Some(dependency) = missing {
                    return Err(ConvertError::MissingDependency {
                        task: input.name,
                        dependency: dependency.to_string(),
                    });
                }
            }

            let name = input.name.clone();
            registry.insert(Task::concrete(
                name,
                dependencies.iter().copied(),
                formatter.clone(),
                Some(input),
            ));
        }

        registry.prune();
        debug!(tasks = registry.len(), "built task registry");

        Ok(registry)
    }

    /// Adds a task. A task of the same name is merged into instead, keeping
    /// its position and dependencies.
    pub fn insert(&mut self, task: Task) {
        match self.index.get(&task.name) {
            Some(&i) => self.tasks[i].merge(task),
            None => {
                self.index.insert(task.name.clone(), self.tasks.len());
                self.tasks.push(task);
            }
        }
    }

    /// Drops dependencies on names which never got registered.
    fn prune(&mut self) {
        let index = &self.index;
        for task in &mut self.tasks {
            task.dependencies.retain(|dependency| {
                let known = index.contains_key(dependency);
                if !known {
                    debug!(task = %task.name, %dependency, "dropping edge to absent task");
                }
                known
            });
        }
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.index.get(name).map(|&i| &self.tasks[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Resolves the edges by name into a graph. Node `i` is the `i`-th
    /// registered task; edges point from a dependency to its dependent and
    /// are added in declaration order.
    pub fn graph(&self) -> Result<DiGraph<&str, ()>, ConvertError> {
        let mut graph = DiGraph::with_capacity(self.tasks.len(), self.tasks.len() * 2);
        for task in &self.tasks {
            graph.add_node(task.name.as_str());
        }

        for (i, task) in self.tasks.iter().enumerate() {
            for dependency in &task.dependencies {
                let Some(&j) = self.index.get(dependency) else {
                    return Err(ConvertError::UnknownDependency {
                        task: task.name.clone(),
                        dependency: dependency.clone(),
                    });
                };
                graph.add_edge(NodeIndex::new(j), NodeIndex::new(i), ());
            }
        }

        Ok(graph)
    }

    pub(crate) fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }
}

/// Renders the registry as a Mermaid flowchart. Mock tasks are drawn with
/// rounded corners.
impl Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "graph LR")?;

        for (i, task) in self.tasks.iter().enumerate() {
            let name = task.name.replace('"', "#quot;");
            if task.is_mock() {
                writeln!(f, "    {i}(\"{name}\")")?;
            } else {
                writeln!(f, "    {i}[\"{name}\"]")?;
            }
        }

        for (i, task) in self.tasks.iter().enumerate() {
            for dependency in &task.dependencies {
                if let Some(j) = self.index.get(dependency) {
                    writeln!(f, "    {j} --> {i}")?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::RawRow;

    fn input(name: &str) -> Input {
        Input::from_rows(name, vec![RawRow::from_pairs([("id", "1")])])
    }

    fn names(registry: &Registry) -> Vec<&str> {
        registry.iter().map(|task| task.name.as_str()).collect()
    }

    #[test]
    fn test_structural_tasks() {
        let opts = Options::default().resolve([]).unwrap();
        let registry = Registry::build(&opts, vec![], &Formatters::builtin()).unwrap();

        assert_eq!(
            names(&registry),
            [
                "is_bcp_47_code",
                "is_timezone",
                "calendar",
                "calendar_dates",
                "service_days",
                "frequencies",
            ]
        );
        assert!(registry.get("calendar").unwrap().is_mock());
        assert!(registry.get("frequencies").unwrap().is_mock());
        assert!(!registry.get("service_days").unwrap().is_mock());
        assert_eq!(
            registry.get("service_days").unwrap().dependencies,
            ["calendar", "calendar_dates"]
        );
        assert!(registry.get("frequencies").unwrap().dependencies.is_empty());
    }

    #[test]
    fn test_shape_check_needs_shapes() {
        let opts = Options::default().resolve(["agency"]).unwrap();
        let registry =
            Registry::build(&opts, vec![input("agency")], &Formatters::builtin()).unwrap();
        assert!(!registry.contains("shape_exists"));

        let opts = Options::default().resolve(["shapes"]).unwrap();
        let registry =
            Registry::build(&opts, vec![input("shapes")], &Formatters::builtin()).unwrap();
        assert_eq!(registry.get("shape_exists").unwrap().dependencies, ["shapes"]);

        let opts = Options {
            trips_without_shape_id: Some(true),
            ..Options::default()
        }
        .resolve(["shapes"])
        .unwrap();
        let registry =
            Registry::build(&opts, vec![input("shapes")], &Formatters::builtin()).unwrap();
        assert!(!registry.contains("shape_exists"));
    }

    #[test]
    fn test_missing_formatter_is_mock() {
        let registry = Registry::build(&Options::default(), vec![], &Formatters::new()).unwrap();
        assert!(registry.iter().all(Task::is_mock));
    }

    #[test]
    fn test_input_overrides_mock() {
        let opts = Options::default().resolve(["calendar", "trips"]).unwrap();
        let inputs = vec![input("calendar"), input("trips")];
        let registry = Registry::build(&opts, inputs, &Formatters::builtin()).unwrap();

        let calendar = registry.get("calendar").unwrap();
        assert!(calendar.has_source());
        // keeps the position of the mock
        assert_eq!(names(&registry)[2], "calendar");
        assert_eq!(names(&registry).last(), Some(&"trips"));

        // frequencies is still a mock, but now wired to trips
        let frequencies = registry.get("frequencies").unwrap();
        assert!(frequencies.is_mock());
        assert_eq!(frequencies.dependencies, ["trips"]);
    }

    #[test]
    fn test_unsupported_input() {
        let err = Registry::build(
            &Options::default(),
            vec![input("agency"), input("foobar")],
            &Formatters::builtin(),
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedInput(name) if name == "foobar"));
    }

    #[test]
    fn test_ignore_unsupported_input() {
        let opts = Options {
            ignore_unsupported_files: true,
            ..Options::default()
        };
        let registry =
            Registry::build(&opts, vec![input("foobar")], &Formatters::builtin()).unwrap();
        assert!(!registry.contains("foobar"));
    }

    #[test]
    fn test_require_dependencies() {
        let opts = Options {
            require_dependencies: true,
            ..Options::default()
        }
        .resolve(["routes"])
        .unwrap();
        let err = Registry::build(&opts, vec![input("routes")], &Formatters::builtin())
            .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::MissingDependency { ref task, ref dependency }
                if task == "routes" && dependency == "agency"
        ));

        let opts = Options::default().resolve(["routes"]).unwrap();
        let registry =
            Registry::build(&opts, vec![input("routes")], &Formatters::builtin()).unwrap();
        assert!(registry.get("routes").unwrap().dependencies.is_empty());
    }

    #[test]
    fn test_graph_unknown_dependency() {
        let mut registry = Registry::new();
        registry.insert(Task::mock("a", ["b"]));
        let err = registry.graph().unwrap_err();
        assert!(matches!(
            err,
            ConvertError::UnknownDependency { ref task, ref dependency }
                if task == "a" && dependency == "b"
        ));
    }

    #[test]
    fn test_mermaid() {
        let mut registry = Registry::new();
        registry.insert(Task::mock("calendar", Vec::<String>::new()));
        registry.insert(Task::concrete(
            "service_days",
            ["calendar"],
            std::sync::Arc::new(crate::formatter::Formatter::new()),
            None,
        ));

        assert_eq!(
            registry.to_string(),
            "graph LR\n    0(\"calendar\")\n    1[\"service_days\"]\n    0 --> 1\n"
        );
    }
}
