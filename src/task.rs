//! Nodes of the task graph.
use std::sync::Arc;

use crate::formatter::Formatter;
use crate::reader::Input;

/// What a task contributes to the script besides its section header.
#[derive(Debug)]
pub enum Body {
    /// Only carries dependency edges.
    Mock,
    /// Emits the formatter's setup and teardown, plus one line per row of
    /// `source` if there is one.
    Concrete {
        formatter: Arc<Formatter>,
        source: Option<Input>,
    },
}

/// A named unit of the script, ordered after all of its dependencies.
#[derive(Debug)]
pub struct Task {
    pub name: String,
    pub dependencies: Vec<String>,
    pub body: Body,
}

impl Task {
    pub fn mock<I, S>(name: impl Into<String>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_body(name, dependencies, Body::Mock)
    }

    pub fn concrete<I, S>(
        name: impl Into<String>,
        dependencies: I,
        formatter: Arc<Formatter>,
        source: Option<Input>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_body(name, dependencies, Body::Concrete { formatter, source })
    }

    fn with_body<I, S>(name: impl Into<String>, dependencies: I, body: Body) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut task = Self {
            name: name.into(),
            dependencies: Vec::new(),
            body,
        };
        task.add_dependencies(dependencies.into_iter().map(Into::into));
        task
    }

    pub fn is_mock(&self) -> bool {
        matches!(self.body, Body::Mock)
    }

    /// Whether rows will be streamed for this task.
    pub fn has_source(&self) -> bool {
        matches!(self.body, Body::Concrete { source: Some(_), .. })
    }

    /// Takes over the body of `other`, keeping the dependencies of both.
    pub(crate) fn merge(&mut self, other: Task) {
        self.body = other.body;
        self.add_dependencies(other.dependencies);
    }

    fn add_dependencies(&mut self, dependencies: impl IntoIterator<Item = String>) {
        for dependency in dependencies {
            if !self.dependencies.contains(&dependency) {
                self.dependencies.push(dependency);
            }
        }
    }
}
