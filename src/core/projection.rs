use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::task::Task;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterMode {
    #[default]
    All,
    Completed,
    Incomplete,
}

impl FilterMode {
    pub const ALL: &'static [FilterMode] =
        &[FilterMode::All, FilterMode::Completed, FilterMode::Incomplete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
        }
    }

    pub fn accepts(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.completed,
            Self::Incomplete => !task.completed,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "completed" => Ok(Self::Completed),
            "incomplete" => Ok(Self::Incomplete),
            other => Err(format!("Unknown filter '{}'", other)),
        }
    }
}

/// Inputs to the projection, owned by the shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub filter: FilterMode,
    pub search: String,
}

impl ViewState {
    pub fn new(filter: FilterMode) -> Self {
        Self {
            filter,
            search: String::new(),
        }
    }

    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        project(tasks, self.filter, &self.search)
    }
}

/// The tasks that pass both the filter and the search term, in input order.
pub fn project<'a>(tasks: &'a [Task], filter: FilterMode, search: &str) -> Vec<&'a Task> {
    let needle = search.to_lowercase();
    tasks
        .iter()
        .filter(|t| filter.accepts(t))
        .filter(|t| t.title_contains(&needle))
        .collect()
}

/// Per-filter totals, shown next to the filter buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub total: usize,
    pub completed: usize,
    pub incomplete: usize,
}

impl TaskCounts {
    pub fn of(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            total: tasks.len(),
            completed,
            incomplete: tasks.len() - completed,
        }
    }

    pub fn for_filter(&self, filter: FilterMode) -> usize {
        match filter {
            FilterMode::All => self.total,
            FilterMode::Completed => self.completed,
            FilterMode::Incomplete => self.incomplete,
        }
    }
}
