/// Task list filtering and title search
///
/// [`apply`] narrows an owner's task list by a case-insensitive title search
/// and an optional relative-date bucket. Both filters are optional and combine
/// with AND. The reference date is a parameter so a single list operation
/// evaluates every row against the same "today".
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use todo_shared::filter::{apply, FilterOption, TaskFilter};
///
/// let filter = TaskFilter::new(Some("milk"), Some("today"));
/// assert_eq!(filter.option, Some(FilterOption::Today));
///
/// let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
/// let visible = apply(Vec::new(), &filter, today);
/// assert!(visible.is_empty());
/// ```

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::models::task::Task;

/// Relative-date bucket applied to a task's `created` date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOption {
    #[serde(rename = "today")]
    Today,

    #[serde(rename = "yesterday")]
    Yesterday,

    /// The inclusive window from seven days ago through today
    #[serde(rename = "last_7_days")]
    Last7Days,

    #[serde(rename = "tomorrow")]
    Tomorrow,
}

impl FilterOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOption::Today => "today",
            FilterOption::Yesterday => "yesterday",
            FilterOption::Last7Days => "last_7_days",
            FilterOption::Tomorrow => "tomorrow",
        }
    }

    /// Inclusive `(start, end)` date bounds relative to `today`
    pub fn date_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            FilterOption::Today => (today, today),
            FilterOption::Yesterday => {
                let day = today - Duration::days(1);
                (day, day)
            }
            FilterOption::Last7Days => (today - Duration::days(7), today),
            FilterOption::Tomorrow => {
                let day = today + Duration::days(1);
                (day, day)
            }
        }
    }

    /// Whether `date` falls into this bucket
    pub fn matches(&self, date: NaiveDate, today: NaiveDate) -> bool {
        let (start, end) = self.date_range(today);
        start <= date && date <= end
    }
}

impl fmt::Display for FilterOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown filter option
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown filter option: {0}")]
pub struct UnknownFilterOption(pub String);

impl FromStr for FilterOption {
    type Err = UnknownFilterOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(FilterOption::Today),
            "yesterday" => Ok(FilterOption::Yesterday),
            "last_7_days" => Ok(FilterOption::Last7Days),
            "tomorrow" => Ok(FilterOption::Tomorrow),
            other => Err(UnknownFilterOption(other.to_string())),
        }
    }
}

/// Normalised list parameters
///
/// Built from raw query values: an empty search is dropped and an
/// unrecognized filter option is ignored rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Non-empty title search term
    pub search_title: Option<String>,

    /// Recognized date bucket
    pub option: Option<FilterOption>,
}

impl TaskFilter {
    pub fn new(search_title: Option<&str>, filter_option: Option<&str>) -> Self {
        Self {
            search_title: search_title
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            option: filter_option.and_then(|s| s.parse().ok()),
        }
    }

    /// Whether a single task passes every active filter
    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        if let Some(ref needle) = self.search_title {
            if !task.title.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }

        match self.option {
            Some(option) => option.matches(task.created, today),
            None => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search_title.is_none() && self.option.is_none()
    }
}

/// Returns the tasks passing `filter`, preserving input order
pub fn apply(tasks: Vec<Task>, filter: &TaskFilter, today: NaiveDate) -> Vec<Task> {
    if filter.is_empty() {
        return tasks;
    }

    tasks
        .into_iter()
        .filter(|task| filter.matches(task, today))
        .collect()
}
