//! Task and task list entities as returned by the backend

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{FilterCriteria, Resource};

/// Task priority: 1 = high, 2 = medium, 3 = low
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn level(self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.level()
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(Priority::High),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::Low),
            other => Err(format!("invalid priority level: {}", other)),
        }
    }
}

/// A to-do item
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    /// ISO-8601 due date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_list_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_list_name: Option<String>,
}

impl Task {
    /// New unsaved task
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn in_list(mut self, list_id: u64) -> Self {
        self.task_list_id = Some(list_id);
        self
    }
}

impl Resource for Task {
    const NAME: &'static str = "task";
    const PATH: &'static str = "/api/tasks";
    const CACHE_PREFIX: &'static str = "tasks:";
    const DEPENDENT_PREFIXES: &'static [&'static str] = &[TaskList::CACHE_PREFIX];

    fn id(&self) -> Option<u64> {
        self.id
    }

    /// Unfiltered and per-list listings have their own endpoints; anything
    /// else goes through the filter endpoint.
    fn list_path(filter: &FilterCriteria) -> String {
        let only_list = FilterCriteria {
            list_id: filter.list_id,
            ..Default::default()
        };
        match filter.list_id {
            None if filter.is_empty() => Self::PATH.to_string(),
            Some(list_id) if *filter == only_list => format!("{}/list/{}", Self::PATH, list_id),
            _ => format!("{}/filter", Self::PATH),
        }
    }
}

/// A named group of tasks owned by one user
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_username: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl TaskList {
    /// New unsaved list
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl Resource for TaskList {
    const NAME: &'static str = "task list";
    const PATH: &'static str = "/api/lists";
    const CACHE_PREFIX: &'static str = "task_lists:";
    const DEPENDENT_PREFIXES: &'static [&'static str] = &[Task::CACHE_PREFIX];

    fn id(&self) -> Option<u64> {
        self.id
    }

    // The backend only accepts the editable fields on a list write.
    fn write_payload(&self) -> serde_json::Result<Value> {
        Ok(json!({
            "id": self.id,
            "name": self.name,
            "description": self.description,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_wire_format() {
        let task: Task = serde_json::from_value(json!({
            "id": 7,
            "title": "Buy milk",
            "priority": 1,
            "completed": false,
            "taskListId": 3,
            "dueDate": "2026-10-20T09:00:00"
        }))
        .unwrap();

        assert_eq!(task.id, Some(7));
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.task_list_id, Some(3));
        assert_eq!(task.description, "");

        let back = serde_json::to_value(&task).unwrap();
        assert_eq!(back["priority"], json!(1));
        assert_eq!(back["taskListId"], json!(3));
        assert!(back.get("createdAt").is_none());
    }

    #[test]
    fn test_invalid_priority_rejected() {
        let result = serde_json::from_value::<Task>(json!({"title": "x", "priority": 9}));
        assert!(result.is_err());
    }

    #[test]
    fn test_task_list_payload_is_restricted() {
        let mut list = TaskList::new("Groceries");
        list.id = Some(4);
        list.tasks.push(Task::new("Eggs"));
        list.owner_username = Some("ana".into());

        let payload = list.write_payload().unwrap();
        assert_eq!(payload, json!({"id": 4, "name": "Groceries", "description": ""}));
    }

    #[test]
    fn test_task_listing_endpoints() {
        assert_eq!(Task::list_path(&FilterCriteria::new()), "/api/tasks");
        assert_eq!(Task::list_path(&FilterCriteria::new().list(3)), "/api/tasks/list/3");
        assert_eq!(
            Task::list_path(&FilterCriteria::new().list(3).search("milk")),
            "/api/tasks/filter"
        );
        assert_eq!(TaskList::list_path(&FilterCriteria::new().list(3)), "/api/lists");
    }

    #[test]
    fn test_prefixes_reference_each_other() {
        assert_eq!(Task::DEPENDENT_PREFIXES, &["task_lists:"]);
        assert_eq!(TaskList::DEPENDENT_PREFIXES, &["tasks:"]);
    }
}
