use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use estatecrm_core::{DomainError, DomainResult, Entity, Owned, TaskId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: TaskPriority,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: TaskPriority,
}

/// Partial update of a task. `None` keeps the existing value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<TaskPriority>,
}

impl Task {
    pub fn create(id: TaskId, new: NewTask, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            owner_id: new.owner_id,
            title: required_title(&new.title)?,
            description: new.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            due_date: new.due_date,
            priority: new.priority,
            completed: false,
            completed_at: None,
            created_at: now,
        })
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn update(&self, update: TaskUpdate) -> DomainResult<Self> {
        let mut next = self.clone();
        if let Some(title) = update.title {
            next.title = required_title(&title)?;
        }
        if update.description.is_some() {
            next.description = update.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
        }
        if update.due_date.is_some() {
            next.due_date = update.due_date;
        }
        if let Some(priority) = update.priority {
            next.priority = priority;
        }
        Ok(next)
    }

    /// Flip completion, stamping `completed_at` on completion and clearing it
    /// when reopened.
    pub fn toggle(&self, now: DateTime<Utc>) -> Self {
        let completed = !self.completed;
        Self {
            completed,
            completed_at: completed.then_some(now),
            ..self.clone()
        }
    }

    /// Open and due strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < today)
    }
}

impl Entity for Task {
    type Id = TaskId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Owned for Task {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    pub completed: Option<bool>,
    pub priority: Option<TaskPriority>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.completed.is_none_or(|c| c == task.completed)
            && self.priority.is_none_or(|p| p == task.priority)
    }
}

/// Up to `limit` open tasks, earliest due date first. Undated tasks sort
/// last; ties fall back to higher priority, then id.
pub fn upcoming_tasks<'a, I>(tasks: I, limit: usize) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut open: Vec<&Task> = tasks.into_iter().filter(|t| !t.completed).collect();
    open.sort_by(|a, b| {
        let due = |t: &Task| (t.due_date.is_none(), t.due_date);
        due(a)
            .cmp(&due(b))
            .then(b.priority.cmp(&a.priority))
            .then(a.id.cmp(&b.id))
    });
    open.truncate(limit);
    open
}

fn required_title(title: &str) -> DomainResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::validation("task title cannot be empty"));
    }
    Ok(title.to_string())
}
