use estatecrm_auth::Action;
use estatecrm_core::{Clock, DomainResult, TaskId, UserId};
use estatecrm_tasks::{NewTask, Task, TaskFilter, TaskUpdate};

use super::{CrmService, acting, check, check_owner};
use crate::store::CrmStore;

impl<S, C> CrmService<S, C>
where
    S: CrmStore,
    C: Clock,
{
    pub fn create_task(&self, actor_id: UserId, new: NewTask) -> DomainResult<Task> {
        let now = self.clock.now();
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            check_owner(&actor, new.owner_id)?;
            t.user(new.owner_id)?;

            let id = t.next_task_id();
            let task = Task::create(id, new, now)?;
            t.tasks.insert(id, task.clone());
            tracing::info!(actor_id = %actor_id, task_id = %id, priority = task.priority.as_str(), "task created");
            Ok(task)
        })
    }

    /// Visible tasks matching `filter`: open before done, then by due date.
    pub fn list_tasks(&self, actor_id: UserId, filter: &TaskFilter) -> DomainResult<Vec<Task>> {
        self.store.read(|t| {
            let actor = acting(t, actor_id)?;
            let mut tasks: Vec<Task> = actor
                .visible(t.tasks.values())
                .into_iter()
                .filter(|task| filter.matches(task))
                .cloned()
                .collect();
            tasks.sort_by_key(|task| (task.is_completed(), task.due_date.is_none(), task.due_date, task.id));
            Ok(tasks)
        })
    }

    pub fn get_task(&self, actor_id: UserId, task_id: TaskId) -> DomainResult<Task> {
        self.store.read(|t| {
            let actor = acting(t, actor_id)?;
            let task = t.task(task_id)?;
            check(&actor, task, Action::View)?;
            Ok(task.clone())
        })
    }

    pub fn update_task(&self, actor_id: UserId, task_id: TaskId, update: TaskUpdate) -> DomainResult<Task> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            let task = t.task(task_id)?;
            check(&actor, task, Action::Edit)?;
            let updated = task.update(update)?;
            t.tasks.insert(task_id, updated.clone());
            tracing::info!(actor_id = %actor_id, task_id = %task_id, "task updated");
            Ok(updated)
        })
    }

    pub fn toggle_task(&self, actor_id: UserId, task_id: TaskId) -> DomainResult<Task> {
        let now = self.clock.now();
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            let task = t.task(task_id)?;
            check(&actor, task, Action::Edit)?;
            let toggled = task.toggle(now);
            t.tasks.insert(task_id, toggled.clone());
            tracing::info!(actor_id = %actor_id, task_id = %task_id, completed = toggled.is_completed(), "task toggled");
            Ok(toggled)
        })
    }

    pub fn delete_task(&self, actor_id: UserId, task_id: TaskId) -> DomainResult<()> {
        self.store.write(|t| {
            let actor = acting(t, actor_id)?;
            check(&actor, t.task(task_id)?, Action::Delete)?;
            t.tasks.remove(&task_id);
            tracing::info!(actor_id = %actor_id, task_id = %task_id, "task deleted");
            Ok(())
        })
    }
}
