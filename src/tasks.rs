use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{CreateTaskInput, NewTask, Task, TaskStatus, UpdateTaskInput};
use crate::store::TaskStore;

/// Ownership-scoped operations on tasks.
///
/// Every operation on an existing task first resolves it (`NotFound` if absent) and then
/// checks that the caller created it (`Forbidden` otherwise).
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Creates a task owned by `owner`. Status defaults to `PENDING`.
    pub async fn create(&self, owner: Uuid, input: CreateTaskInput) -> Result<Task, AppError> {
        let task = self.store.insert(NewTask::from_input(input, owner)?).await?;
        log::info!("user {} created todo {}", owner, task.id);
        Ok(task)
    }

    /// Tasks created by `owner`, newest first.
    pub async fn list_owned(&self, owner: Uuid) -> Result<Vec<Task>, AppError> {
        self.store.list_by_creator(owner).await
    }

    pub async fn get_one(&self, id: Uuid, caller: Uuid) -> Result<Task, AppError> {
        self.load_owned(id, caller).await
    }

    /// Applies the supplied fields only; omitted fields keep their stored values.
    pub async fn update(
        &self,
        id: Uuid,
        caller: Uuid,
        changes: UpdateTaskInput,
    ) -> Result<Task, AppError> {
        let mut task = self.load_owned(id, caller).await?;
        task.apply(changes)?;
        self.store.save(&task).await
    }

    /// Any status may move to any other status.
    pub async fn update_status(
        &self,
        id: Uuid,
        caller: Uuid,
        status: TaskStatus,
    ) -> Result<Task, AppError> {
        let mut task = self.load_owned(id, caller).await?;
        task.status = status;
        self.store.save(&task).await
    }

    pub async fn delete(&self, id: Uuid, caller: Uuid) -> Result<(), AppError> {
        self.load_owned(id, caller).await?;
        self.store.delete(id).await?;
        log::info!("user {} deleted todo {}", caller, id);
        Ok(())
    }

    async fn load_owned(&self, id: Uuid, caller: Uuid) -> Result<Task, AppError> {
        let task = self
            .store
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Todo not found".into()))?;

        if task.creator_id != caller {
            log::warn!("user {} denied access to todo {}", caller, id);
            return Err(AppError::Forbidden(
                "You do not have access to this todo".into(),
            ));
        }
        Ok(task)
    }
}
