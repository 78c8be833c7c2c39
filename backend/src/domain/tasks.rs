//! Task service: the only component allowed to touch the task store.
//!
//! Every operation takes the acting user and enforces ownership scoping;
//! a task that is missing and a task owned by somebody else both surface
//! as `NotFound`, so the API never leaks that a foreign id exists.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use super::DomainError;
use super::ports::{NewTaskRecord, TaskChanges, TaskPersistenceError, TaskRepository};
use super::task::{Task, TaskDraft, TaskId, TaskPatch};
use super::user::UserId;

/// Map adapter failures to domain errors.
fn map_task_persistence_error(error: TaskPersistenceError) -> DomainError {
    match error {
        TaskPersistenceError::Connection { message } => {
            tracing::error!(%message, "task store unreachable");
            DomainError::service_unavailable("task store temporarily unavailable")
        }
        TaskPersistenceError::Query { message } => {
            tracing::error!(%message, "task store query failed");
            DomainError::internal("task store query failed")
        }
    }
}

fn task_not_found() -> DomainError {
    DomainError::not_found("Task not found")
}

/// Ownership-enforcing CRUD over tasks.
#[derive(Clone)]
pub struct TaskService {
    repository: Arc<dyn TaskRepository>,
}

impl TaskService {
    /// Create a service backed by the given repository.
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }

    /// All tasks owned by `actor`, newest creation first.
    pub async fn list(&self, actor: UserId) -> Result<Vec<Task>, DomainError> {
        self.repository
            .list_for_owner(actor)
            .await
            .map_err(map_task_persistence_error)
    }

    /// Create a task for `actor`, applying defaults: empty description,
    /// incomplete status, timestamps set to now.
    pub async fn create(&self, actor: UserId, draft: TaskDraft) -> Result<Task, DomainError> {
        let title = draft.title.trim().to_owned();
        if title.is_empty() {
            return Err(DomainError::invalid_request("title must not be empty")
                .with_details(json!({ "field": "title" })));
        }

        let now = Utc::now().naive_utc();
        let record = NewTaskRecord {
            owner: actor,
            title,
            description: draft.description.unwrap_or_default(),
            status: false,
            task_time: draft.task_time,
            created_at: now,
            updated_at: now,
        };
        self.repository
            .insert(record)
            .await
            .map_err(map_task_persistence_error)
    }

    /// Load one of `actor`'s tasks for display (e.g. the edit form).
    pub async fn find(&self, actor: UserId, id: TaskId) -> Result<Task, DomainError> {
        self.repository
            .find_for_owner(actor, id)
            .await
            .map_err(map_task_persistence_error)?
            .ok_or_else(task_not_found)
    }

    /// Apply a partial update. Omitted fields keep their stored values;
    /// `updated_at` is refreshed.
    pub async fn update(
        &self,
        actor: UserId,
        id: TaskId,
        patch: TaskPatch,
    ) -> Result<Task, DomainError> {
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(DomainError::invalid_request("title must not be empty")
                    .with_details(json!({ "field": "title" })));
            }
        }

        let current = self.find(actor, id).await?;
        let (title, description, task_time) = current.patched_fields(&patch);
        let changes = TaskChanges {
            title: title.trim().to_owned(),
            description,
            status: current.status,
            task_time,
            updated_at: Utc::now().naive_utc(),
        };
        self.apply_changes(actor, id, changes).await
    }

    /// Flip the completion flag.
    pub async fn toggle(&self, actor: UserId, id: TaskId) -> Result<Task, DomainError> {
        let current = self.find(actor, id).await?;
        let changes = TaskChanges {
            title: current.title.clone(),
            description: current.description.clone(),
            status: !current.status,
            task_time: current.task_time,
            updated_at: Utc::now().naive_utc(),
        };
        self.apply_changes(actor, id, changes).await
    }

    /// Permanently remove one of `actor`'s tasks.
    pub async fn delete(&self, actor: UserId, id: TaskId) -> Result<(), DomainError> {
        let deleted = self
            .repository
            .delete_for_owner(actor, id)
            .await
            .map_err(map_task_persistence_error)?;
        if deleted { Ok(()) } else { Err(task_not_found()) }
    }

    async fn apply_changes(
        &self,
        actor: UserId,
        id: TaskId,
        changes: TaskChanges,
    ) -> Result<Task, DomainError> {
        // The row can vanish between the read and the write; treat that
        // exactly like a missing task.
        self.repository
            .update_for_owner(actor, id, changes)
            .await
            .map_err(map_task_persistence_error)?
            .ok_or_else(task_not_found)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::task::{TaskTime, TaskTimePatch};

    /// In-memory stand-in for the store, mirroring its scoping contract.
    #[derive(Default)]
    struct StubTaskRepository {
        state: Mutex<StubState>,
    }

    #[derive(Default)]
    struct StubState {
        next_id: i64,
        rows: HashMap<i64, Task>,
        fail_next: Option<TaskPersistenceError>,
    }

    impl StubTaskRepository {
        fn fail_next(&self, error: TaskPersistenceError) {
            self.state.lock().expect("state lock").fail_next = Some(error);
        }

        fn take_failure(&self) -> Option<TaskPersistenceError> {
            self.state.lock().expect("state lock").fail_next.take()
        }
    }

    #[async_trait]
    impl TaskRepository for StubTaskRepository {
        async fn insert(&self, record: NewTaskRecord) -> Result<Task, TaskPersistenceError> {
            if let Some(err) = self.take_failure() {
                return Err(err);
            }
            let mut state = self.state.lock().expect("state lock");
            state.next_id += 1;
            let task = Task {
                id: TaskId::new(state.next_id),
                owner: record.owner,
                title: record.title,
                description: record.description,
                status: record.status,
                task_time: record.task_time,
                created_at: record.created_at,
                updated_at: record.updated_at,
            };
            state.rows.insert(task.id.get(), task.clone());
            Ok(task)
        }

        async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Task>, TaskPersistenceError> {
            if let Some(err) = self.take_failure() {
                return Err(err);
            }
            let state = self.state.lock().expect("state lock");
            let mut tasks: Vec<Task> = state
                .rows
                .values()
                .filter(|task| task.owner == owner)
                .cloned()
                .collect();
            tasks.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then(b.id.get().cmp(&a.id.get()))
            });
            Ok(tasks)
        }

        async fn find_for_owner(
            &self,
            owner: UserId,
            id: TaskId,
        ) -> Result<Option<Task>, TaskPersistenceError> {
            if let Some(err) = self.take_failure() {
                return Err(err);
            }
            let state = self.state.lock().expect("state lock");
            Ok(state
                .rows
                .get(&id.get())
                .filter(|task| task.owner == owner)
                .cloned())
        }

        async fn update_for_owner(
            &self,
            owner: UserId,
            id: TaskId,
            changes: TaskChanges,
        ) -> Result<Option<Task>, TaskPersistenceError> {
            if let Some(err) = self.take_failure() {
                return Err(err);
            }
            let mut state = self.state.lock().expect("state lock");
            let Some(task) = state
                .rows
                .get_mut(&id.get())
                .filter(|task| task.owner == owner)
            else {
                return Ok(None);
            };
            task.title = changes.title;
            task.description = changes.description;
            task.status = changes.status;
            task.task_time = changes.task_time;
            task.updated_at = changes.updated_at;
            Ok(Some(task.clone()))
        }

        async fn delete_for_owner(
            &self,
            owner: UserId,
            id: TaskId,
        ) -> Result<bool, TaskPersistenceError> {
            if let Some(err) = self.take_failure() {
                return Err(err);
            }
            let mut state = self.state.lock().expect("state lock");
            let owned = state
                .rows
                .get(&id.get())
                .is_some_and(|task| task.owner == owner);
            if owned {
                state.rows.remove(&id.get());
            }
            Ok(owned)
        }
    }

    fn service() -> (TaskService, Arc<StubTaskRepository>) {
        let repository = Arc::new(StubTaskRepository::default());
        (TaskService::new(repository.clone()), repository)
    }

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_owned(),
            ..TaskDraft::default()
        }
    }

    const ALICE: UserId = UserId::new(1);
    const BOB: UserId = UserId::new(2);

    #[tokio::test]
    async fn create_applies_defaults() {
        let (service, _) = service();
        let task = service
            .create(ALICE, draft("Buy milk"))
            .await
            .expect("create succeeds");
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, "");
        assert!(!task.status);
        assert!(task.task_time.is_none());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[tokio::test]
    async fn blank_title_is_rejected(#[case] title: &str) {
        let (service, _) = service();
        let err = service
            .create(ALICE, draft(title))
            .await
            .expect_err("blank title must fail");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn list_never_shows_foreign_tasks() {
        let (service, _) = service();
        let mine = service.create(ALICE, draft("mine")).await.expect("create");
        service.create(BOB, draft("theirs")).await.expect("create");

        let listed = service.list(ALICE).await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine.id);
    }

    #[tokio::test]
    async fn list_orders_newest_first() {
        let (service, _) = service();
        let first = service.create(ALICE, draft("first")).await.expect("create");
        let second = service.create(ALICE, draft("second")).await.expect("create");

        let listed = service.list(ALICE).await.expect("list");
        let ids: Vec<_> = listed.iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn toggle_twice_round_trips() {
        let (service, _) = service();
        let task = service.create(ALICE, draft("t")).await.expect("create");

        let toggled = service.toggle(ALICE, task.id).await.expect("toggle");
        assert!(toggled.status);
        let restored = service.toggle(ALICE, task.id).await.expect("toggle back");
        assert!(!restored.status);
    }

    #[tokio::test]
    async fn foreign_task_is_not_found_for_every_mutation() {
        let (service, _) = service();
        let task = service.create(ALICE, draft("t")).await.expect("create");

        let update_err = service
            .update(BOB, task.id, TaskPatch::default())
            .await
            .expect_err("foreign update must fail");
        let toggle_err = service
            .toggle(BOB, task.id)
            .await
            .expect_err("foreign toggle must fail");
        let delete_err = service
            .delete(BOB, task.id)
            .await
            .expect_err("foreign delete must fail");
        for err in [update_err, toggle_err, delete_err] {
            assert_eq!(err.code(), ErrorCode::NotFound);
            assert_eq!(err.message(), "Task not found");
        }
    }

    #[tokio::test]
    async fn deleted_task_stays_deleted() {
        let (service, _) = service();
        let task = service.create(ALICE, draft("t")).await.expect("create");
        service.delete(ALICE, task.id).await.expect("delete");

        for err in [
            service
                .update(ALICE, task.id, TaskPatch::default())
                .await
                .expect_err("update after delete"),
            service
                .toggle(ALICE, task.id)
                .await
                .expect_err("toggle after delete"),
            service
                .delete(ALICE, task.id)
                .await
                .expect_err("delete after delete"),
        ] {
            assert_eq!(err.code(), ErrorCode::NotFound);
        }
    }

    #[tokio::test]
    async fn update_patches_only_supplied_fields() {
        let (service, _) = service();
        let task = service
            .create(
                ALICE,
                TaskDraft {
                    title: "title".to_owned(),
                    description: Some("desc".to_owned()),
                    task_time: TaskTime::parse_lenient("09:30"),
                },
            )
            .await
            .expect("create");

        let patch = TaskPatch {
            title: Some("new title".to_owned()),
            ..TaskPatch::default()
        };
        let updated = service.update(ALICE, task.id, patch).await.expect("update");
        assert_eq!(updated.title, "new title");
        assert_eq!(updated.description, "desc");
        assert_eq!(
            updated.task_time.map(|t| t.to_string()),
            Some("09:30".to_owned())
        );
        assert!(updated.updated_at >= task.updated_at);
    }

    #[tokio::test]
    async fn clearing_task_time_stores_absent() {
        let (service, _) = service();
        let task = service
            .create(
                ALICE,
                TaskDraft {
                    title: "t".to_owned(),
                    description: None,
                    task_time: TaskTime::parse_lenient("09:30"),
                },
            )
            .await
            .expect("create");

        let patch = TaskPatch {
            task_time: TaskTimePatch::Clear,
            ..TaskPatch::default()
        };
        let updated = service.update(ALICE, task.id, patch).await.expect("update");
        assert!(updated.task_time.is_none());
    }

    #[rstest]
    #[case(TaskPersistenceError::connection("down"), ErrorCode::ServiceUnavailable)]
    #[case(TaskPersistenceError::query("boom"), ErrorCode::InternalError)]
    #[tokio::test]
    async fn persistence_failures_map_to_domain_codes(
        #[case] failure: TaskPersistenceError,
        #[case] expected: ErrorCode,
    ) {
        let (service, repository) = service();
        repository.fail_next(failure);
        let err = service.list(ALICE).await.expect_err("list must fail");
        assert_eq!(err.code(), expected);
    }
}
