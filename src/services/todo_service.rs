use std::sync::Arc;

use tracing::info;

use crate::db::models::{NewTodo, Todo};
use crate::db::repositories::{RepositoryError, TodoRepository};
use crate::services::tag_service::TagService;

#[derive(Clone)]
pub struct TodoService {
    repo: Arc<dyn TodoRepository>,
    tags: TagService,
}

impl TodoService {
    pub fn new(repo: Arc<dyn TodoRepository>, tags: TagService) -> Self {
        Self { repo, tags }
    }

    /// Creates an open todo. Tag names are resolved first; if that fails
    /// nothing is written for the todo itself.
    pub async fn create_todo(
        &self,
        title: String,
        tag_names: &[String],
    ) -> Result<Todo, RepositoryError> {
        let tags = if tag_names.is_empty() {
            Vec::new()
        } else {
            self.tags.get_or_create_tags(tag_names).await?
        };

        let todo = self
            .repo
            .create(NewTodo {
                title,
                completed: false,
                tags,
            })
            .await?;
        info!(todo_id = todo.id, tag_count = todo.tags.len(), "Created todo.");
        Ok(todo)
    }

    pub async fn get_todo(&self, id: i32) -> Result<Todo, RepositoryError> {
        self.repo.find_by_id(id).await
    }

    pub async fn list_todos(&self) -> Result<Vec<Todo>, RepositoryError> {
        self.repo.find_all().await
    }

    /// Saves `todo` and replaces its whole tag set with `tag_names`.
    /// An empty list clears every tag from the todo.
    pub async fn update_todo(
        &self,
        mut todo: Todo,
        tag_names: &[String],
    ) -> Result<Todo, RepositoryError> {
        todo.tags = if tag_names.is_empty() {
            Vec::new()
        } else {
            self.tags.get_or_create_tags(tag_names).await?
        };
        self.repo.update(todo).await
    }

    pub async fn delete_todo(&self, id: i32) -> Result<(), RepositoryError> {
        self.repo.delete(id).await?;
        info!(todo_id = id, "Deleted todo.");
        Ok(())
    }

    /// Detaches one tag from one todo. Both entities stay in place.
    pub async fn remove_tag_from_todo(
        &self,
        todo_id: i32,
        tag_id: i32,
    ) -> Result<(), RepositoryError> {
        self.repo.remove_tag(todo_id, tag_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::MemoryStore;
    use crate::services::test_support::FlakyTags;

    fn services() -> (TodoService, TagService) {
        let store = Arc::new(MemoryStore::new());
        let tags = TagService::new(store.clone());
        (TodoService::new(store, tags.clone()), tags)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn tag_names(todo: &Todo) -> Vec<&str> {
        todo.tags.iter().map(|t| t.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_create_with_new_tags() {
        let (todos, tags) = services();

        let todo = todos.create_todo("buy milk".into(), &names(&["a", "b"])).await.unwrap();

        assert!(!todo.completed);
        assert_eq!(tag_names(&todo), vec!["a", "b"]);
        assert_eq!(tags.list_tags().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_second_todo_reuses_existing_tag() {
        let (todos, tags) = services();
        let first = todos.create_todo("one".into(), &names(&["a", "b"])).await.unwrap();

        let second = todos.create_todo("two".into(), &names(&["a"])).await.unwrap();

        assert_eq!(second.tags[0].id, first.tags[0].id);
        let all = tags.list_tags().await.unwrap();
        assert_eq!(all.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_create_without_tags() {
        let (todos, tags) = services();
        let todo = todos.create_todo("plain".into(), &[]).await.unwrap();
        assert!(todo.tags.is_empty());
        assert!(tags.list_tags().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_tag_set() {
        let (todos, _) = services();
        let todo = todos.create_todo("task".into(), &names(&["a", "b"])).await.unwrap();

        let mut edited = todo.clone();
        edited.title = "task, renamed".into();
        edited.completed = true;
        let updated = todos.update_todo(edited, &names(&["b", "c"])).await.unwrap();

        assert_eq!(updated.title, "task, renamed");
        assert!(updated.completed);
        assert_eq!(tag_names(&updated), vec!["b", "c"]);
        assert_eq!(todos.get_todo(todo.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_with_empty_tags_clears_associations_only() {
        let (todos, tags) = services();
        let todo = todos.create_todo("task".into(), &names(&["a", "b"])).await.unwrap();

        let updated = todos.update_todo(todo, &[]).await.unwrap();

        assert!(updated.tags.is_empty());
        assert_eq!(tags.list_tags().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_todo_is_not_found() {
        let (todos, _) = services();
        let ghost = todos.create_todo("ghost".into(), &[]).await.unwrap();
        todos.delete_todo(ghost.id).await.unwrap();

        let err = todos.update_todo(ghost, &[]).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_remove_tag_leaves_other_associations() {
        let (todos, tags) = services();
        let todo = todos.create_todo("task".into(), &names(&["a", "b"])).await.unwrap();
        let a = todo.tags[0].clone();

        todos.remove_tag_from_todo(todo.id, a.id).await.unwrap();

        let reloaded = todos.get_todo(todo.id).await.unwrap();
        assert_eq!(tag_names(&reloaded), vec!["b"]);
        assert_eq!(tags.get_tag(a.id).await.unwrap(), a);
    }

    #[tokio::test]
    async fn test_get_and_delete_missing_todo() {
        let (todos, _) = services();
        assert!(todos.get_todo(99).await.unwrap_err().is_not_found());
        assert!(todos.delete_todo(99).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_returns_todos_with_tags() {
        let (todos, _) = services();
        todos.create_todo("first".into(), &names(&["x"])).await.unwrap();
        todos.create_todo("second".into(), &[]).await.unwrap();

        let all = todos.list_todos().await.unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(tag_names(&all[0]), vec!["x"]);
        assert!(all[1].tags.is_empty());
    }

    /// Todo writes go to `store`; tag lookups fail after `healthy_lookups`.
    fn services_with_flaky_tags(healthy_lookups: usize) -> TodoService {
        let store = MemoryStore::new();
        let tags = TagService::new(Arc::new(FlakyTags::new(store.clone(), healthy_lookups)));
        TodoService::new(Arc::new(store), tags)
    }

    #[tokio::test]
    async fn test_create_writes_no_todo_when_tag_lookup_fails() {
        let todos = services_with_flaky_tags(0);

        let err = todos.create_todo("doomed".into(), &names(&["a"])).await.unwrap_err();

        assert!(matches!(err, RepositoryError::Database(_)));
        assert!(todos.list_todos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_leaves_todo_unchanged_when_tag_lookup_fails() {
        let todos = services_with_flaky_tags(1);
        let original = todos.create_todo("keep me".into(), &names(&["a"])).await.unwrap();

        let mut edited = original.clone();
        edited.title = "changed".into();
        edited.completed = true;
        let err = todos.update_todo(edited, &names(&["a", "b"])).await.unwrap_err();

        assert!(matches!(err, RepositoryError::Database(_)));
        let reloaded = todos.get_todo(original.id).await.unwrap();
        assert_eq!(reloaded, original);
        assert_eq!(tag_names(&reloaded), vec!["a"]);
    }
}
