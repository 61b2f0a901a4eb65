use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::DbErr;
use tokio::sync::Mutex;

use crate::db::entities::{tag, todo, todo_tag};
use crate::db::models::{distinct_tag_ids, NewTodo, Tag, Todo};
use crate::db::repositories::{RepositoryError, TagRepository, TodoRepository};

#[derive(Default)]
struct MemoryState {
    todos: BTreeMap<i32, todo::Model>,
    tags: BTreeMap<i32, tag::Model>,
    todo_tags: BTreeMap<(i32, i32), todo_tag::Model>,
    last_todo_id: i32,
    last_tag_id: i32,
}

impl MemoryState {
    fn todo_with_tags(&self, model: &todo::Model) -> Todo {
        let tags = self
            .todo_tags
            .range((model.id, i32::MIN)..=(model.id, i32::MAX))
            .filter_map(|((_, tag_id), _)| self.tags.get(tag_id).cloned())
            .collect();
        Todo::from_models(model.clone(), tags)
    }

    fn ensure_tags_exist(&self, tag_ids: &[i32]) -> Result<(), RepositoryError> {
        match tag_ids.iter().find(|&&id| !self.tags.contains_key(&id)) {
            Some(missing) => Err(RepositoryError::Database(DbErr::Custom(format!(
                "todo_tags references missing tag {missing}"
            )))),
            None => Ok(()),
        }
    }

    fn attach_tags(&mut self, todo_id: i32, tag_ids: &[i32]) {
        let now = Utc::now();
        for &tag_id in tag_ids {
            self.todo_tags.insert(
                (todo_id, tag_id),
                todo_tag::Model {
                    todo_id,
                    tag_id,
                    created_at: now,
                },
            );
        }
    }

    fn detach_all(&mut self, todo_id: i32) {
        self.todo_tags.retain(|(t, _), _| *t != todo_id);
    }

    fn name_taken(&self, name: &str, except_id: Option<i32>) -> bool {
        self.tags
            .values()
            .any(|t| t.name == name && Some(t.id) != except_id)
    }
}

/// In-process store. One mutex guards every table and both id counters, so
/// ids are handed out strictly increasing with no gaps or repeats.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoRepository for MemoryStore {
    async fn create(&self, new_todo: NewTodo) -> Result<Todo, RepositoryError> {
        let tag_ids = distinct_tag_ids(&new_todo.tags);
        let mut state = self.state.lock().await;
        state.ensure_tags_exist(&tag_ids)?;

        state.last_todo_id += 1;
        let now = Utc::now();
        let model = todo::Model {
            id: state.last_todo_id,
            title: new_todo.title,
            completed: new_todo.completed,
            created_at: now,
            updated_at: now,
        };
        state.todos.insert(model.id, model.clone());
        state.attach_tags(model.id, &tag_ids);
        Ok(state.todo_with_tags(&model))
    }

    async fn find_by_id(&self, id: i32) -> Result<Todo, RepositoryError> {
        let state = self.state.lock().await;
        state
            .todos
            .get(&id)
            .map(|model| state.todo_with_tags(model))
            .ok_or_else(|| RepositoryError::NotFound(format!("Todo {id}")))
    }

    async fn find_all(&self) -> Result<Vec<Todo>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .todos
            .values()
            .map(|model| state.todo_with_tags(model))
            .collect())
    }

    async fn update(&self, todo: Todo) -> Result<Todo, RepositoryError> {
        let tag_ids = distinct_tag_ids(&todo.tags);
        let mut state = self.state.lock().await;
        let Some(mut model) = state.todos.get(&todo.id).cloned() else {
            return Err(RepositoryError::NotFound(format!("Todo {}", todo.id)));
        };
        state.ensure_tags_exist(&tag_ids)?;

        model.title = todo.title;
        model.completed = todo.completed;
        model.updated_at = Utc::now();
        state.todos.insert(model.id, model.clone());
        state.detach_all(model.id);
        state.attach_tags(model.id, &tag_ids);
        Ok(state.todo_with_tags(&model))
    }

    async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state.todos.remove(&id).is_none() {
            return Err(RepositoryError::NotFound(format!("Todo {id}")));
        }
        state.detach_all(id);
        Ok(())
    }

    async fn remove_tag(&self, todo_id: i32, tag_id: i32) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.todo_tags.remove(&(todo_id, tag_id));
        Ok(())
    }
}

#[async_trait]
impl TagRepository for MemoryStore {
    async fn create(&self, name: &str) -> Result<Tag, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.name_taken(name, None) {
            return Err(RepositoryError::Conflict(format!(
                "A tag named '{name}' already exists."
            )));
        }

        state.last_tag_id += 1;
        let now = Utc::now();
        let model = tag::Model {
            id: state.last_tag_id,
            name: name.to_owned(),
            created_at: now,
            updated_at: now,
        };
        state.tags.insert(model.id, model.clone());
        Ok(model.into())
    }

    async fn find_by_id(&self, id: i32) -> Result<Tag, RepositoryError> {
        let state = self.state.lock().await;
        state
            .tags
            .get(&id)
            .cloned()
            .map(Tag::from)
            .ok_or_else(|| RepositoryError::NotFound(format!("Tag {id}")))
    }

    async fn find_by_name(&self, name: &str) -> Result<Tag, RepositoryError> {
        let state = self.state.lock().await;
        state
            .tags
            .values()
            .find(|t| t.name == name)
            .cloned()
            .map(Tag::from)
            .ok_or_else(|| RepositoryError::NotFound(format!("Tag '{name}'")))
    }

    async fn find_all(&self) -> Result<Vec<Tag>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.tags.values().cloned().map(Tag::from).collect())
    }

    async fn update(&self, tag: Tag) -> Result<Tag, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.name_taken(&tag.name, Some(tag.id)) {
            return Err(RepositoryError::Conflict(format!(
                "A tag named '{}' already exists.",
                tag.name
            )));
        }
        let model = state
            .tags
            .get_mut(&tag.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("Tag {}", tag.id)))?;
        model.name = tag.name;
        model.updated_at = Utc::now();
        Ok(model.clone().into())
    }

    async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state.tags.remove(&id).is_none() {
            return Err(RepositoryError::NotFound(format!("Tag {id}")));
        }
        state.todo_tags.retain(|(_, tag_id), _| *tag_id != id);
        Ok(())
    }
}
