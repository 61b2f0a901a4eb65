use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, LoaderTrait, ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::debug;

use crate::db::entities::{tag, todo, todo_tag};
use crate::db::models::{distinct_tag_ids, NewTodo, Tag, Todo};
use crate::db::repositories::{
    is_unique_violation, RepositoryError, TagRepository, TodoRepository,
};

/// SeaORM-backed store. Todo writes that touch `todo_tags` run in one
/// transaction together with the todo row.
pub struct PostgresStore {
    db: DatabaseConnection,
}

impl PostgresStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load_todo(&self, model: todo::Model) -> Result<Todo, RepositoryError> {
        let tags = model
            .find_related(tag::Entity)
            .order_by_asc(tag::Column::Id)
            .all(&self.db)
            .await?;
        Ok(Todo::from_models(model, tags))
    }
}

/// Inserts one association row per tag id. Ids must already be distinct.
async fn attach_tags<C: ConnectionTrait>(
    conn: &C,
    todo_id: i32,
    tag_ids: &[i32],
) -> Result<(), DbErr> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    let now = Utc::now();
    let rows: Vec<todo_tag::ActiveModel> = tag_ids
        .iter()
        .map(|&tag_id| todo_tag::ActiveModel {
            todo_id: Set(todo_id),
            tag_id: Set(tag_id),
            created_at: Set(now),
        })
        .collect();
    todo_tag::Entity::insert_many(rows)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

fn tag_write_error(err: DbErr, name: &str) -> RepositoryError {
    if is_unique_violation(&err) {
        RepositoryError::Conflict(format!("A tag named '{name}' already exists."))
    } else {
        err.into()
    }
}

#[async_trait]
impl TodoRepository for PostgresStore {
    async fn create(&self, new_todo: NewTodo) -> Result<Todo, RepositoryError> {
        let tag_ids = distinct_tag_ids(&new_todo.tags);
        let model = self
            .db
            .transaction::<_, todo::Model, DbErr>(|txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let model = todo::ActiveModel {
                        title: Set(new_todo.title),
                        completed: Set(new_todo.completed),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;
                    attach_tags(txn, model.id, &tag_ids).await?;
                    Ok(model)
                })
            })
            .await?;
        self.load_todo(model).await
    }

    async fn find_by_id(&self, id: i32) -> Result<Todo, RepositoryError> {
        let model = todo::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Todo {id}")))?;
        self.load_todo(model).await
    }

    async fn find_all(&self) -> Result<Vec<Todo>, RepositoryError> {
        let todos = todo::Entity::find()
            .order_by_asc(todo::Column::Id)
            .all(&self.db)
            .await?;
        let tags = todos
            .load_many_to_many(tag::Entity, todo_tag::Entity, &self.db)
            .await?;
        Ok(todos
            .into_iter()
            .zip(tags)
            .map(|(model, tags)| Todo::from_models(model, tags))
            .collect())
    }

    async fn update(&self, todo: Todo) -> Result<Todo, RepositoryError> {
        let id = todo.id;
        let tag_ids = distinct_tag_ids(&todo.tags);
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    let existing = todo::Entity::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| DbErr::RecordNotFound(format!("Todo {id}")))?;
                    let mut active = existing.into_active_model();
                    active.title = Set(todo.title);
                    active.completed = Set(todo.completed);
                    active.updated_at = Set(Utc::now());
                    active.update(txn).await?;

                    todo_tag::Entity::delete_many()
                        .filter(todo_tag::Column::TodoId.eq(id))
                        .exec(txn)
                        .await?;
                    attach_tags(txn, id, &tag_ids).await?;
                    Ok(())
                })
            })
            .await?;
        TodoRepository::find_by_id(self, id).await
    }

    async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        // todo_tags rows go with it through ON DELETE CASCADE.
        let result = todo::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound(format!("Todo {id}")));
        }
        Ok(())
    }

    async fn remove_tag(&self, todo_id: i32, tag_id: i32) -> Result<(), RepositoryError> {
        let result = todo_tag::Entity::delete_many()
            .filter(todo_tag::Column::TodoId.eq(todo_id))
            .filter(todo_tag::Column::TagId.eq(tag_id))
            .exec(&self.db)
            .await?;
        debug!(todo_id, tag_id, rows = result.rows_affected, "Removed todo tag association.");
        Ok(())
    }
}

#[async_trait]
impl TagRepository for PostgresStore {
    async fn create(&self, name: &str) -> Result<Tag, RepositoryError> {
        let now = Utc::now();
        let model = tag::ActiveModel {
            name: Set(name.to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| tag_write_error(e, name))?;
        Ok(model.into())
    }

    async fn find_by_id(&self, id: i32) -> Result<Tag, RepositoryError> {
        tag::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Tag::from)
            .ok_or_else(|| RepositoryError::NotFound(format!("Tag {id}")))
    }

    async fn find_by_name(&self, name: &str) -> Result<Tag, RepositoryError> {
        tag::Entity::find()
            .filter(tag::Column::Name.eq(name))
            .one(&self.db)
            .await?
            .map(Tag::from)
            .ok_or_else(|| RepositoryError::NotFound(format!("Tag '{name}'")))
    }

    async fn find_all(&self) -> Result<Vec<Tag>, RepositoryError> {
        let tags = tag::Entity::find()
            .order_by_asc(tag::Column::Id)
            .all(&self.db)
            .await?;
        Ok(tags.into_iter().map(Tag::from).collect())
    }

    async fn update(&self, tag: Tag) -> Result<Tag, RepositoryError> {
        let existing = tag::Entity::find_by_id(tag.id)
            .one(&self.db)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Tag {}", tag.id)))?;
        let mut active = existing.into_active_model();
        active.name = Set(tag.name.clone());
        active.updated_at = Set(Utc::now());
        let model = active
            .update(&self.db)
            .await
            .map_err(|e| tag_write_error(e, &tag.name))?;
        Ok(model.into())
    }

    async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        let result = tag::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound(format!("Tag {id}")));
        }
        Ok(())
    }
}
