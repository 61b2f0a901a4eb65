use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::entities::{tag, todo};

/// A label attachable to any number of todos. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A todo item together with the tags currently associated with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i32,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<Tag>,
}

/// A todo that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub title: String,
    pub completed: bool,
    pub tags: Vec<Tag>,
}

impl From<tag::Model> for Tag {
    fn from(model: tag::Model) -> Self {
        Tag {
            id: model.id,
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl Todo {
    pub(crate) fn from_models(model: todo::Model, tags: Vec<tag::Model>) -> Self {
        let mut tags: Vec<Tag> = tags.into_iter().map(Tag::from).collect();
        tags.sort_by_key(|t| t.id);
        Todo {
            id: model.id,
            title: model.title,
            completed: model.completed,
            created_at: model.created_at,
            updated_at: model.updated_at,
            tags,
        }
    }
}

/// Tag ids in first-seen order with repeats removed. The association table
/// holds at most one row per (todo, tag) pair.
pub(crate) fn distinct_tag_ids(tags: &[Tag]) -> Vec<i32> {
    let mut ids: Vec<i32> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !ids.contains(&tag.id) {
            ids.push(tag.id);
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(id: i32, name: &str) -> Tag {
        let now = Utc::now();
        Tag {
            id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_distinct_tag_ids_keeps_first_occurrence_order() {
        let tags = vec![tag(3, "c"), tag(1, "a"), tag(3, "c"), tag(2, "b")];
        assert_eq!(distinct_tag_ids(&tags), vec![3, 1, 2]);
    }

    #[test]
    fn test_from_models_sorts_tags_by_id() {
        let now = Utc::now();
        let todo_model = todo::Model {
            id: 7,
            title: "write docs".to_string(),
            completed: false,
            created_at: now,
            updated_at: now,
        };
        let tag_models = vec![
            tag::Model { id: 5, name: "later".to_string(), created_at: now, updated_at: now },
            tag::Model { id: 2, name: "docs".to_string(), created_at: now, updated_at: now },
        ];

        let todo = Todo::from_models(todo_model, tag_models);

        assert_eq!(todo.id, 7);
        assert_eq!(todo.tags.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2, 5]);
        assert_eq!(todo.tags[0].name, "docs");
    }

    #[test]
    fn test_todo_serializes_snake_case_fields() {
        let now = Utc::now();
        let todo = Todo {
            id: 1,
            title: "t".to_string(),
            completed: true,
            created_at: now,
            updated_at: now,
            tags: vec![tag(1, "a")],
        };
        let value = serde_json::to_value(&todo).unwrap();
        assert_eq!(value["completed"], true);
        assert!(value.get("created_at").is_some());
        assert_eq!(value["tags"][0]["name"], "a");
    }
}
