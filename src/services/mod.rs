//! Use cases sitting between the HTTP handlers and the repositories.

pub mod tag_service;
pub mod todo_service;

#[cfg(test)]
mod test_support;

pub use tag_service::TagService;
pub use todo_service::TodoService;
