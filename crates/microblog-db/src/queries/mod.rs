//! Query surface of [`crate::Database`], one module per component.
//!
//! Each module pairs `impl Database` methods with free functions over a
//! plain `&Connection` so several steps can share one transaction.

pub mod follows;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod users;
