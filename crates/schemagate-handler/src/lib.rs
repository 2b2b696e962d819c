//! Schema handler contract and database adapters.
//!
//! The [`SchemaHandler`] trait is the capability a concrete adapter must
//! satisfy to inspect and mutate relational-database schema. One real
//! implementation ships here ([`PostgresSchemaHandler`]) along with an
//! in-memory [`MockSchemaHandler`] for tests.

pub mod diff;
pub mod handler;
pub mod mock;
pub mod options;
pub mod postgres;

pub use handler::{SchemaHandler, parse_qualified_name};
pub use mock::MockSchemaHandler;
pub use options::HandlerOptions;
pub use postgres::PostgresSchemaHandler;

pub use schemagate_core::{Error, Result};
