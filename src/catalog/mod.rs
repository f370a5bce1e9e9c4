//! Catalog introspection: tables, columns and sample rows of a session

mod introspector;

pub use introspector::SchemaIntrospector;
