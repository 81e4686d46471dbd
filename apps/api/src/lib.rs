//! Résumé service: a schema-driven résumé model (section schemas, aggregate,
//! validator), its relational persistence with merge-on-update, and the
//! HTML rendering pipeline, exposed through an Axum API.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod pdf_client;
pub mod persistence;
pub mod render;
pub mod resume;
pub mod routes;
pub mod schema;
pub mod state;

#[cfg(test)]
mod test_support;
