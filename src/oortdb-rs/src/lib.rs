//! OortDb Client Library
//!
//! HTTP client for the OortDb remote vector database REST API.
//!
//! A [`Client`] is built from [`Settings`] and hands out [`Cluster`] handles
//! for document mutation and similarity search. Every remote call goes
//! through the [`Api`] trait, so tests can swap the REST backend for an
//! in-process double.

mod api;
mod client;
mod rest;

pub use api::{Api, FindOptions};
pub use client::{Client, Cluster};
pub use rest::RestApi;

pub use oortdb_core::{
    ApiImpl, ClusterInfo, DocumentBatch, GetResult, ImageAddResponse, Metadata, QueryMatch,
    QueryResult, Settings, UpdateBatch, VersionInfo, Where, WhereDocument,
};

use oortdb_core::models::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("{kind} already exists: {name}")]
    Conflict { kind: &'static str, name: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        ClientError::Validation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
