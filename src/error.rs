// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types.
//!
//! Each seam gets its own enum: the object store, the identity provider,
//! the dashboard services built on them, and the annotation editors.
//! The application edge works in `anyhow::Result` and turns these into
//! messages for the operator.

use std::io;
use thiserror::Error;

/// Errors from the object-storage collaborator.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The object does not exist.
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// The caller may not read or write the object.
    #[error("access denied: {bucket}/{key}")]
    AccessDenied { bucket: String, key: String },

    /// The bucket or key cannot name an object.
    #[error("invalid object key '{0}'")]
    InvalidKey(String),

    /// I/O error while talking to the store.
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stored body is not valid JSON for the expected shape.
    #[error("invalid JSON in stored object: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    /// Not-found and forbidden are both read as "stage not reached yet".
    pub fn is_absent(&self) -> bool {
        matches!(self, StorageError::NotFound { .. } | StorageError::AccessDenied { .. })
    }
}

/// Errors from the identity collaborator and the admin gate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Authentication failed")]
    InvalidCredentials,

    #[error("Access denied. Admin privileges required.")]
    AccessDenied,

    #[error("Session token is invalid or expired")]
    InvalidToken,

    #[error("Identity provider error: {0}")]
    Provider(String),
}

/// Errors surfaced by the dashboard services.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Missing {0}")]
    MissingIdentifier(&'static str),

    #[error("Configuration missing: {0}")]
    Configuration(String),

    #[error("No preview image found. Please ensure ODM processing is complete.")]
    PreviewImageMissing,

    #[error("Invalid annotations payload: {0}")]
    InvalidPayload(String),

    #[error("{0} action not yet implemented")]
    NotImplemented(String),

    #[error("Unknown action type: {0}")]
    UnknownAction(String),

    #[error("Job submission failed: {0}")]
    Jobs(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Errors raised by editor actions. None of them end the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// A polygon needs three vertices before it can be finished or saved.
    #[error("A polygon needs at least 3 points (has {count})")]
    TooFewPolygonPoints { count: usize },

    /// Drawing is disabled until the background image has decoded.
    #[error("The image has not finished loading")]
    ImageNotLoaded,

    /// A save is already in flight.
    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("Missing {0}")]
    MissingIdentifier(&'static str),
}
