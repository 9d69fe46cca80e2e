//! Loan Default Classifier API Library
//!
//! Loads a pre-trained random-forest pipeline once at startup and classifies
//! single loan applications as `Defaulted` or `Not Defaulted` over HTTP.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `core`: Request contract, inference and errors.
//! - `artifact`: Classifier capability and artifact loaders.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `forest`: JSON random-forest pipeline.
//! - `frame`: Tabular model input.
//! - `handlers`: HTTP request handlers.
//! - `models`: Feature record, decision and response models.
//! - `openapi`: OpenAPI document and Swagger UI.
//! - `server`: Router and middleware.
//! - `services`: Inference service and artifact lifecycle.
//! - `validation`: Request body coercion.

pub mod api;
pub mod core;

// Re-export primary modules for shared use in tests and other binaries
pub mod artifact;
pub mod config;
pub mod errors;
pub mod forest;
pub mod frame;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod server;
pub mod services;
pub mod validation;
