//! Core types for armature management-plane HTTP clients.
//!
//! This crate provides the foundational types shared by every configured
//! client:
//! - [`Method`] - HTTP method enum
//! - [`Request`] and [`RequestBuilder`] - HTTP request types
//! - [`Response`] - HTTP response type
//! - [`Error`] and [`Result`] - Error handling
//! - [`HttpClient`] - Core client trait for HTTP execution
//! - [`StatusCode`] - HTTP status codes (re-exported from `http` crate)
//! - [`header`] - HTTP header names (re-exported from `http` crate)

mod body;
mod client;
mod error;
mod method;
mod request;
mod response;

pub use body::{from_json, to_json};
pub use client::{HttpClient, HttpClientExt};
pub use error::{Error, Result};
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::Response;

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
