//! HTTP implementation of the document store.
//!
//! Queries are sent to the content store's query endpoint,
//! `POST {host}/v{api_version}/data/query/{dataset}`, with the query text and
//! its parameters in the JSON body. The `result` member of the response is
//! returned.

mod client;

pub use client::{HttpDocumentStore, HttpDocumentStoreConfig};
