//! esa.io upstream API
//!
//! Boundary to the hosted knowledge base: the posts search call and the
//! shapes it returns.

mod client;
mod models;

pub use client::{EsaClient, UpstreamQuery};
pub use models::{Author, Post, PostsPage};

/// esa's own stylesheet, linked from rendered pages
pub const STYLESHEET: &str = "https://assets.esa.io/assets/application-860deb72f57963abb3cecce7b8070ab4e106b68cee8e3205d457110507b494f4.css";
