#![forbid(unsafe_code)]

//! Test support for vbind: markup parsing into [`vbind_core::Document`]
//! and fixtures with lookup helpers.

pub mod fixture;
pub mod markup;

pub use fixture::Fixture;
pub use markup::{MarkupError, decode_entities, parse_markup};
