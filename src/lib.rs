//! Live PDF preview for text documents.
//!
//! A [`application::session::PreviewSession`] keeps a display surface in sync
//! with the document open in a host editor, rendering it to PDF through a
//! remote service whenever the document is saved or a layout option changes.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;

mod util;
