//! BlazeCSS: global CSS class extraction for editor completion and hover.
//!
//! The pipeline is: [`imports`] inlines `@import`s into one stylesheet,
//! [`style`] parses it and aggregates declarations per global class,
//! [`index`] renders the result, and [`service`] serves completion, hover
//! and panel requests from a cached [`index::ClassIndex`].

pub mod blaze_generate;
pub mod cache;
pub mod config;
pub mod error;
pub mod fs;
pub mod imports;
pub mod index;
pub mod parser;
pub mod service;
pub mod style;
pub mod watcher;

pub use error::{BlazeCssError, Result};
pub use index::ClassIndex;
pub use parser::cursor_context::{detect, CursorContext, SourceKind};
pub use service::ClassService;
