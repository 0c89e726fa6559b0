pub mod cursor_context;
