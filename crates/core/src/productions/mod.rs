//! Per-keyword production handlers, split by concern. All handlers are
//! `impl DslParser` blocks; the dispatcher in `parser.rs` selects them.

mod directives;
mod model_items;
mod relationships;
mod styles;
mod views;
