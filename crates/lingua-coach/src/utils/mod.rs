//! Utilities module - text shaping and model output parsing

pub mod output_parser;
pub mod text_utils;

pub use output_parser::{Labeled, OutputParser};
pub use text_utils::TextUtils;
