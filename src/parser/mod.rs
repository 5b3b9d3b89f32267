mod api;
pub mod ast;

pub use api::AnnotationParser;
