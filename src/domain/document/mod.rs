//! Documents, questions and fragments

mod file;
mod fragment;

pub use file::{sanitize_name, DocumentFile, DocumentFormat, Question};
pub use fragment::{has_contiguous_ordinals, into_ordered_texts, Fragment, PartialResult};
