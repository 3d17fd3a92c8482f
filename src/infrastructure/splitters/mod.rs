//! Format-specific fragment splitters

mod pdf;
mod registry;
mod text;
mod xlsx;

pub use pdf::PdfSplitter;
pub use registry::SplitterRegistry;
pub use text::LineSplitter;
pub use xlsx::XlsxSplitter;
