//! Format-dispatching splitter

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use super::{LineSplitter, PdfSplitter, XlsxSplitter};
use crate::domain::document::{DocumentFormat, Fragment};
use crate::domain::splitting::{FragmentSplitter, SplitError};

/// Delegates to the first registered splitter that supports the format
#[derive(Clone, Default)]
pub struct SplitterRegistry {
    splitters: Vec<Arc<dyn FragmentSplitter>>,
}

impl std::fmt::Debug for SplitterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplitterRegistry")
            .field("splitters", &self.names())
            .finish()
    }
}

impl SplitterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the PDF, XLSX and line splitters
    pub fn with_defaults() -> Self {
        Self::new()
            .register(Arc::new(PdfSplitter::new()))
            .register(Arc::new(XlsxSplitter::new()))
            .register(Arc::new(LineSplitter::new()))
    }

    pub fn register(mut self, splitter: Arc<dyn FragmentSplitter>) -> Self {
        self.splitters.push(splitter);
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.splitters.iter().map(|s| s.name()).collect()
    }

    fn find(&self, format: &DocumentFormat) -> Option<&Arc<dyn FragmentSplitter>> {
        self.splitters.iter().find(|s| s.supports(format))
    }
}

impl FragmentSplitter for SplitterRegistry {
    fn supports(&self, format: &DocumentFormat) -> bool {
        self.find(format).is_some()
    }

    fn split(
        &self,
        bytes: &Bytes,
        format: &DocumentFormat,
        max_fragment_bytes: usize,
    ) -> Result<Vec<Fragment>, SplitError> {
        let splitter = self
            .find(format)
            .ok_or_else(|| SplitError::Unsupported(format.clone()))?;

        debug!(
            splitter = splitter.name(),
            %format,
            bytes = bytes.len(),
            "Splitting document"
        );
        splitter.split(bytes, format, max_fragment_bytes)
    }

    fn name(&self) -> &'static str {
        "registry"
    }
}
