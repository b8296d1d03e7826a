//! Printable report renditions.

pub mod pdf;

use crate::Result;

/// Converts a markdown report into a downloadable document.
pub trait DocumentRenderer: Send + Sync {
    /// Render `markdown` as a PDF titled `title`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Render`](crate::AppError::Render) if the
    /// document cannot be produced.
    fn to_pdf(&self, title: &str, markdown: &str) -> Result<Vec<u8>>;
}
