mod export;
mod summary;

pub use export::{csv_string, flat_rows, ExportRow};
pub use summary::{render_summary, SummaryDocument};

/// Error raised while producing an export document. Missing or empty
/// record fields never raise this; they render as empty text or "0".
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unable to assemble summary document: {0}")]
    Pdf(#[from] printpdf::Error),
    #[error("unable to assemble flat export: {0}")]
    Csv(#[from] csv::Error),
    #[error("unable to flush export buffer: {0}")]
    Io(#[from] std::io::Error),
}
