//! Adapters from concrete PDF libraries to the [`crate::engine`] traits

#[cfg(feature = "lopdf")]
pub mod lopdf;

#[cfg(feature = "pdfium")]
pub mod pdfium;
