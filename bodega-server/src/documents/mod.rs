//! PDF document generation
//!
//! Receipts are rendered to uniquely named files in the temp dir and
//! handed to the notification pipeline by path. The renderer never
//! deletes its output; that belongs to the cleanup scheduler.

pub mod assets;
pub mod renderer;

use thiserror::Error;

pub use assets::AssetResolver;
pub use renderer::ReceiptRenderer;

use crate::core::TemplateFlags;

/// Which document template to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Customer receipt for a web order (the lifecycle pipeline uses this)
    OrderReceipt,
    /// Receipt for an over-the-counter sale
    SaleReceipt,
    /// End-of-day cash closure report
    CashClosure,
    /// Sample document for checking branding changes
    TemplatePreview,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderReceipt => "order_receipt",
            Self::SaleReceipt => "sale_receipt",
            Self::CashClosure => "cash_closure",
            Self::TemplatePreview => "template_preview",
        }
    }

    /// Whether this kind is enabled by configuration
    pub fn is_enabled(&self, flags: &TemplateFlags) -> bool {
        match self {
            Self::OrderReceipt => flags.order_receipt,
            Self::SaleReceipt => flags.sale_receipt,
            Self::CashClosure => flags.cash_closure,
            Self::TemplatePreview => flags.template_preview,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Document has no line items")]
    EmptyDocument,

    #[error("Template '{0}' is disabled")]
    TemplateDisabled(&'static str),

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
