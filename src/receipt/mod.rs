//! Receipt scanning turns a photo of a receipt into a pre-filled expense.

mod draft;
mod endpoint;
mod generative;
mod parser;

pub use endpoint::{
    MAX_RECEIPT_BYTES, ReceiptState, get_scan_receipt_page, receipt_upload_limit,
    scan_receipt_endpoint,
};
pub use generative::{GenerativeReceiptConfig, GenerativeReceiptParser};
pub use parser::{
    DisabledReceiptParser, ImageType, ReceiptDraft, ReceiptImage, ReceiptParser,
};
