//! Post-checkout receipt pipeline: image download, PDF rendering, worker

pub mod images;
pub mod renderer;
pub mod worker;

pub use renderer::{render_receipt, ReceiptContext};
pub use worker::{ReceiptJob, ReceiptWorker};
