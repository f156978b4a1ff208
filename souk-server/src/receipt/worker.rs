//! Receipt worker
//!
//! Listens on the job channel for committed orders, downloads product
//! images, renders the receipt PDF and sends the notification emails.
//! Runs detached from request handling: checkout already returned by the
//! time a job is processed, and nothing here can fail an order.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::Config;
use crate::db::models::Order;
use crate::notify::Notifier;
use crate::receipt::images::fetch_to_jpeg;
use crate::receipt::renderer::{render_receipt, ReceiptContext};

/// A committed order waiting for its receipt and emails
#[derive(Debug)]
pub struct ReceiptJob {
    pub order: Order,
}

/// Receipt worker
pub struct ReceiptWorker {
    config: Config,
    notifier: Notifier,
    http: reqwest::Client,
}

impl ReceiptWorker {
    pub fn new(config: Config, notifier: Notifier) -> Self {
        Self {
            config,
            notifier,
            http: reqwest::Client::new(),
        }
    }

    /// Run the worker (blocks until the channel closes or shutdown)
    pub async fn run(self, mut job_rx: mpsc::Receiver<ReceiptJob>, shutdown: CancellationToken) {
        tracing::info!("Receipt worker started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Receipt worker received shutdown signal");
                    break;
                }
                job = job_rx.recv() => {
                    let Some(job) = job else {
                        tracing::info!("Receipt channel closed, worker stopping");
                        break;
                    };
                    self.handle_order(job.order).await;
                }
            }
        }
    }

    async fn handle_order(&self, order: Order) {
        tracing::debug!(order_number = %order.number, "Processing receipt job");

        let receipt_path = match self.render(&order).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!(
                    order_number = %order.number,
                    error = %e,
                    "Receipt rendering failed, notifying without attachment"
                );
                None
            }
        };

        self.notifier
            .order_confirmation(&order, receipt_path.as_deref())
            .await;
    }

    async fn render(&self, order: &Order) -> anyhow::Result<PathBuf> {
        let timeout = Duration::from_millis(self.config.image_fetch_timeout_ms);

        // Download images first; the temp files must outlive the render
        let mut temp_files = Vec::new();
        let mut images: HashMap<String, PathBuf> = HashMap::new();
        for item in &order.items {
            let Some(url) = &item.image else { continue };
            if images.contains_key(&item.option_id) {
                continue;
            }
            if let Some(file) = fetch_to_jpeg(&self.http, url, timeout).await {
                images.insert(item.option_id.clone(), file.path().to_path_buf());
                temp_files.push(file);
            }
        }

        let out_path = self.config.receipts_dir().join(format!("{}.pdf", order.id));
        let fonts = self.config.font_config();
        let shop_name = self.config.shop_name.clone();
        let order = order.clone();
        let render_path = out_path.clone();

        // PDF generation is CPU-bound
        tokio::task::spawn_blocking(move || {
            let ctx = ReceiptContext {
                order: &order,
                shop_name: &shop_name,
                images: &images,
                fonts,
            };
            render_receipt(&ctx, &render_path)
        })
        .await??;

        drop(temp_files);
        tracing::info!(path = %out_path.display(), "Receipt rendered");
        Ok(out_path)
    }
}
