use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::auth::JwtService;
use crate::checkout::CheckoutCoordinator;
use crate::core::Config;
use crate::db::models::Order;
use crate::db::Store;
use crate::notify::Notifier;
use crate::receipt::{ReceiptJob, ReceiptWorker};

/// Depth of the receipt job queue. Jobs beyond it are dropped with an
/// error log; the order itself is already committed.
const RECEIPT_QUEUE_DEPTH: usize = 64;

/// Server state - shared handles for all services
///
/// | Field | Type | Purpose |
/// |-------|------|---------|
/// | config | Config | Configuration (immutable) |
/// | store | Store | Embedded database |
/// | checkout | CheckoutCoordinator | Cart to order conversion |
/// | jwt_service | Arc<JwtService> | Token auth |
/// | receipt_tx | Sender<ReceiptJob> | Hand-off to the receipt worker |
/// | shutdown | CancellationToken | Background task shutdown |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub store: Store,
    pub checkout: CheckoutCoordinator,
    pub jwt_service: Arc<JwtService>,
    receipt_tx: mpsc::Sender<ReceiptJob>,
    pub shutdown: CancellationToken,
}

impl ServerState {
    /// Initialize state against the on-disk database
    ///
    /// # Panics
    ///
    /// Panics when the work directory or database cannot be created.
    pub fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("souk.redb");
        let store = Store::open(&db_path).expect("Failed to initialize database");

        Self::with_store(config.clone(), store)
    }

    /// Build state around an existing store and spawn the receipt worker.
    /// Tests use this with an in-memory store.
    pub fn with_store(config: Config, store: Store) -> Self {
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
        let checkout = CheckoutCoordinator::new(store.clone(), config.shipping_price);
        let shutdown = CancellationToken::new();

        let (receipt_tx, receipt_rx) = mpsc::channel(RECEIPT_QUEUE_DEPTH);
        let notifier = Notifier::from_config(&config);
        let worker = ReceiptWorker::new(config.clone(), notifier);
        tokio::spawn(worker.run(receipt_rx, shutdown.clone()));

        Self {
            config,
            store,
            checkout,
            jwt_service,
            receipt_tx,
            shutdown,
        }
    }

    /// Queue a committed order for receipt rendering and notification.
    /// Never blocks request handling; a full queue is logged and skipped.
    pub fn enqueue_receipt(&self, order: Order) {
        let number = order.number.clone();
        if let Err(e) = self.receipt_tx.try_send(ReceiptJob { order }) {
            tracing::error!(order_number = %number, error = %e, "Receipt queue rejected job");
        }
    }
}
