use crate::config::Config;
use chrono::Utc;
use smol_str::SmolStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Semaphore, broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use triarb_data::{BboCache, StreamIngestor};
use triarb_execution::{ExecutorConfig, Recovery, TriangleExecutor};
use triarb_instrument::SymbolCatalog;
use triarb_integration::ExchangeTransport;
use triarb_metrics::MetricsCollector;
use triarb_risk::{RiskLimits, RiskManager};
use triarb_strategy::{OpportunityDetector, ProfitCalculator, TriangleDiscovery};

/// Quote assets accepted as the middle leg of a discovered triangle,
/// alongside the configured base currency.
const SUPPORTED_QUOTE_ASSETS: &[&str] = &["USDT", "USDC", "BUSD", "BTC", "ETH", "BNB"];

/// Wires the discovery, detection, risk, and execution layers together
/// around one exchange transport, and owns the runtime loop: stream
/// ingestion, tick-driven opportunity detection, concurrent triangle
/// execution bounded by `max_concurrent_triangles`, periodic metrics
/// reporting, and graceful shutdown.
pub struct Engine<T: ExchangeTransport + 'static> {
    transport: Arc<T>,
    cache: Arc<BboCache>,
    catalog: Arc<SymbolCatalog>,
    executor: Arc<TriangleExecutor<T>>,
    metrics: Arc<MetricsCollector>,
    config: Config,
    running: Arc<AtomicBool>,
    shutdown: broadcast::Sender<()>,
}

impl<T: ExchangeTransport + 'static> Engine<T> {
    /// Fetches exchange info and the base-currency balance, discovers
    /// triangles, and constructs every downstream component. No stream
    /// connection or order is placed yet — that only happens in `run`.
    pub async fn bootstrap(transport: Arc<T>, config: Config) -> Result<Self, triarb_integration::Error> {
        let info = transport.get_exchange_info().await?;
        let base_currency = SmolStr::new(&config.base_currency);
        // Every intermediate quote asset that can appear as the middle leg
        // of a triangle rooted at `base_currency` must be accepted too, not
        // just the base currency itself, or no multi-hop path survives the
        // catalog filter.
        let quote_assets: Vec<SmolStr> = SUPPORTED_QUOTE_ASSETS
            .iter()
            .map(|q| SmolStr::new(q))
            .chain(std::iter::once(base_currency.clone()))
            .collect();
        let catalog = Arc::new(SymbolCatalog::from_exchange_info(&info, &quote_assets));

        let balance = transport.get_balance(&config.base_currency).await?;
        info!(balance, currency = %config.base_currency, "fetched starting balance");

        let cache = Arc::new(BboCache::new());

        let risk_limits = RiskLimits {
            max_position_pct: config.max_position_pct,
            max_trade_size: balance * config.max_position_pct,
            daily_loss_limit: config.daily_loss_limit,
            max_concurrent_positions: config.max_concurrent_triangles,
            max_hold_time_ms: config.max_hold_time_ms,
            ..RiskLimits::default()
        };
        let risk = Arc::new(parking_lot::Mutex::new(RiskManager::new(risk_limits, balance, Utc::now().date_naive())));

        let recovery = Recovery::new(transport.clone(), catalog.clone(), cache.clone(), base_currency.clone());
        let executor_config = ExecutorConfig {
            slippage_buffer: config.slippage_buffer,
            order_timeout_ms: config.order_timeout_ms,
            dry_run: config.dry_run,
            dry_run_fee_rate: config.fee_rate,
            use_market_orders: config.use_market_orders,
        };
        let executor =
            Arc::new(TriangleExecutor::new(transport.clone(), catalog.clone(), risk, recovery, executor_config));

        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            transport,
            cache,
            catalog,
            executor,
            metrics: Arc::new(MetricsCollector::new()),
            config,
            running: Arc::new(AtomicBool::new(true)),
            shutdown: shutdown_tx,
        })
    }

    /// A `broadcast` receiver that fires once shutdown is requested.
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown.subscribe()
    }

    /// Signals every running task to wind down. Idempotent.
    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.shutdown.send(());
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs until `request_shutdown` is called: spawns the stream ingestor,
    /// the detection loop, and the periodic reporter, then drains in-flight
    /// executions bounded by `order_timeout_ms` before returning.
    pub async fn run(&self) {
        let discovery = TriangleDiscovery::from_catalog(&self.catalog);
        let triangles = discovery.find_triangles(&self.config.base_currency, self.config.max_triangles);
        info!(count = triangles.len(), "discovered triangular paths");

        let calculator = ProfitCalculator::new(self.config.fee_rate);
        let mut detector = OpportunityDetector::new(calculator, triangles, self.config.min_profit_threshold);

        let symbols: Vec<SmolStr> = self.catalog.iter().map(|info| info.symbol.clone()).collect();
        let ingestor = StreamIngestor::new(self.transport.clone(), self.cache.clone());
        let stream_running = ingestor.running_flag();
        let stream_handles = ingestor.spawn(symbols);

        let (tick_tx, mut tick_rx) = mpsc::unbounded_channel::<SmolStr>();
        self.cache.register_callback(Box::new(move |symbol, _bbo| {
            let _ = tick_tx.send(symbol.clone());
        }));

        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_triangles as usize));
        let mut execution_handles: Vec<JoinHandle<()>> = Vec::new();

        let report_interval = Duration::from_secs(10);
        let mut reporter = tokio::time::interval(report_interval);
        let mut shutdown_rx = self.subscribe_shutdown();

        loop {
            tokio::select! {
                symbol = tick_rx.recv() => {
                    let Some(symbol) = symbol else { break };
                    let opportunities = detector.on_price_update(&symbol, &self.cache);
                    for opportunity in opportunities {
                        self.metrics.record_opportunity(opportunity.profit_pct, true);
                        execution_handles.push(self.spawn_execution(opportunity, &permits));
                    }
                }
                _ = reporter.tick() => {
                    self.metrics.report();
                }
                _ = shutdown_rx.recv() => {
                    info!("shutdown requested, draining in-flight work");
                    break;
                }
            }
        }

        // Clear the running flag first so every connection task exits on its
        // own between receive operations; aborting is only a backstop for a
        // task stuck outside that loop (e.g. mid-reconnect `sleep`).
        let stream_abort_handles: Vec<_> = stream_handles.iter().map(JoinHandle::abort_handle).collect();
        stream_running.store(false, Ordering::SeqCst);
        let stream_drain_timeout = Duration::from_secs(2);
        if tokio::time::timeout(stream_drain_timeout, futures::future::join_all(stream_handles)).await.is_err() {
            warn!("stream tasks did not wind down cooperatively in time, aborting");
            for handle in stream_abort_handles {
                handle.abort();
            }
        }

        let drain_timeout = Duration::from_millis(self.config.order_timeout_ms);
        let drain = futures::future::join_all(execution_handles);
        if tokio::time::timeout(drain_timeout, drain).await.is_err() {
            warn!("in-flight executions did not drain within order_timeout_ms");
        }
    }

    fn spawn_execution(&self, opportunity: triarb_strategy::Opportunity, permits: &Arc<Semaphore>) -> JoinHandle<()> {
        let executor = self.executor.clone();
        let metrics = self.metrics.clone();
        let permits = permits.clone();
        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire().await else { return };
            let result = executor.execute(&opportunity).await;
            let success = result.is_success();
            metrics.record_execution(success, result.total_profit, result.total_commission);
            if !success {
                error!(
                    triangle_id = %result.triangle_id,
                    status = ?result.status,
                    "triangle execution did not fully succeed"
                );
            } else {
                info!(triangle_id = %result.triangle_id, profit = result.total_profit, "triangle executed");
            }
        })
    }
}
