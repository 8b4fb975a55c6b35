use crate::bbo::Bbo;
use fnv::FnvHashMap;
use parking_lot::RwLock;
use smol_str::SmolStr;
use tracing::error;

pub type Callback = Box<dyn Fn(&SmolStr, &Bbo) + Send + Sync>;

/// O(1) per-symbol cache of the latest `Bbo`. Updates overwrite wholesale and
/// bump a monotonic counter; staleness is not tracked here, only `timestamp_us`
/// on each record. Safe to share across tasks via `Arc`.
pub struct BboCache {
    inner: RwLock<FnvHashMap<SmolStr, Bbo>>,
    callbacks: RwLock<Vec<Callback>>,
    update_count: std::sync::atomic::AtomicU64,
}

impl Default for BboCache {
    fn default() -> Self {
        Self {
            inner: RwLock::new(FnvHashMap::default()),
            callbacks: RwLock::new(Vec::new()),
            update_count: std::sync::atomic::AtomicU64::new(0),
        }
    }
}

impl BboCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback invoked synchronously, in registration order, on
    /// every `update`. A callback that panics would poison the lock, so
    /// callbacks are expected to be infallible; any `Result`-returning logic
    /// belongs to the caller, which should catch and log before registering.
    pub fn register_callback(&self, callback: Callback) {
        self.callbacks.write().push(callback);
    }

    /// Overwrites the cached `Bbo` for `symbol` and notifies all registered
    /// callbacks in order. Out-of-order `update_id`s are accepted and
    /// overwrite regardless, per the upstream feed's monotonicity guarantee.
    pub fn update(&self, symbol: SmolStr, bbo: Bbo) {
        self.inner.write().insert(symbol.clone(), bbo);
        self.update_count
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        for callback in self.callbacks.read().iter() {
            let symbol = &symbol;
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(symbol, &bbo))).is_err() {
                error!(%symbol, "BBO update callback panicked");
            }
        }
    }

    pub fn get(&self, symbol: &str) -> Option<Bbo> {
        self.inner.read().get(symbol).copied()
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.inner.read().contains_key(symbol)
    }

    pub fn has_all_symbols(&self, symbols: &[SmolStr]) -> bool {
        let guard = self.inner.read();
        symbols.iter().all(|s| guard.contains_key(s))
    }

    /// Returns `(bid, ask)` per leg for a triangle's three symbols, or `None`
    /// if any is missing. Allocation-free: fixed-size return, single read lock.
    pub fn prices_for_triangle(&self, symbols: &[SmolStr; 3]) -> Option<[(f64, f64); 3]> {
        let guard = self.inner.read();
        let b1 = guard.get(&symbols[0])?;
        let b2 = guard.get(&symbols[1])?;
        let b3 = guard.get(&symbols[2])?;
        Some([
            (b1.bid_price, b1.ask_price),
            (b2.bid_price, b2.ask_price),
            (b3.bid_price, b3.ask_price),
        ])
    }

    /// Returns the full `Bbo` per leg for a triangle's three symbols, or
    /// `None` if any is missing. Same single-read-lock, fixed-size,
    /// allocation-free shape as `prices_for_triangle`, for callers that also
    /// need quote quantities (e.g. max trade size) and not just prices.
    pub fn bbos_for_triangle(&self, symbols: &[SmolStr; 3]) -> Option<[Bbo; 3]> {
        let guard = self.inner.read();
        let b1 = *guard.get(&symbols[0])?;
        let b2 = *guard.get(&symbols[1])?;
        let b3 = *guard.get(&symbols[2])?;
        Some([b1, b2, b3])
    }

    pub fn size(&self) -> usize {
        self.inner.read().len()
    }

    pub fn update_count(&self) -> u64 {
        self.update_count.load(std::sync::atomic::Ordering::Relaxed)
    }
}
