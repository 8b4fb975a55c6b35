use crate::calculator::ProfitCalculator;
use crate::opportunity::{Opportunity, OpportunityStats};
use crate::triangle::TrianglePath;
use fnv::FnvHashMap;
use smol_str::SmolStr;
use triarb_data::BboCache;
use triarb_integration::time::now_us;

pub const COOLDOWN_US: u64 = 100_000;
pub const DEFAULT_MAX_OPPORTUNITIES_PER_SCAN: usize = 10;

pub type OpportunityCallback = Box<dyn Fn(&Opportunity) + Send + Sync>;

/// Event-driven and periodic-scan opportunity detection over a fixed set of
/// pre-discovered triangles, indexed by symbol for O(1) tick dispatch.
pub struct OpportunityDetector {
    calculator: ProfitCalculator,
    triangles: Vec<TrianglePath>,
    symbol_index: FnvHashMap<SmolStr, Vec<usize>>,
    min_profit_threshold: f64,
    max_opportunities_per_scan: usize,
    last_emit_us: FnvHashMap<SmolStr, u64>,
    callbacks: Vec<OpportunityCallback>,
    stats: OpportunityStats,
}

impl OpportunityDetector {
    pub fn new(calculator: ProfitCalculator, triangles: Vec<TrianglePath>, min_profit_threshold: f64) -> Self {
        let mut symbol_index: FnvHashMap<SmolStr, Vec<usize>> = FnvHashMap::default();
        for (index, triangle) in triangles.iter().enumerate() {
            for symbol in triangle.symbols() {
                symbol_index.entry(symbol).or_default().push(index);
            }
        }

        Self {
            calculator,
            triangles,
            symbol_index,
            min_profit_threshold,
            max_opportunities_per_scan: DEFAULT_MAX_OPPORTUNITIES_PER_SCAN,
            last_emit_us: FnvHashMap::default(),
            callbacks: Vec::new(),
            stats: OpportunityStats::default(),
        }
    }

    pub fn with_max_opportunities_per_scan(mut self, max: usize) -> Self {
        self.max_opportunities_per_scan = max;
        self
    }

    pub fn register_callback(&mut self, callback: OpportunityCallback) {
        self.callbacks.push(callback);
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn stats(&self) -> &OpportunityStats {
        &self.stats
    }

    pub fn set_min_profit_threshold(&mut self, threshold: f64) {
        self.min_profit_threshold = threshold;
    }

    pub fn reset_stats(&mut self) {
        self.stats = OpportunityStats::default();
        self.last_emit_us.clear();
    }

    /// Hot-path entry point: called once per tick for the symbol that just
    /// updated. Cooldown-gated per triangle, capped and sorted by descending
    /// `profit_pct`.
    pub fn on_price_update(&mut self, symbol: &str, cache: &BboCache) -> Vec<Opportunity> {
        self.stats.total_scans += 1;

        let Some(indices) = self.symbol_index.get(symbol).cloned() else {
            return Vec::new();
        };

        let now = now_us();
        let mut opportunities = Vec::new();

        for index in indices {
            let triangle = &self.triangles[index];

            let last = self.last_emit_us.get(&triangle.id).copied().unwrap_or(0);
            if now.saturating_sub(last) < COOLDOWN_US {
                continue;
            }

            let symbols = triangle.symbols();
            if !cache.has_all_symbols(&symbols) {
                continue;
            }

            let Some(opportunity) = self.calculator.calculate_opportunity(triangle, cache) else {
                continue;
            };

            if opportunity.profit_pct >= self.min_profit_threshold * 100.0 {
                self.stats.record_opportunity(opportunity.profit_pct, false);
                self.last_emit_us.insert(triangle.id.clone(), now);
                self.notify_callbacks(&opportunity);
                opportunities.push(opportunity);

                if opportunities.len() >= self.max_opportunities_per_scan {
                    break;
                }
            }
        }

        opportunities.sort_by(|a, b| b.profit_pct.total_cmp(&a.profit_pct));
        opportunities
    }

    /// Full pass across every monitored triangle, ignoring cooldown. Used for
    /// initial state or periodic full scans.
    pub fn scan_all(&mut self, cache: &BboCache) -> Vec<Opportunity> {
        self.stats.total_scans += 1;
        let mut opportunities = Vec::new();

        for triangle in &self.triangles {
            let symbols = triangle.symbols();
            if !cache.has_all_symbols(&symbols) {
                continue;
            }

            let Some(opportunity) = self.calculator.calculate_opportunity(triangle, cache) else {
                continue;
            };

            if opportunity.profit_pct >= self.min_profit_threshold * 100.0 {
                self.stats.record_opportunity(opportunity.profit_pct, false);
                opportunities.push(opportunity);
            }
        }

        opportunities.sort_by(|a, b| b.profit_pct.total_cmp(&a.profit_pct));
        opportunities.truncate(self.max_opportunities_per_scan);
        opportunities
    }

    pub fn best_opportunity(&mut self, cache: &BboCache) -> Option<Opportunity> {
        self.scan_all(cache).into_iter().next()
    }

    fn notify_callbacks(&self, opportunity: &Opportunity) {
        for callback in &self.callbacks {
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(opportunity))).is_err() {
                tracing::error!(triangle_id = %opportunity.path.id, "opportunity callback panicked");
            }
        }
    }
}
