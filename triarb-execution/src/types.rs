use triarb_integration::{OrderStatus, Side};
use triarb_strategy::TriangleLeg;

/// Outcome of dispatching a single leg's order.
#[derive(Debug, Clone)]
pub struct LegResult {
    pub leg: TriangleLeg,
    pub status: OrderStatus,
    pub order_id: Option<String>,
    pub filled_qty: f64,
    pub filled_price: f64,
    pub quote_qty: f64,
    pub commission: f64,
    pub commission_asset: String,
    pub error: Option<String>,
    pub latency_us: i64,
}

impl LegResult {
    pub fn is_filled(&self) -> bool {
        self.status.is_filled()
    }

    pub fn failed(leg: TriangleLeg, error: impl Into<String>, latency_us: i64) -> Self {
        Self {
            leg,
            status: OrderStatus::Rejected,
            order_id: None,
            filled_qty: 0.0,
            filled_price: 0.0,
            quote_qty: 0.0,
            commission: 0.0,
            commission_asset: String::new(),
            error: Some(error.into()),
            latency_us,
        }
    }
}

/// Overall outcome of a triangle execution, determined by how many of the
/// three legs filled: 3 -> `Success`, 0 -> `Failed`, otherwise `Partial`.
/// `Recovered` is applied after a non-`Success` outcome's stranded position
/// has been successfully liquidated back to the base currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Partial,
    Failed,
    Recovered,
}

#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub triangle_id: smol_str::SmolStr,
    pub status: ExecutionStatus,
    pub legs: [LegResult; 3],
    pub total_profit: f64,
    pub total_commission: f64,
    pub start_timestamp_us: i64,
    pub end_timestamp_us: i64,
    /// Set when the triangle was blocked before any leg was dispatched
    /// (a risk rejection); `None` once at least one leg was attempted.
    pub rejection_reason: Option<String>,
}

impl ExecutionResult {
    pub fn filled_count(&self) -> usize {
        self.legs.iter().filter(|leg| leg.is_filled()).count()
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    pub fn needs_recovery(&self) -> bool {
        !matches!(self.status, ExecutionStatus::Success)
    }

    pub fn duration_us(&self) -> i64 {
        self.end_timestamp_us - self.start_timestamp_us
    }
}

/// Classifies a leg count into an `ExecutionStatus`, per the fixed rule:
/// all three filled is success, none filled is failure, anything in between
/// is a partial fill requiring recovery.
pub fn status_from_filled_count(filled: usize) -> ExecutionStatus {
    match filled {
        3 => ExecutionStatus::Success,
        0 => ExecutionStatus::Failed,
        _ => ExecutionStatus::Partial,
    }
}

/// The amount of base currency held after the final leg: for a `Sell` leg
/// that's the quote proceeds, for a `Buy` leg the base units acquired.
fn final_base_amount(legs: &[LegResult; 3]) -> f64 {
    let last = &legs[2];
    match last.leg.side {
        Side::Sell => last.quote_qty,
        Side::Buy => last.filled_qty,
    }
}

/// `(profit, commission)` over a completed (or partially completed) triangle.
/// `profit = final_base_amount - size - commission`; commission is summed
/// raw across legs and is only currency-accurate when every leg's
/// `commission_asset` matches the triangle's base asset — otherwise it is
/// informational only, same as the executed fills it is drawn from.
pub fn settle(legs: &[LegResult; 3], size: f64) -> (f64, f64) {
    let commission: f64 = legs.iter().map(|leg| leg.commission).sum();
    let profit = final_base_amount(legs) - size - commission;
    (profit, commission)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_fill_counts() {
        assert_eq!(status_from_filled_count(3), ExecutionStatus::Success);
        assert_eq!(status_from_filled_count(0), ExecutionStatus::Failed);
        assert_eq!(status_from_filled_count(1), ExecutionStatus::Partial);
        assert_eq!(status_from_filled_count(2), ExecutionStatus::Partial);
    }
}
