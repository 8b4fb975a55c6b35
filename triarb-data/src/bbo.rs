use crate::error::Error;
use smol_str::SmolStr;
use triarb_integration::time::now_us;
use triarb_integration::RawTick;

/// Best bid/offer snapshot for one symbol. Immutable once built; the cache
/// overwrites wholesale on every update rather than mutating fields in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbo {
    pub bid_price: f64,
    pub bid_qty: f64,
    pub ask_price: f64,
    pub ask_qty: f64,
    pub update_id: u64,
    pub timestamp_us: u64,
}

impl Bbo {
    /// Parses a wire-shape tick into a `Bbo`, stamping it with the local
    /// receive time. Returns a descriptive error on unparsable price/quantity
    /// fields rather than panicking; callers log and skip the tick.
    pub fn from_raw_tick(raw: &RawTick) -> Result<(SmolStr, Self), Error> {
        let parse = |field: &str, value: &str| -> Result<f64, Error> {
            value.parse::<f64>().map_err(|_| Error::MalformedTick {
                symbol: raw.s.clone(),
                reason: format!("field '{field}' is not a valid float: '{value}'"),
            })
        };

        let bid_price = parse("b", &raw.b)?;
        let bid_qty = parse("B", &raw.bid_qty)?;
        let ask_price = parse("a", &raw.a)?;
        let ask_qty = parse("A", &raw.ask_qty)?;

        Ok((
            SmolStr::new(&raw.s),
            Bbo {
                bid_price,
                bid_qty,
                ask_price,
                ask_qty,
                update_id: raw.u,
                timestamp_us: now_us(),
            },
        ))
    }
}
