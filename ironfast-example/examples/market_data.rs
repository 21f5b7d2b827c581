//! FAST market data example.
//!
//! This example encodes a stream of incremental refresh messages into one
//! byte buffer, the way a feed handler would put them on the wire, then
//! decodes the stream back into typed ticks with a custom receiver.
//!
//! Run with `RUST_LOG=debug` to see per-message codec logs, or with
//! `RUST_LOG=trace` to see every decoded field and presence map.

use ironfast::prelude::*;
use ironfast_example::{Tick, TickReceiver, init_logging, market_data_registry, refresh_message};
use tracing::{info, warn};

const MESSAGES: u32 = 20;
const SYMBOLS: [&str; 3] = ["EURUSD", "GBPUSD", "USDJPY"];

fn main() -> anyhow::Result<()> {
    init_logging();

    let registry = market_data_registry()?;
    let mut encoder = Encoder::new(registry.clone());
    let mut decoder = Decoder::new(registry).with_observer(TracingObserver);

    let mut wire = Vec::new();
    let mut sent = Vec::new();
    for seq in 1..=MESSAGES {
        let ticks = generate_ticks(seq);
        let mut message = refresh_message(seq, 1_700_000_000_000 + u64::from(seq) * 250, &ticks);
        let bytes = encoder.encode(&mut message, &mut wire)?;
        info!(seq, entries = ticks.len(), bytes, "encoded refresh");
        sent.push(ticks);
    }

    let naive: usize = sent
        .iter()
        .flatten()
        .map(|t| 4 + t.symbol.len() + 8 + 4 + 8 + t.entry_id.as_ref().map_or(0, String::len))
        .sum::<usize>()
        + sent.len() * 16;
    info!(
        messages = MESSAGES,
        wire_bytes = wire.len(),
        naive_bytes = naive,
        "stream encoded"
    );

    let mut reader = decoder.reader(wire.as_slice());
    let mut receiver = TickReceiver::default();
    for expected in &sent {
        receiver.clear();
        decoder.decode(&mut reader, &mut receiver)?;
        for tick in &receiver.ticks {
            info!(
                seq = receiver.seq_num,
                symbol = %tick.symbol,
                price = %tick.price,
                size = tick.size,
                "tick"
            );
        }
        if &receiver.ticks != expected {
            warn!(seq = receiver.seq_num, "decoded ticks differ from sent ticks");
        }
    }
    info!(consumed = reader.consumed(), "stream decoded");

    Ok(())
}

/// Deterministic price walk: one to three levels per message.
fn generate_ticks(seq: u32) -> Vec<Tick> {
    let levels = 1 + (seq % 3) as usize;
    (0..levels)
        .map(|level| {
            let symbol = SYMBOLS[(seq as usize + level) % SYMBOLS.len()];
            let (base, exponent) = if symbol == "USDJPY" {
                (150_120, -3)
            } else {
                (108_500, -5)
            };
            let step = i64::from(seq) * 3 + level as i64 * 5;
            Tick {
                action: u32::from(seq > 1),
                symbol: symbol.to_string(),
                price: Decimal::new(base + step, exponent),
                size: 1_000_000 - i64::from(seq) * 10_000,
                entry_id: (level == 0).then(|| format!("E{seq:06}")),
            }
        })
        .collect()
}
