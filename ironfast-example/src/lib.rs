/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Shared helpers for the IronFast examples.

use ironfast::prelude::*;
use tracing_subscriber::EnvFilter;

/// Template id of the incremental market-data refresh.
pub const MD_INCREMENTAL_REFRESH: u32 = 120;

/// Initializes `tracing` output, honouring `RUST_LOG` (default `info`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // a second call keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Builds the incremental-refresh template used by the examples.
///
/// # Errors
/// Returns `SchemaError` if the template is inconsistent.
pub fn market_data_registry() -> std::result::Result<TemplateRegistry, SchemaError> {
    let template = Template::new(
        MD_INCREMENTAL_REFRESH,
        "MDIncRefresh",
        vec![
            Instruction::ascii(35, "MessageType")
                .with_operator(Operator::Constant)
                .with_value("X"),
            Instruction::uint32(34, "MsgSeqNum").with_operator(Operator::Increment),
            Instruction::uint64(52, "SendingTime").with_operator(Operator::Delta),
            Instruction::sequence(
                268,
                "MDEntries",
                Instruction::length(268, "NoMDEntries"),
                vec![
                    Instruction::uint32(279, "MDUpdateAction").with_operator(Operator::Copy),
                    Instruction::ascii(55, "Symbol").with_operator(Operator::Copy),
                    Instruction::decimal(270, "MDEntryPx").with_operator(Operator::Delta),
                    Instruction::int64(271, "MDEntrySize").with_operator(Operator::Delta),
                    Instruction::ascii(278, "MDEntryID")
                        .with_operator(Operator::Tail)
                        .optional(),
                ],
            ),
        ],
    )?;
    TemplateRegistry::from_templates([template])
}

/// One price level update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    /// 0 new, 1 change, 2 delete.
    pub action: u32,
    /// Instrument symbol.
    pub symbol: String,
    /// Price.
    pub price: Decimal,
    /// Quantity.
    pub size: i64,
    /// Entry id, if assigned.
    pub entry_id: Option<String>,
}

impl Tick {
    fn to_segment(&self) -> Segment {
        Segment::new()
            .with_value("MDUpdateAction", self.action)
            .with_value("Symbol", self.symbol.as_str())
            .with_value("MDEntryPx", self.price)
            .with_value("MDEntrySize", self.size)
            .with_value("MDEntryID", self.entry_id.as_deref())
    }
}

/// Builds an incremental-refresh message.
#[must_use]
pub fn refresh_message(seq_num: u32, sending_time: u64, ticks: &[Tick]) -> Message {
    Message::new(MD_INCREMENTAL_REFRESH)
        .with_value("MessageType", "X")
        .with_value("MsgSeqNum", seq_num)
        .with_value("SendingTime", sending_time)
        .with_sequence("MDEntries", ticks.iter().map(Tick::to_segment).collect())
}

/// Receiver decoding refresh messages straight into [`Tick`]s.
#[derive(Debug, Default)]
pub struct TickReceiver {
    /// Sequence number of the last message.
    pub seq_num: u32,
    /// Ticks of the last message.
    pub ticks: Vec<Tick>,
    in_entry: Option<usize>,
}

impl TickReceiver {
    /// Clears the ticks before the next message.
    pub fn clear(&mut self) {
        self.ticks.clear();
        self.in_entry = None;
    }
}

impl MessageReceiver for TickReceiver {
    fn set_template_id(&mut self, _template_id: u32) {}

    fn set_value(&mut self, field: &Field<'_>) -> Result<()> {
        let Some(tick) = self.in_entry.and_then(|i| self.ticks.get_mut(i)) else {
            if field.name == "MsgSeqNum" {
                self.seq_num = field.value.as_u32().unwrap_or_default();
            }
            return Ok(());
        };
        match field.name {
            "MDUpdateAction" => tick.action = field.value.as_u32().unwrap_or_default(),
            "Symbol" => tick.symbol = field.value.as_str().unwrap_or_default().to_string(),
            "MDEntryPx" => tick.price = field.value.as_decimal().unwrap_or_default(),
            "MDEntrySize" => tick.size = field.value.as_i64().unwrap_or_default(),
            "MDEntryID" => tick.entry_id = field.value.as_str().map(str::to_string),
            _ => {}
        }
        Ok(())
    }

    fn set_length(&mut self, field: &Field<'_>, length: usize) {
        if field.name == "MDEntries" {
            self.ticks = vec![
                Tick {
                    action: 0,
                    symbol: String::new(),
                    price: Decimal::default(),
                    size: 0,
                    entry_id: None,
                };
                length
            ];
        }
    }

    fn lock(&mut self, field: &Field<'_>) -> bool {
        match (field.name, field.index) {
            ("MDEntries", Some(i)) if i < self.ticks.len() => {
                self.in_entry = Some(i);
                true
            }
            _ => false,
        }
    }

    fn unlock(&mut self) {
        self.in_entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticks() -> Vec<Tick> {
        vec![
            Tick {
                action: 0,
                symbol: "EURUSD".to_string(),
                price: Decimal::new(108_512, -5),
                size: 1_000_000,
                entry_id: Some("E000001".to_string()),
            },
            Tick {
                action: 1,
                symbol: "EURUSD".to_string(),
                price: Decimal::new(108_515, -5),
                size: 500_000,
                entry_id: None,
            },
        ]
    }

    #[test]
    fn test_tick_receiver_round_trip() {
        let registry = market_data_registry().unwrap();
        let mut encoder = Encoder::new(registry.clone());
        let mut decoder = Decoder::new(registry);

        let mut message = refresh_message(7, 1_700_000_000_000, &ticks());
        let bytes = encoder.encode_to_vec(&mut message).unwrap();

        let mut receiver = TickReceiver::default();
        let mut reader = decoder.reader(bytes.as_slice());
        decoder.decode(&mut reader, &mut receiver).unwrap();
        assert_eq!(receiver.seq_num, 7);
        assert_eq!(receiver.ticks, ticks());
    }
}
