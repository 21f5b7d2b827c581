/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Diagnostic trace hooks.
//!
//! [`Decoder`](crate::Decoder) and [`Encoder`](crate::Encoder) are generic over an
//! [`Observer`]. The default `()` observer has empty inlined methods, so an
//! unobserved codec carries no tracing cost.

use crate::pmap::PresenceMap;
use ironfast_core::{Field, Value};

/// Receiver of codec trace points.
pub trait Observer {
    /// A message's template has been resolved.
    #[inline]
    fn template(&mut self, _template_id: u32) {}

    /// A presence map has been read (decode) or finalised (encode).
    ///
    /// # Arguments
    /// * `depth` - Scope depth, 0 for the message-level map
    /// * `pmap` - The map
    #[inline]
    fn presence_map(&mut self, _depth: usize, _pmap: &PresenceMap) {}

    /// A scalar field has been decoded or encoded.
    #[inline]
    fn field(&mut self, _field: &Field<'_>) {}

    /// A message is complete.
    ///
    /// # Arguments
    /// * `template_id` - Template of the message
    /// * `bytes` - Wire bytes consumed or produced
    #[inline]
    fn message(&mut self, _template_id: u32, _bytes: usize) {}
}

impl Observer for () {}

/// Observer emitting `tracing` events at TRACE level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn template(&mut self, template_id: u32) {
        tracing::trace!(template_id, "template");
    }

    fn presence_map(&mut self, depth: usize, pmap: &PresenceMap) {
        tracing::trace!(depth, pmap = %pmap, "presence map");
    }

    fn field(&mut self, field: &Field<'_>) {
        tracing::trace!(id = field.id, name = field.name, value = %field.value, "field");
    }

    fn message(&mut self, template_id: u32, bytes: usize) {
        tracing::trace!(template_id, bytes, "message complete");
    }
}

/// One recorded trace point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// Template resolved.
    Template(u32),
    /// Presence map read or written, rendered as bit groups.
    PresenceMap {
        /// Scope depth.
        depth: usize,
        /// Rendered bits.
        bits: String,
    },
    /// Scalar field processed.
    Field {
        /// Field name.
        name: String,
        /// Field value.
        value: Value,
    },
    /// Message complete.
    Message {
        /// Template id.
        template_id: u32,
        /// Wire bytes.
        bytes: usize,
    },
}

/// Observer collecting every trace point in memory.
#[derive(Debug, Clone, Default)]
pub struct TraceRecorder {
    events: Vec<TraceEvent>,
}

impl TraceRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Drains the recorded events.
    pub fn take(&mut self) -> Vec<TraceEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Observer for TraceRecorder {
    fn template(&mut self, template_id: u32) {
        self.events.push(TraceEvent::Template(template_id));
    }

    fn presence_map(&mut self, depth: usize, pmap: &PresenceMap) {
        self.events.push(TraceEvent::PresenceMap {
            depth,
            bits: pmap.to_string(),
        });
    }

    fn field(&mut self, field: &Field<'_>) {
        self.events.push(TraceEvent::Field {
            name: field.name.to_string(),
            value: field.value.clone(),
        });
    }

    fn message(&mut self, template_id: u32, bytes: usize) {
        self.events.push(TraceEvent::Message { template_id, bytes });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_collects_events() {
        let mut recorder = TraceRecorder::new();
        recorder.template(4);
        recorder.presence_map(0, &PresenceMap::from_wire(&[0xC0]));
        recorder.field(&Field::new(1, "MandatoryAscii", 4).with_value(Value::from("abc")));
        recorder.message(4, 16);

        assert_eq!(
            recorder.take(),
            vec![
                TraceEvent::Template(4),
                TraceEvent::PresenceMap {
                    depth: 0,
                    bits: "1000000".to_string()
                },
                TraceEvent::Field {
                    name: "MandatoryAscii".to_string(),
                    value: Value::Ascii("abc".to_string())
                },
                TraceEvent::Message {
                    template_id: 4,
                    bytes: 16
                },
            ]
        );
        assert!(recorder.events().is_empty());
    }
}
