/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! FAST protocol decoder.
//!
//! This module provides decoding of FAST-encoded messages. A [`Decoder`]
//! reads the message presence map and template id, then walks the template,
//! handing every field to a [`MessageReceiver`]. Groups and sequence elements
//! open a nested presence-map scope when they declare bits of their own.

use crate::config::CodecConfig;
use crate::dictionary::Dictionary;
use crate::operators::FieldCodec;
use crate::pmap::{PresenceMap, PresenceMapStack};
use crate::stream::FastReader;
use crate::trace::Observer;
use ironfast_core::{
    FastError, Field, InstructionType, Message, MessageReceiver, Result, SchemaError, Value,
};
use ironfast_template::{Instruction, TemplateRegistry};
use std::io::Read;
use tracing::{debug, warn};

/// FAST protocol decoder.
///
/// Owns the session dictionary; decode one message at a time.
#[derive(Debug)]
pub struct Decoder<O = ()> {
    registry: TemplateRegistry,
    dictionary: Dictionary,
    pmaps: PresenceMapStack,
    config: CodecConfig,
    /// Last decoded template id, reused when the template-id bit is cleared.
    last_template_id: Option<u32>,
    observer: O,
}

impl Decoder {
    /// Creates a new decoder with the default configuration.
    ///
    /// # Arguments
    /// * `registry` - Templates this decoder understands
    #[must_use]
    pub fn new(registry: TemplateRegistry) -> Self {
        Self::with_config(registry, CodecConfig::default())
    }

    /// Creates a new decoder with an explicit configuration.
    #[must_use]
    pub fn with_config(registry: TemplateRegistry, config: CodecConfig) -> Self {
        Self {
            registry,
            dictionary: Dictionary::new(),
            pmaps: PresenceMapStack::new(),
            config,
            last_template_id: None,
            observer: (),
        }
    }
}

impl<O: Observer> Decoder<O> {
    /// Replaces the trace observer.
    #[must_use]
    pub fn with_observer<P: Observer>(self, observer: P) -> Decoder<P> {
        Decoder {
            registry: self.registry,
            dictionary: self.dictionary,
            pmaps: self.pmaps,
            config: self.config,
            last_template_id: self.last_template_id,
            observer,
        }
    }

    /// Returns the trace observer.
    #[must_use]
    pub const fn observer(&self) -> &O {
        &self.observer
    }

    /// Returns the trace observer mutably.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Returns the template registry.
    #[must_use]
    pub const fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Returns the session dictionary.
    #[must_use]
    pub const fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Resets the decoder state, as on a fresh connection.
    pub fn reset(&mut self) {
        self.dictionary.reset();
        self.pmaps.clear();
        self.last_template_id = None;
    }

    /// Wraps a byte source in a reader honouring this decoder's limits.
    #[must_use]
    pub fn reader<R: Read>(&self, inner: R) -> FastReader<R> {
        FastReader::with_config(inner, &self.config)
    }

    /// Decodes one message from a stream.
    ///
    /// # Arguments
    /// * `reader` - Message stream, positioned at a message boundary
    /// * `receiver` - Binder receiving the decoded fields
    ///
    /// # Returns
    /// The template id of the decoded message.
    ///
    /// # Errors
    /// Returns `FastError::UnknownTemplate` if the template id is not registered
    /// (the stream is left just past the template id), or any wire, dictionary,
    /// or binder error raised while decoding the fields.
    pub fn decode<R, M>(&mut self, reader: &mut FastReader<R>, receiver: &mut M) -> Result<u32>
    where
        R: Read,
        M: MessageReceiver + ?Sized,
    {
        let start = reader.consumed();
        self.decode_inner(reader, receiver).inspect_err(|e| {
            if *e == FastError::UnexpectedEof && reader.consumed() == start {
                debug!("end of stream");
            } else {
                warn!(error = %e, "message discarded");
            }
        })
    }

    /// Decodes one message from a byte slice into a [`Message`].
    ///
    /// # Returns
    /// The message and the number of bytes consumed.
    ///
    /// # Errors
    /// See [`Decoder::decode`].
    pub fn decode_message(&mut self, bytes: &[u8]) -> Result<(Message, usize)> {
        let mut reader = self.reader(bytes);
        let mut message = Message::new(0);
        self.decode(&mut reader, &mut message)?;
        message.rewind();
        Ok((message, reader.consumed()))
    }

    fn decode_inner<R, M>(&mut self, reader: &mut FastReader<R>, receiver: &mut M) -> Result<u32>
    where
        R: Read,
        M: MessageReceiver + ?Sized,
    {
        let start = reader.consumed();
        self.pmaps.clear();

        let mut pmap = reader.read_pmap()?;
        self.observer.presence_map(0, &pmap);

        let template_id = if pmap.is_next_bit_set() {
            let id = reader.read_uint(false)?.unwrap_or_default();
            u32::try_from(id).map_err(|_| FastError::IntegerOutOfRange {
                name: "TemplateId".to_string(),
                field_type: InstructionType::UInt32,
                value: i128::from(id),
            })?
        } else {
            self.last_template_id.ok_or(FastError::MissingTemplateId)?
        };

        let Some(template) = self.registry.get(template_id).cloned() else {
            return Err(FastError::UnknownTemplate(template_id));
        };
        self.last_template_id = Some(template_id);
        self.observer.template(template_id);
        receiver.set_template_id(template_id);

        self.pmaps.enter(Some(pmap));
        let mut walk = Walk {
            reader: &mut *reader,
            receiver: &mut *receiver,
            dictionary: &mut self.dictionary,
            pmaps: &mut self.pmaps,
            observer: &mut self.observer,
            config: &self.config,
            template_id,
        };
        walk.segment(template.instructions(), None, None, true, 0)?;

        let pmap = self.pmaps.leave();
        if self.config.strict && pmap.is_some_and(|p| p.has_unconsumed_bits()) {
            return Err(FastError::ExcessPresenceBits);
        }

        let bytes = reader.consumed() - start;
        self.observer.message(template_id, bytes);
        debug!(template_id, bytes, "decoded message");
        Ok(template_id)
    }
}

/// Builds the transient field handed to binders and observers.
pub(crate) fn field_at<'a>(
    instr: &'a Instruction,
    template_id: u32,
    parent: Option<&'a str>,
    index: Option<usize>,
) -> Field<'a> {
    let field = Field::new(instr.id(), instr.name(), template_id).with_parent(parent);
    match index {
        Some(index) => field.with_index(index),
        None => field,
    }
}

/// One template traversal.
struct Walk<'d, R, M: ?Sized, O> {
    reader: &'d mut FastReader<R>,
    receiver: &'d mut M,
    dictionary: &'d mut Dictionary,
    pmaps: &'d mut PresenceMapStack,
    observer: &'d mut O,
    config: &'d CodecConfig,
    template_id: u32,
}

impl<R, M, O> Walk<'_, R, M, O>
where
    R: Read,
    M: MessageReceiver + ?Sized,
    O: Observer,
{
    /// Decodes a list of instructions.
    ///
    /// `deliver` is false inside a group or element the receiver declined;
    /// the wire bytes are still consumed.
    fn segment(
        &mut self,
        instructions: &[Instruction],
        parent: Option<&str>,
        index: Option<usize>,
        deliver: bool,
        depth: usize,
    ) -> Result<()> {
        for instr in instructions {
            match instr.field_type() {
                InstructionType::Sequence => self.sequence(instr, parent, deliver, depth)?,
                InstructionType::Group => self.group(instr, parent, deliver, depth)?,
                _ => {
                    let value = self.extract(instr)?;
                    let field = field_at(instr, self.template_id, parent, index).with_value(value);
                    self.observer.field(&field);
                    if deliver {
                        self.receiver.set_value(&field)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn extract(&mut self, instr: &Instruction) -> Result<Value> {
        let pmap = self
            .pmaps
            .active_mut()
            .ok_or(FastError::InvalidPresenceMap)?;
        FieldCodec::new(&mut *self.dictionary, self.template_id).extract(
            instr,
            &mut *self.reader,
            pmap,
        )
    }

    fn sequence(
        &mut self,
        instr: &Instruction,
        parent: Option<&str>,
        deliver: bool,
        depth: usize,
    ) -> Result<()> {
        let depth = self.descend(depth)?;
        let length = instr
            .sequence_length()
            .ok_or_else(|| SchemaError::MissingLength {
                name: instr.name().to_string(),
            })?;
        let Some(length) = self.extract(length)?.as_u32() else {
            return Ok(());
        };
        let length = usize::try_from(length).unwrap_or(usize::MAX);
        if length > self.config.max_sequence_len {
            return Err(FastError::SequenceTooLong {
                len: u64::try_from(length).unwrap_or(u64::MAX),
                max: self.config.max_sequence_len,
            });
        }
        if deliver {
            let field = field_at(instr, self.template_id, parent, None);
            self.receiver.set_length(&field, length);
        }

        for i in 0..length {
            let element = field_at(instr, self.template_id, parent, Some(i));
            let locked = deliver && self.receiver.lock(&element);
            self.scope(instr, Some(i), locked, depth)?;
            if locked {
                self.receiver.unlock();
            }
        }
        Ok(())
    }

    fn group(
        &mut self,
        instr: &Instruction,
        parent: Option<&str>,
        deliver: bool,
        depth: usize,
    ) -> Result<()> {
        let depth = self.descend(depth)?;
        if instr.is_optional() {
            let present = self
                .pmaps
                .active_mut()
                .is_some_and(PresenceMap::is_next_bit_set);
            if !present {
                return Ok(());
            }
        }
        let field = field_at(instr, self.template_id, parent, None);
        let locked = deliver && self.receiver.lock(&field);
        self.scope(instr, None, locked, depth)?;
        if locked {
            self.receiver.unlock();
        }
        Ok(())
    }

    /// Decodes the members of a group or of one sequence element.
    fn scope(
        &mut self,
        owner: &Instruction,
        index: Option<usize>,
        deliver: bool,
        depth: usize,
    ) -> Result<()> {
        let own = if owner.has_own_pmap() {
            let pmap = self.reader.read_pmap()?;
            self.observer.presence_map(depth, &pmap);
            Some(pmap)
        } else {
            None
        };
        self.pmaps.enter(own);
        self.segment(owner.members(), Some(owner.name()), index, deliver, depth)?;
        let pmap = self.pmaps.leave();
        if self.config.strict && pmap.is_some_and(|p| p.has_unconsumed_bits()) {
            return Err(FastError::ExcessPresenceBits);
        }
        Ok(())
    }

    fn descend(&self, depth: usize) -> Result<usize> {
        let depth = depth + 1;
        if depth > self.config.max_depth {
            return Err(FastError::NestingTooDeep {
                depth,
                max: self.config.max_depth,
            });
        }
        Ok(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::trace::{TraceEvent, TraceRecorder};
    use ironfast_core::{Decimal, Operator, Segment};
    use ironfast_template::Template;

    #[test]
    fn test_decode_reference_vectors() {
        let mut decoder = Decoder::new(fixtures::registry());
        for (wire, expected) in fixtures::vectors() {
            let (message, consumed) = decoder.decode_message(wire).unwrap();
            assert_eq!(message, expected, "template {}", expected.template_id());
            assert_eq!(consumed, wire.len());
        }
    }

    #[test]
    fn test_decode_done_message() {
        let mut decoder = Decoder::new(fixtures::done_registry());
        let (message, consumed) = decoder.decode_message(fixtures::DONE_WIRE).unwrap();
        assert_eq!(message, fixtures::done_message());
        assert_eq!(message.value("Time"), None);
        assert_eq!(consumed, fixtures::DONE_WIRE.len());
    }

    #[test]
    fn test_decode_stream_of_messages() {
        let mut wire = Vec::new();
        wire.extend_from_slice(fixtures::INTEGER_WIRE);
        wire.extend_from_slice(fixtures::STRING_WIRE);

        let mut decoder = Decoder::new(fixtures::registry());
        let mut reader = decoder.reader(wire.as_slice());
        let mut first = Message::new(0);
        let mut second = Message::new(0);
        assert_eq!(decoder.decode(&mut reader, &mut first).unwrap(), 5);
        assert_eq!(decoder.decode(&mut reader, &mut second).unwrap(), 4);
        assert_eq!(reader.consumed(), wire.len());
        second.rewind();
        assert_eq!(second, fixtures::string_message());
    }

    #[test]
    fn test_end_of_stream_consumes_nothing() {
        let mut decoder = Decoder::new(fixtures::registry());
        let mut reader = decoder.reader(fixtures::GROUP_WIRE);
        decoder.decode(&mut reader, &mut Message::new(0)).unwrap();

        let end = reader.consumed();
        let result = decoder.decode(&mut reader, &mut Message::new(0));
        assert_eq!(result, Err(FastError::UnexpectedEof));
        assert_eq!(reader.consumed(), end);

        // a message cut short is a discard, not a clean end
        let mut reader = decoder.reader(&fixtures::GROUP_WIRE[..3]);
        let result = decoder.decode(&mut reader, &mut Message::new(0));
        assert_eq!(result, Err(FastError::UnexpectedEof));
        assert_eq!(reader.consumed(), 3);
    }

    #[test]
    fn test_unknown_template() {
        let mut decoder = Decoder::new(fixtures::registry());
        // template 999, followed by bytes that must not be read
        let wire = [0xC0, 0x07, 0xE7, 0x81, 0x82];
        let mut reader = decoder.reader(&wire[..]);
        let result = decoder.decode(&mut reader, &mut Message::new(0));
        assert_eq!(result, Err(FastError::UnknownTemplate(999)));
        assert!(result.unwrap_err().is_message_discard());
        assert_eq!(reader.consumed(), 3);
    }

    #[test]
    fn test_missing_template_id() {
        let mut decoder = Decoder::new(fixtures::registry());
        assert_eq!(
            decoder.decode_message(&[0x80]).unwrap_err(),
            FastError::MissingTemplateId
        );
    }

    #[test]
    fn test_template_id_copied_from_previous_message() {
        let mut decoder = Decoder::new(fixtures::registry());
        decoder.decode_message(fixtures::BYTE_VECTOR_WIRE).unwrap();

        let (message, _) = decoder.decode_message(&[0x80, 0x81, 0xAA, 0x80]).unwrap();
        assert_eq!(message.template_id(), 3);
        assert_eq!(
            message.value("MandatoryVector"),
            Some(&Value::from(vec![0xAAu8]))
        );
        assert_eq!(message.value("OptionalVector"), None);
    }

    #[test]
    fn test_truncated_message() {
        let mut decoder = Decoder::new(fixtures::registry());
        let wire = &fixtures::INTEGER_WIRE[..10];
        assert_eq!(
            decoder.decode_message(wire).unwrap_err(),
            FastError::UnexpectedEof
        );
    }

    #[test]
    fn test_excess_presence_bits() {
        // template 5 declares only the template-id bit
        let mut wire = fixtures::INTEGER_WIRE.to_vec();
        wire[0] = 0xE0;

        let mut strict = Decoder::new(fixtures::registry());
        assert_eq!(
            strict.decode_message(&wire).unwrap_err(),
            FastError::ExcessPresenceBits
        );

        let mut lenient =
            Decoder::with_config(fixtures::registry(), CodecConfig::new().with_strict(false));
        let (message, _) = lenient.decode_message(&wire).unwrap();
        assert_eq!(message, fixtures::integer_message());
    }

    #[test]
    fn test_nesting_too_deep() {
        let config = CodecConfig::new().with_max_depth(1);
        let mut decoder = Decoder::with_config(fixtures::registry(), config);
        assert_eq!(
            decoder.decode_message(fixtures::GROUP_WIRE).unwrap_err(),
            FastError::NestingTooDeep { depth: 2, max: 1 }
        );
    }

    #[test]
    fn test_sequence_too_long() {
        let config = CodecConfig::new().with_max_sequence_len(1);
        let mut decoder = Decoder::with_config(fixtures::registry(), config);
        assert_eq!(
            decoder.decode_message(fixtures::SEQUENCE_WIRE).unwrap_err(),
            FastError::SequenceTooLong { len: 2, max: 1 }
        );
    }

    /// Receiver that declines every group and element.
    #[derive(Default)]
    struct Flat {
        values: Vec<(String, Value)>,
        lengths: Vec<usize>,
    }

    impl MessageReceiver for Flat {
        fn set_template_id(&mut self, _template_id: u32) {}

        fn set_value(&mut self, field: &Field<'_>) -> Result<()> {
            self.values
                .push((field.name.to_string(), field.value.clone()));
            Ok(())
        }

        fn set_length(&mut self, _field: &Field<'_>, length: usize) {
            self.lengths.push(length);
        }

        fn lock(&mut self, _field: &Field<'_>) -> bool {
            false
        }

        fn unlock(&mut self) {}
    }

    #[test]
    fn test_declined_scopes_still_consume_bytes() {
        let mut decoder = Decoder::new(fixtures::registry());
        let mut receiver = Flat::default();
        let mut reader = decoder.reader(fixtures::SEQUENCE_WIRE);
        decoder.decode(&mut reader, &mut receiver).unwrap();

        assert_eq!(reader.consumed(), fixtures::SEQUENCE_WIRE.len());
        assert_eq!(receiver.values, vec![("TestData".to_string(), Value::UInt32(1))]);
        assert_eq!(receiver.lengths, vec![1]);
    }

    #[test]
    fn test_copy_operator_across_messages() {
        let template = Template::new(
            10,
            "Quote",
            vec![
                Instruction::ascii(55, "Symbol").with_operator(Operator::Copy),
                Instruction::uint32(34, "SeqNum").with_operator(Operator::Increment),
                Instruction::decimal(270, "Px").with_operator(Operator::Delta),
            ],
        )
        .unwrap();
        let registry = TemplateRegistry::from_templates([template]).unwrap();
        let mut decoder = Decoder::new(registry);

        // Symbol "AB", SeqNum 7, Px 1.5
        let first = [0xF0, 0x8A, 0x41, 0xC2, 0x87, 0xFF, 0x8F];
        // copied template id and Symbol, incremented SeqNum, Px +0.1
        let second = [0x80, 0x80, 0x81];
        let (message, _) = decoder.decode_message(&first).unwrap();
        assert_eq!(message.value("Px"), Some(&Value::Decimal(Decimal::new(15, -1))));

        let (message, _) = decoder.decode_message(&second).unwrap();
        let expected = Message::new(10)
            .with_value("Symbol", "AB")
            .with_value("SeqNum", 8u32)
            .with_value("Px", Decimal::new(16, -1));
        assert_eq!(message, expected);

        decoder.reset();
        assert!(decoder.dictionary().is_empty());
        assert_eq!(
            decoder.decode_message(&second).unwrap_err(),
            FastError::MissingTemplateId
        );
    }

    #[test]
    fn test_observer_sees_decode() {
        let mut decoder = Decoder::new(fixtures::registry()).with_observer(TraceRecorder::new());
        decoder.decode_message(fixtures::GROUP_WIRE).unwrap();

        let events = decoder.observer_mut().take();
        assert_eq!(events.first(), Some(&TraceEvent::PresenceMap {
            depth: 0,
            bits: "1100000".to_string()
        }));
        assert!(events.contains(&TraceEvent::Template(6)));
        assert!(events.contains(&TraceEvent::Field {
            name: "InnerTestData".to_string(),
            value: Value::UInt32(3)
        }));
        assert_eq!(events.last(), Some(&TraceEvent::Message {
            template_id: 6,
            bytes: 5
        }));
    }

    #[test]
    fn test_decode_nested_group_without_inner() {
        let mut decoder = Decoder::new(fixtures::registry());
        let (message, consumed) = decoder.decode_message(&[0xC0, 0x86, 0x81, 0x82]).unwrap();
        assert_eq!(consumed, 4);
        assert_eq!(
            message.group("OuterGroup"),
            Some(&Segment::new().with_value("OuterTestData", 2u32))
        );
    }
}
