/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! FAST protocol encoder.
//!
//! A scope's presence map precedes its fields on the wire but is only known
//! once every field has been visited. Each nesting level therefore writes to
//! its own reusable buffer; on scope exit the finished presence map and the
//! payload are appended to the parent level.

use crate::config::CodecConfig;
use crate::decoder::field_at;
use crate::dictionary::Dictionary;
use crate::operators::FieldCodec;
use crate::pmap::{PresenceMap, PresenceMapStack};
use crate::stream::FastWriter;
use crate::trace::Observer;
use ironfast_core::{
    FastError, InstructionType, MessageSender, Operator, Result, SchemaError, Value,
};
use ironfast_template::{Instruction, TemplateRegistry};
use std::io::Write;
use tracing::{debug, warn};

/// FAST protocol encoder.
///
/// Owns the session dictionary and the scratch buffers reused across messages.
#[derive(Debug)]
pub struct Encoder<O = ()> {
    registry: TemplateRegistry,
    dictionary: Dictionary,
    pmaps: PresenceMapStack,
    /// One payload buffer per nesting level.
    buffers: Vec<FastWriter>,
    frame: FastWriter,
    config: CodecConfig,
    last_template_id: Option<u32>,
    observer: O,
}

impl Encoder {
    /// Creates a new encoder with the default configuration.
    ///
    /// # Arguments
    /// * `registry` - Templates this encoder can produce
    #[must_use]
    pub fn new(registry: TemplateRegistry) -> Self {
        Self::with_config(registry, CodecConfig::default())
    }

    /// Creates a new encoder with an explicit configuration.
    #[must_use]
    pub fn with_config(registry: TemplateRegistry, config: CodecConfig) -> Self {
        Self {
            registry,
            dictionary: Dictionary::new(),
            pmaps: PresenceMapStack::new(),
            buffers: vec![FastWriter::with_capacity(256)],
            frame: FastWriter::with_capacity(256),
            config,
            last_template_id: None,
            observer: (),
        }
    }
}

impl<O: Observer> Encoder<O> {
    /// Replaces the trace observer.
    #[must_use]
    pub fn with_observer<P: Observer>(self, observer: P) -> Encoder<P> {
        Encoder {
            registry: self.registry,
            dictionary: self.dictionary,
            pmaps: self.pmaps,
            buffers: self.buffers,
            frame: self.frame,
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

    /// Returns the session dictionary.
    #[must_use]
    pub const fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Returns the total capacity of the scratch buffers.
    #[must_use]
    pub fn buffer_capacity(&self) -> usize {
        self.frame.capacity() + self.buffers.iter().map(FastWriter::capacity).sum::<usize>()
    }

    /// Resets the encoder state, as on a fresh connection.
    ///
    /// Scratch buffers keep their capacity.
    pub fn reset(&mut self) {
        self.dictionary.reset();
        self.pmaps.clear();
        self.last_template_id = None;
    }

    /// Encodes one message to a byte sink.
    ///
    /// # Arguments
    /// * `sender` - Binder supplying the message values
    /// * `out` - Destination of the encoded message
    ///
    /// # Returns
    /// The number of bytes written.
    ///
    /// # Errors
    /// Returns `FastError::UnknownTemplate` if the sender's template is not
    /// registered, a value or presence error for an invalid message, or
    /// `FastError::Io` if the sink fails. Nothing is written on error and the
    /// dictionary is left as it was before the call.
    pub fn encode<S, W>(&mut self, sender: &mut S, out: &mut W) -> Result<usize>
    where
        S: MessageSender + ?Sized,
        W: Write,
    {
        self.dictionary.begin();
        let written = self
            .encode_frame(sender)
            .and_then(|template_id| {
                out.write_all(self.frame.as_bytes())?;
                Ok(template_id)
            });
        match written {
            Ok(template_id) => {
                self.dictionary.commit();
                self.last_template_id = Some(template_id);
                Ok(self.frame.len())
            }
            Err(e) => {
                self.dictionary.rollback();
                warn!(error = %e, "message not encoded");
                Err(e)
            }
        }
    }

    /// Encodes one message into a new vector.
    ///
    /// # Errors
    /// See [`Encoder::encode`].
    pub fn encode_to_vec<S>(&mut self, sender: &mut S) -> Result<Vec<u8>>
    where
        S: MessageSender + ?Sized,
    {
        let mut out = Vec::with_capacity(self.frame.capacity());
        self.encode(sender, &mut out)?;
        Ok(out)
    }

    fn encode_frame<S>(&mut self, sender: &mut S) -> Result<u32>
    where
        S: MessageSender + ?Sized,
    {
        let template_id = sender.template_id();
        let Some(template) = self.registry.get(template_id).cloned() else {
            return Err(FastError::UnknownTemplate(template_id));
        };

        self.pmaps.clear();
        self.frame.clear();
        if self.buffers.is_empty() {
            self.buffers.push(FastWriter::new());
        }
        self.buffers[0].clear();

        let mut pmap = PresenceMap::new();
        let copied = self.config.copy_template_id && self.last_template_id == Some(template_id);
        pmap.set_next_bit(!copied);
        if !copied {
            self.buffers[0].write_uint(u64::from(template_id), false);
        }
        self.observer.template(template_id);

        self.pmaps.enter(Some(pmap));
        let mut walk = Walk {
            sender: &mut *sender,
            dictionary: &mut self.dictionary,
            pmaps: &mut self.pmaps,
            buffers: &mut self.buffers,
            observer: &mut self.observer,
            config: &self.config,
            template_id,
        };
        walk.segment(template.instructions(), None, None, 0, 0)?;

        let pmap = self.pmaps.leave().unwrap_or_default();
        self.observer.presence_map(0, &pmap);
        self.frame.write_pmap(&pmap);
        self.frame.append(self.buffers[0].as_bytes());

        let bytes = self.frame.len();
        self.observer.message(template_id, bytes);
        debug!(template_id, bytes, "encoded message");
        Ok(template_id)
    }
}

/// One template traversal.
struct Walk<'e, S: ?Sized, O> {
    sender: &'e mut S,
    dictionary: &'e mut Dictionary,
    pmaps: &'e mut PresenceMapStack,
    buffers: &'e mut Vec<FastWriter>,
    observer: &'e mut O,
    config: &'e CodecConfig,
    template_id: u32,
}

impl<S, O> Walk<'_, S, O>
where
    S: MessageSender + ?Sized,
    O: Observer,
{
    /// Encodes a list of instructions into the buffer of `level`.
    fn segment(
        &mut self,
        instructions: &[Instruction],
        parent: Option<&str>,
        index: Option<usize>,
        level: usize,
        depth: usize,
    ) -> Result<()> {
        for instr in instructions {
            match instr.field_type() {
                InstructionType::Sequence => self.sequence(instr, parent, level, depth)?,
                InstructionType::Group => self.group(instr, parent, level, depth)?,
                _ => {
                    let mut field = field_at(instr, self.template_id, parent, index);
                    field.value = self.sender.value(&field)?;
                    if field.value.is_absent()
                        && instr.operator() == Operator::Constant
                        && !instr.is_optional()
                    {
                        field.value = instr.initial().clone();
                    }
                    self.observer.field(&field);
                    self.inject(instr, field.value, level)?;
                }
            }
        }
        Ok(())
    }

    fn inject(&mut self, instr: &Instruction, value: Value, level: usize) -> Result<()> {
        let pmap = self
            .pmaps
            .active_mut()
            .ok_or(FastError::InvalidPresenceMap)?;
        FieldCodec::new(&mut *self.dictionary, self.template_id).inject(
            instr,
            value,
            &mut self.buffers[level],
            pmap,
        )
    }

    fn sequence(
        &mut self,
        instr: &Instruction,
        parent: Option<&str>,
        level: usize,
        depth: usize,
    ) -> Result<()> {
        let depth = self.descend(depth)?;
        let length_instr = instr
            .sequence_length()
            .ok_or_else(|| SchemaError::MissingLength {
                name: instr.name().to_string(),
            })?;
        let field = field_at(instr, self.template_id, parent, None);
        let length = self.sender.length(&field);
        let value = match length {
            Some(n) => {
                let max = self.config.max_sequence_len;
                let n = u32::try_from(n)
                    .ok()
                    .filter(|_| n <= max)
                    .ok_or(FastError::SequenceTooLong {
                        len: u64::try_from(n).unwrap_or(u64::MAX),
                        max,
                    })?;
                Value::UInt32(n)
            }
            None => Value::Absent,
        };
        self.inject(length_instr, value, level)?;

        let Some(length) = length else {
            return Ok(());
        };
        for i in 0..length {
            let element = field_at(instr, self.template_id, parent, Some(i));
            if !self.sender.lock(&element) {
                return Err(FastError::MissingMandatoryField {
                    name: instr.name().to_string(),
                });
            }
            self.scope(instr, Some(i), level, depth)?;
            self.sender.unlock();
        }
        Ok(())
    }

    fn group(
        &mut self,
        instr: &Instruction,
        parent: Option<&str>,
        level: usize,
        depth: usize,
    ) -> Result<()> {
        let depth = self.descend(depth)?;
        let field = field_at(instr, self.template_id, parent, None);
        let present = self.sender.lock(&field);
        if instr.is_optional() {
            self.pmaps
                .active_mut()
                .ok_or(FastError::InvalidPresenceMap)?
                .set_next_bit(present);
        } else if !present {
            return Err(FastError::MissingMandatoryField {
                name: instr.name().to_string(),
            });
        }
        if !present {
            return Ok(());
        }
        self.scope(instr, None, level, depth)?;
        self.sender.unlock();
        Ok(())
    }

    /// Encodes the members of a group or of one sequence element.
    fn scope(
        &mut self,
        owner: &Instruction,
        index: Option<usize>,
        level: usize,
        depth: usize,
    ) -> Result<()> {
        if !owner.has_own_pmap() {
            self.pmaps.enter(None);
            self.segment(owner.members(), Some(owner.name()), index, level, depth)?;
            self.pmaps.leave();
            return Ok(());
        }

        let child = level + 1;
        while self.buffers.len() <= child {
            self.buffers.push(FastWriter::new());
        }
        self.buffers[child].clear();

        self.pmaps.enter(Some(PresenceMap::new()));
        self.segment(owner.members(), Some(owner.name()), index, child, depth)?;
        let pmap = self.pmaps.leave().unwrap_or_default();
        self.observer.presence_map(depth, &pmap);

        let (parents, children) = self.buffers.split_at_mut(child);
        let out = &mut parents[level];
        out.write_pmap(&pmap);
        out.append(children[0].as_bytes());
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
