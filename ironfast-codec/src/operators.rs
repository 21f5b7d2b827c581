/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! FAST field operators.
//!
//! Operators define how field values are encoded and decoded relative to
//! previous values in the dictionary. [`FieldCodec::inject`] and
//! [`FieldCodec::extract`] are exact inverses: the encoder clears a presence
//! bit only when the decoder would infer exactly the value being sent.

use crate::dictionary::Dictionary;
use crate::pmap::PresenceMap;
use crate::stream::{FastReader, FastWriter};
use bytes::Bytes;
use ironfast_core::{Decimal, FastError, InstructionType, Operator, Result, Value};
use ironfast_template::Instruction;
use std::io::Read;

/// Per-message operator state: the session dictionary and the current template.
#[derive(Debug)]
pub struct FieldCodec<'a> {
    dictionary: &'a mut Dictionary,
    template_id: u32,
}

impl<'a> FieldCodec<'a> {
    /// Creates a field codec over a dictionary.
    ///
    /// # Arguments
    /// * `dictionary` - Session dictionary
    /// * `template_id` - Template being processed, for template-scoped entries
    #[must_use]
    pub fn new(dictionary: &'a mut Dictionary, template_id: u32) -> Self {
        Self {
            dictionary,
            template_id,
        }
    }

    #[inline]
    fn previous(&self, instr: &Instruction) -> Option<&Value> {
        debug_assert!(instr.operator().uses_dictionary());
        self.dictionary
            .load(instr.scope(), self.template_id, instr.key())
    }

    #[inline]
    fn save(&mut self, instr: &Instruction, value: Value) {
        self.dictionary
            .save(instr.scope(), self.template_id, instr.key(), value);
    }

    /// Decodes one scalar field.
    ///
    /// # Arguments
    /// * `instr` - Prepared scalar instruction
    /// * `reader` - Wire source
    /// * `pmap` - Active presence map
    ///
    /// # Errors
    /// Returns a `FastError` for malformed input, dictionary faults (D5, D6),
    /// and values that do not fit the field type.
    pub fn extract<R: Read>(
        &mut self,
        instr: &Instruction,
        reader: &mut FastReader<R>,
        pmap: &mut PresenceMap,
    ) -> Result<Value> {
        if let Some((exponent, mantissa)) = instr.split_components() {
            let Value::Int32(exponent) = self.extract(exponent, reader, pmap)? else {
                // null exponent: the whole decimal is absent and no mantissa follows
                return Ok(Value::Absent);
            };
            let mantissa = self
                .extract(mantissa, reader, pmap)?
                .as_i64()
                .ok_or_else(|| missing(instr))?;
            return Ok(Value::Decimal(Decimal::checked(
                mantissa,
                i64::from(exponent),
            )?));
        }

        let nullable = instr.is_nullable();
        let value = match instr.operator() {
            Operator::None => read_raw(instr, reader, nullable)?,
            Operator::Constant => {
                if instr.is_optional() && !pmap.is_next_bit_set() {
                    Value::Absent
                } else {
                    instr.initial().clone()
                }
            }
            Operator::Default => {
                let value = if pmap.is_next_bit_set() {
                    read_raw(instr, reader, nullable)?
                } else {
                    instr.initial().clone()
                };
                if !value.is_absent() {
                    self.save(instr, value.clone());
                }
                return Ok(value);
            }
            Operator::Copy => {
                if pmap.is_next_bit_set() {
                    read_raw(instr, reader, nullable)?
                } else {
                    copied(instr, self.previous(instr))?
                }
            }
            Operator::Increment => {
                if pmap.is_next_bit_set() {
                    read_raw(instr, reader, nullable)?
                } else {
                    incremented(instr, self.previous(instr))?
                }
            }
            Operator::Delta => match self.read_delta(instr, reader, nullable)? {
                Some(value) => value,
                // null delta leaves the dictionary untouched
                None => return Ok(Value::Absent),
            },
            Operator::Tail => {
                if pmap.is_next_bit_set() {
                    self.read_tail(instr, reader, nullable)?
                } else {
                    copied(instr, self.previous(instr))?
                }
            }
        };
        self.save(instr, value.clone());
        Ok(value)
    }

    /// Encodes one scalar field.
    ///
    /// # Arguments
    /// * `instr` - Prepared scalar instruction
    /// * `value` - Value to encode, `Value::Absent` for null
    /// * `writer` - Scope payload buffer
    /// * `pmap` - Active presence map
    ///
    /// # Errors
    /// Returns a `FastError` if the value does not match the field, a mandatory
    /// value is missing, or the operator cannot express it.
    pub fn inject(
        &mut self,
        instr: &Instruction,
        value: Value,
        writer: &mut FastWriter,
        pmap: &mut PresenceMap,
    ) -> Result<()> {
        if let Some((exponent, mantissa)) = instr.split_components() {
            return match value {
                Value::Absent if instr.is_optional() => {
                    self.inject(exponent, Value::Absent, writer, pmap)
                }
                Value::Absent => Err(missing(instr)),
                Value::Decimal(d) => {
                    let d = Decimal::checked(d.mantissa(), i64::from(d.exponent()))?;
                    self.inject(exponent, Value::Int32(d.exponent()), writer, pmap)?;
                    self.inject(mantissa, Value::Int64(d.mantissa()), writer, pmap)
                }
                other => Err(type_mismatch(instr, &other)),
            };
        }

        if !value.matches(instr.field_type()) {
            return Err(type_mismatch(instr, &value));
        }
        if value.is_absent() && !instr.is_optional() && instr.operator() != Operator::Constant {
            return Err(missing(instr));
        }

        let nullable = instr.is_nullable();
        match instr.operator() {
            Operator::None => {
                write_raw(instr, &value, writer, nullable)?;
                self.save(instr, value);
            }
            Operator::Constant => {
                if !value.is_absent() && &value != instr.initial() {
                    return Err(FastError::ConstantMismatch {
                        name: instr.name().to_string(),
                    });
                }
                let stored = if instr.is_optional() {
                    pmap.set_next_bit(!value.is_absent());
                    value
                } else {
                    instr.initial().clone()
                };
                self.save(instr, stored);
            }
            Operator::Default => {
                if &value == instr.initial() {
                    pmap.set_next_bit(false);
                } else {
                    pmap.set_next_bit(true);
                    write_raw(instr, &value, writer, nullable)?;
                }
                if !value.is_absent() {
                    self.save(instr, value);
                }
            }
            op @ (Operator::Copy | Operator::Increment | Operator::Tail) => {
                let previous = self.previous(instr);
                let inferred = match op {
                    Operator::Increment => incremented(instr, previous).ok(),
                    _ => copied(instr, previous).ok(),
                };
                if inferred.as_ref() == Some(&value) {
                    pmap.set_next_bit(false);
                } else {
                    pmap.set_next_bit(true);
                    if op == Operator::Tail {
                        self.write_tail(instr, &value, writer, nullable)?;
                    } else {
                        write_raw(instr, &value, writer, nullable)?;
                    }
                }
                self.save(instr, value);
            }
            Operator::Delta => {
                if value.is_absent() {
                    writer.write_null();
                    return Ok(());
                }
                self.write_delta(instr, &value, writer, nullable)?;
                self.save(instr, value);
            }
        }
        Ok(())
    }

    fn read_delta<R: Read>(
        &self,
        instr: &Instruction,
        reader: &mut FastReader<R>,
        nullable: bool,
    ) -> Result<Option<Value>> {
        if instr.field_type() == InstructionType::Decimal {
            let Some(exponent_delta) = reader.read_int_wide(nullable)? else {
                return Ok(None);
            };
            let mantissa_delta = reader.read_int_wide(false)?.unwrap_or_default();
            let base = delta_base(instr, self.previous(instr))?
                .as_decimal()
                .ok_or_else(|| type_mismatch(instr, &Value::Absent))?;
            let exponent = i128::from(base.exponent()) + exponent_delta;
            let mantissa = i64::try_from(i128::from(base.mantissa()) + mantissa_delta)
                .map_err(|_| FastError::IntegerOverflow)?;
            let exponent = i64::try_from(exponent).unwrap_or(i64::MAX);
            return Ok(Some(Value::Decimal(Decimal::checked(mantissa, exponent)?)));
        }

        let Some(delta) = reader.read_int_wide(nullable)? else {
            return Ok(None);
        };
        let base = delta_base(instr, self.previous(instr))?;
        let base = base
            .as_i128()
            .ok_or_else(|| type_mismatch(instr, &base))?;
        integer_value(instr, base + delta).map(Some)
    }

    fn write_delta(
        &self,
        instr: &Instruction,
        value: &Value,
        writer: &mut FastWriter,
        nullable: bool,
    ) -> Result<()> {
        let base = delta_base(instr, self.previous(instr))?;
        match (value, &base) {
            (Value::Decimal(d), Value::Decimal(b)) => {
                let d = Decimal::checked(d.mantissa(), i64::from(d.exponent()))?;
                writer.write_int(
                    i128::from(d.exponent()) - i128::from(b.exponent()),
                    nullable,
                );
                writer.write_int(i128::from(d.mantissa()) - i128::from(b.mantissa()), false);
            }
            _ => {
                let (Some(v), Some(b)) = (value.as_i128(), base.as_i128()) else {
                    return Err(type_mismatch(instr, value));
                };
                writer.write_int(v - b, nullable);
            }
        }
        Ok(())
    }

    fn read_tail<R: Read>(
        &self,
        instr: &Instruction,
        reader: &mut FastReader<R>,
        nullable: bool,
    ) -> Result<Value> {
        let tail = match instr.field_type() {
            InstructionType::AsciiString => reader.read_ascii(nullable)?.map(String::into_bytes),
            _ => reader.read_bytes(nullable)?,
        };
        let Some(tail) = tail else {
            return Ok(Value::Absent);
        };
        let base = tail_base(instr, self.previous(instr));
        let combined = if tail.len() >= base.len() {
            tail
        } else {
            let mut combined = base[..base.len() - tail.len()].to_vec();
            combined.extend_from_slice(&tail);
            combined
        };
        text_value(instr, combined)
    }

    fn write_tail(
        &self,
        instr: &Instruction,
        value: &Value,
        writer: &mut FastWriter,
        nullable: bool,
    ) -> Result<()> {
        let Some(bytes) = value.as_bytes() else {
            return write_raw(instr, value, writer, nullable);
        };
        let base = tail_base(instr, self.previous(instr));
        let tail = match bytes.len() {
            len if len > base.len() => bytes,
            len if len == base.len() => {
                let common = bytes
                    .iter()
                    .zip(base)
                    .take_while(|(a, b)| a == b)
                    .count();
                &bytes[common..]
            }
            _ => {
                return Err(FastError::InvalidTail {
                    name: instr.name().to_string(),
                });
            }
        };
        if instr.field_type() == InstructionType::AsciiString {
            check_ascii(instr, tail)?;
            writer.write_ascii(tail, nullable);
        } else {
            writer.write_bytes(tail, nullable);
        }
        Ok(())
    }
}

fn missing(instr: &Instruction) -> FastError {
    FastError::MissingMandatoryField {
        name: instr.name().to_string(),
    }
}

fn type_mismatch(instr: &Instruction, value: &Value) -> FastError {
    FastError::TypeMismatch {
        name: instr.name().to_string(),
        expected: instr.field_type(),
        actual: value.type_name(),
    }
}

/// Builds the typed integer value of a field, checking the declared width.
fn integer_value(instr: &Instruction, v: i128) -> Result<Value> {
    let out_of_range = || FastError::IntegerOutOfRange {
        name: instr.name().to_string(),
        field_type: instr.field_type(),
        value: v,
    };
    Ok(match instr.field_type() {
        InstructionType::UInt32 | InstructionType::Length => {
            Value::UInt32(u32::try_from(v).map_err(|_| out_of_range())?)
        }
        InstructionType::UInt64 => Value::UInt64(u64::try_from(v).map_err(|_| out_of_range())?),
        InstructionType::Int32 | InstructionType::Exponent => {
            Value::Int32(i32::try_from(v).map_err(|_| out_of_range())?)
        }
        InstructionType::Int64 | InstructionType::Mantissa => {
            Value::Int64(i64::try_from(v).map_err(|_| out_of_range())?)
        }
        _ => return Err(type_mismatch(instr, &Value::Int64(0))),
    })
}

fn text_value(instr: &Instruction, bytes: Vec<u8>) -> Result<Value> {
    match instr.field_type() {
        InstructionType::AsciiString => String::from_utf8(bytes)
            .map(Value::Ascii)
            .map_err(|_| FastError::InvalidString),
        InstructionType::UnicodeString => {
            String::from_utf8(bytes)
                .map(Value::Unicode)
                .map_err(|_| FastError::InvalidUtf8 {
                    name: instr.name().to_string(),
                })
        }
        _ => Ok(Value::Bytes(Bytes::from(bytes))),
    }
}

fn check_ascii(instr: &Instruction, bytes: &[u8]) -> Result<()> {
    if !bytes.is_ascii() {
        return Err(FastError::NonAsciiString {
            name: instr.name().to_string(),
        });
    }
    // a leading NUL is reserved for the empty and "\0" encodings
    if bytes.len() > 1 && bytes[0] == 0 {
        return Err(FastError::InvalidString);
    }
    Ok(())
}

fn read_raw<R: Read>(
    instr: &Instruction,
    reader: &mut FastReader<R>,
    nullable: bool,
) -> Result<Value> {
    match instr.field_type() {
        InstructionType::UInt32 | InstructionType::UInt64 | InstructionType::Length => {
            match reader.read_uint(nullable)? {
                Some(v) => integer_value(instr, i128::from(v)),
                None => Ok(Value::Absent),
            }
        }
        InstructionType::Int32
        | InstructionType::Int64
        | InstructionType::Exponent
        | InstructionType::Mantissa => match reader.read_int(nullable)? {
            Some(v) => integer_value(instr, i128::from(v)),
            None => Ok(Value::Absent),
        },
        InstructionType::AsciiString => Ok(reader
            .read_ascii(nullable)?
            .map_or(Value::Absent, Value::Ascii)),
        InstructionType::UnicodeString | InstructionType::ByteVector => {
            match reader.read_bytes(nullable)? {
                Some(bytes) => text_value(instr, bytes),
                None => Ok(Value::Absent),
            }
        }
        InstructionType::Decimal => {
            let Some(exponent) = reader.read_int(nullable)? else {
                return Ok(Value::Absent);
            };
            let mantissa = reader.read_int(false)?.unwrap_or_default();
            Ok(Value::Decimal(Decimal::checked(mantissa, exponent)?))
        }
        InstructionType::Sequence | InstructionType::Group => {
            Err(type_mismatch(instr, &Value::Absent))
        }
    }
}

fn write_raw(
    instr: &Instruction,
    value: &Value,
    writer: &mut FastWriter,
    nullable: bool,
) -> Result<()> {
    match value {
        Value::Absent if nullable => writer.write_null(),
        Value::Absent => return Err(missing(instr)),
        Value::UInt32(v) => writer.write_uint(u64::from(*v), nullable),
        Value::UInt64(v) => writer.write_uint(*v, nullable),
        Value::Int32(v) => writer.write_int(i128::from(*v), nullable),
        Value::Int64(v) => writer.write_int(i128::from(*v), nullable),
        Value::Ascii(s) => {
            check_ascii(instr, s.as_bytes())?;
            writer.write_ascii(s.as_bytes(), nullable);
        }
        Value::Unicode(s) => writer.write_bytes(s.as_bytes(), nullable),
        Value::Bytes(b) => writer.write_bytes(b, nullable),
        Value::Decimal(d) => {
            let d = Decimal::checked(d.mantissa(), i64::from(d.exponent()))?;
            writer.write_int(i128::from(d.exponent()), nullable);
            writer.write_int(i128::from(d.mantissa()), false);
        }
    }
    Ok(())
}

/// Value inferred by copy (and tail) when the presence bit is cleared.
fn copied(instr: &Instruction, previous: Option<&Value>) -> Result<Value> {
    match previous {
        Some(Value::Absent) => empty_previous(instr),
        Some(value) => Ok(value.clone()),
        None => initial_or_undefined(instr),
    }
}

/// Value inferred by increment when the presence bit is cleared.
fn incremented(instr: &Instruction, previous: Option<&Value>) -> Result<Value> {
    match previous {
        Some(Value::Absent) => empty_previous(instr),
        Some(value) => {
            let v = value
                .as_i128()
                .ok_or_else(|| type_mismatch(instr, value))?;
            integer_value(instr, v + 1)
        }
        None => initial_or_undefined(instr),
    }
}

fn empty_previous(instr: &Instruction) -> Result<Value> {
    if instr.is_optional() {
        Ok(Value::Absent)
    } else {
        Err(FastError::EmptyPreviousValue {
            key: instr.key().to_string(),
        })
    }
}

fn initial_or_undefined(instr: &Instruction) -> Result<Value> {
    match instr.initial() {
        Value::Absent if instr.is_optional() => Ok(Value::Absent),
        Value::Absent => Err(FastError::DictionaryEntryNotFound {
            key: instr.key().to_string(),
        }),
        initial => Ok(initial.clone()),
    }
}

/// Base of a delta: previous value, else the initial value, else zero.
fn delta_base(instr: &Instruction, previous: Option<&Value>) -> Result<Value> {
    match previous {
        Some(Value::Absent) => Err(FastError::EmptyPreviousValue {
            key: instr.key().to_string(),
        }),
        Some(value) => Ok(value.clone()),
        None if !instr.initial().is_absent() => Ok(instr.initial().clone()),
        None if instr.field_type() == InstructionType::Decimal => {
            Ok(Value::Decimal(Decimal::default()))
        }
        None => integer_value(instr, 0),
    }
}

/// Base of a tail: previous value if assigned and non-empty, else the initial value.
fn tail_base<'v>(instr: &'v Instruction, previous: Option<&'v Value>) -> &'v [u8] {
    match previous {
        Some(value) if !value.is_absent() => value.as_bytes().unwrap_or_default(),
        _ => instr.initial().as_bytes().unwrap_or_default(),
    }
}
