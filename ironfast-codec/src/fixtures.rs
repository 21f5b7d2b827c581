/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Reference templates and wire vectors shared by the codec tests.

use ironfast_core::{Decimal, InstructionType, Message, Operator, Segment};
use ironfast_template::{Instruction, Template, TemplateRegistry};

pub(crate) const DECIMAL_WIRE: &[u8] = &[
    0xf8, 0x81, 0xfe, 0x04, 0x83, 0xff, 0x0c, 0x8a, 0xfc, 0xa0, 0xff, 0x00, 0xef,
];
pub(crate) const SEQUENCE_WIRE: &[u8] = &[0xc0, 0x82, 0x81, 0x81, 0x82, 0x83, 0x83, 0x84];
pub(crate) const BYTE_VECTOR_WIRE: &[u8] = &[0xc0, 0x83, 0x81, 0xc1, 0x82, 0xb3];
pub(crate) const STRING_WIRE: &[u8] = &[
    0xc0, 0x84, 0x61, 0x62, 0xe3, 0x64, 0x65, 0xe6, 0x83, 0x67, 0x68, 0x69, 0x84, 0x6b, 0x6c, 0x6d,
];
pub(crate) const INTEGER_WIRE: &[u8] = &[
    0xc0, 0x85, 0x83, 0x85, 0x25, 0x20, 0x2f, 0x47, 0xfe, 0x25, 0x20, 0x2f, 0x48, 0x80, 0x85, 0x87,
    0x08, 0x23, 0x51, 0x57, 0x8d, 0x08, 0x23, 0x51, 0x57, 0x8f,
];
pub(crate) const GROUP_WIRE: &[u8] = &[0xe0, 0x86, 0x81, 0x82, 0x83];
pub(crate) const DONE_WIRE: &[u8] = &[0xc0, 0x81, 0x74, 0x65, 0x73, 0xf4, 0x80, 0x80, 0x81, 0x82];

pub(crate) fn decimal_template() -> Template {
    Template::new(
        1,
        "Decimal",
        vec![
            Instruction::decimal(1, "CopyDecimal").with_operator(Operator::Copy),
            Instruction::decimal(2, "MandatoryDecimal"),
            Instruction::decimal_split(
                3,
                "IndividualDecimal",
                Instruction::component(InstructionType::Exponent).with_operator(Operator::Copy),
                Instruction::component(InstructionType::Mantissa).with_operator(Operator::Copy),
            ),
            Instruction::decimal_split(
                4,
                "IndividualDecimalOpt",
                Instruction::component(InstructionType::Exponent),
                Instruction::component(InstructionType::Mantissa).with_operator(Operator::Delta),
            )
            .optional(),
        ],
    )
    .unwrap()
}

pub(crate) fn decimal_message() -> Message {
    Message::new(1)
        .with_value("CopyDecimal", Decimal::new(515, -2))
        .with_value("MandatoryDecimal", Decimal::new(1546, -1))
        .with_value("IndividualDecimal", Decimal::new(32, -4))
        .with_value("IndividualDecimalOpt", Decimal::new(111, -1))
}

pub(crate) fn sequence_template() -> Template {
    Template::new(
        2,
        "Sequence",
        vec![
            Instruction::uint32(1, "TestData"),
            Instruction::sequence(
                2,
                "OuterSequence",
                Instruction::length(3, "OuterSequenceLength"),
                vec![
                    Instruction::uint32(4, "OuterTestData"),
                    Instruction::sequence(
                        5,
                        "InnerSequence",
                        Instruction::length(6, "InnerSequenceLength"),
                        vec![Instruction::uint32(7, "InnerTestData")],
                    )
                    .optional(),
                ],
            ),
        ],
    )
    .unwrap()
}

pub(crate) fn sequence_message() -> Message {
    Message::new(2).with_value("TestData", 1u32).with_sequence(
        "OuterSequence",
        vec![Segment::new().with_value("OuterTestData", 2u32).with_sequence(
            "InnerSequence",
            vec![
                Segment::new().with_value("InnerTestData", 3u32),
                Segment::new().with_value("InnerTestData", 4u32),
            ],
        )],
    )
}

pub(crate) fn byte_vector_template() -> Template {
    Template::new(
        3,
        "ByteVector",
        vec![
            Instruction::byte_vector(1, "MandatoryVector"),
            Instruction::byte_vector(2, "OptionalVector").optional(),
        ],
    )
    .unwrap()
}

pub(crate) fn byte_vector_message() -> Message {
    Message::new(3)
        .with_value("MandatoryVector", vec![0xc1u8])
        .with_value("OptionalVector", vec![0xb3u8])
}

pub(crate) fn string_template() -> Template {
    Template::new(
        4,
        "String",
        vec![
            Instruction::ascii(1, "MandatoryAscii"),
            Instruction::ascii(2, "OptionalAscii").optional(),
            Instruction::unicode(3, "MandatoryUnicode"),
            Instruction::unicode(4, "OptionalUnicode").optional(),
        ],
    )
    .unwrap()
}

pub(crate) fn string_message() -> Message {
    Message::new(4)
        .with_value("MandatoryAscii", "abc")
        .with_value("OptionalAscii", "def")
        .with_value("MandatoryUnicode", ironfast_core::Value::Unicode("ghi".into()))
        .with_value("OptionalUnicode", ironfast_core::Value::Unicode("klm".into()))
}

pub(crate) fn integer_template() -> Template {
    Template::new(
        5,
        "Integer",
        vec![
            Instruction::uint32(1, "MandatoryUint32"),
            Instruction::uint32(2, "OptionalUint32").optional(),
            Instruction::uint64(3, "MandatoryUint64"),
            Instruction::uint64(4, "OptionalUint64").optional(),
            Instruction::int32(5, "MandatoryInt32"),
            Instruction::int32(6, "OptionalInt32").optional(),
            Instruction::int64(7, "MandatoryInt64"),
            Instruction::int64(8, "OptionalInt64").optional(),
        ],
    )
    .unwrap()
}

pub(crate) fn integer_message() -> Message {
    Message::new(5)
        .with_value("MandatoryUint32", 3u32)
        .with_value("OptionalUint32", 4u32)
        .with_value("MandatoryUint64", 9_999_999_998u64)
        .with_value("OptionalUint64", 9_999_999_999u64)
        .with_value("MandatoryInt32", 5i32)
        .with_value("OptionalInt32", 6i32)
        .with_value("MandatoryInt64", 2_222_222_221i64)
        .with_value("OptionalInt64", 2_222_222_222i64)
}

pub(crate) fn group_template() -> Template {
    Template::new(
        6,
        "Group",
        vec![
            Instruction::uint32(1, "TestData"),
            Instruction::group(
                2,
                "OuterGroup",
                vec![
                    Instruction::uint32(3, "OuterTestData"),
                    Instruction::group(
                        4,
                        "InnerGroup",
                        vec![Instruction::uint32(5, "InnerTestData")],
                    )
                    .optional(),
                ],
            ),
        ],
    )
    .unwrap()
}

pub(crate) fn group_message() -> Message {
    Message::new(6).with_value("TestData", 1u32).with_group(
        "OuterGroup",
        Segment::new()
            .with_value("OuterTestData", 2u32)
            .with_group("InnerGroup", Segment::new().with_value("InnerTestData", 3u32)),
    )
}

/// Templates 1 to 6 with their reference wire bytes and decoded messages.
pub(crate) fn vectors() -> Vec<(&'static [u8], Message)> {
    vec![
        (DECIMAL_WIRE, decimal_message()),
        (SEQUENCE_WIRE, sequence_message()),
        (BYTE_VECTOR_WIRE, byte_vector_message()),
        (STRING_WIRE, string_message()),
        (INTEGER_WIRE, integer_message()),
        (GROUP_WIRE, group_message()),
    ]
}

pub(crate) fn registry() -> TemplateRegistry {
    TemplateRegistry::from_templates([
        decimal_template(),
        sequence_template(),
        byte_vector_template(),
        string_template(),
        integer_template(),
        group_template(),
    ])
    .unwrap()
}

/// Template with a constant, nullable scalars, and a sequence.
pub(crate) fn done_registry() -> TemplateRegistry {
    let template = Template::new(
        1,
        "Done",
        vec![
            Instruction::ascii(15, "Type")
                .with_operator(Operator::Constant)
                .with_value("99"),
            Instruction::ascii(131, "Test").optional(),
            Instruction::uint64(20, "Time").optional(),
            Instruction::int32(271, "Equal"),
            Instruction::sequence(
                0,
                "Sequence",
                Instruction::length(146, "SeqLength"),
                vec![Instruction::uint64(38, "SomeField")],
            ),
        ],
    )
    .unwrap();
    TemplateRegistry::from_templates([template]).unwrap()
}

pub(crate) fn done_message() -> Message {
    Message::new(1)
        .with_value("Type", "99")
        .with_value("Test", "test")
        .with_value("Equal", 0i32)
        .with_sequence("Sequence", vec![Segment::new().with_value("SomeField", 2u64)])
}
