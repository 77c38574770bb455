//! Parsing of EAS schema strings into ordered, typed field lists.
//!
//! A schema string is a comma separated list of `type name` declarations, e.g.
//! `uint256 value, string note`. The resolved field list always ends with the
//! columns the CSV carries beyond the schema data: an optional `refUID` column
//! followed by the mandatory `recipient` column.

use std::{fmt, str::FromStr};

use alloy_dyn_abi::DynSolType;

use crate::{error::BatchError, layout::RowLayout};

/// Name of the reference UID column appended in refUID mode.
pub const REF_UID_FIELD: &str = "refUID";
/// Name of the recipient column, always the last one.
pub const RECIPIENT_FIELD: &str = "recipient";

/// The primitive Solidity types a schema field may declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchemaFieldType {
    Address,
    Bool,
    String,
    Bytes,
    /// `bytesN`, `1 <= N <= 32`.
    FixedBytes(usize),
    /// `uintN`, `N` a multiple of 8 up to 256.
    Uint(usize),
    /// `intN`, `N` a multiple of 8 up to 256.
    Int(usize),
}

impl SchemaFieldType {
    /// The ABI type used to encode a value of this field.
    #[must_use]
    pub fn sol_type(&self) -> DynSolType {
        match *self {
            Self::Address => DynSolType::Address,
            Self::Bool => DynSolType::Bool,
            Self::String => DynSolType::String,
            Self::Bytes => DynSolType::Bytes,
            Self::FixedBytes(size) => DynSolType::FixedBytes(size),
            Self::Uint(bits) => DynSolType::Uint(bits),
            Self::Int(bits) => DynSolType::Int(bits),
        }
    }
}

const fn valid_int_bits(bits: usize) -> bool {
    bits >= 8 && bits <= 256 && bits % 8 == 0
}

/// Error returned when a type name is not a supported primitive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsupportedType(pub String);

impl FromStr for SchemaFieldType {
    type Err = UnsupportedType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || UnsupportedType(s.to_string());
        let sized = |prefix: &str| -> Option<Result<usize, UnsupportedType>> {
            s.strip_prefix(prefix).map(|size| {
                if size.is_empty() || !size.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(unsupported());
                }
                size.parse::<usize>().map_err(|_| unsupported())
            })
        };

        match s {
            "address" => return Ok(Self::Address),
            "bool" => return Ok(Self::Bool),
            "string" => return Ok(Self::String),
            "bytes" => return Ok(Self::Bytes),
            "uint" => return Ok(Self::Uint(256)),
            "int" => return Ok(Self::Int(256)),
            _ => {}
        }

        if let Some(size) = sized("bytes") {
            let size = size?;
            return if (1..=32).contains(&size) {
                Ok(Self::FixedBytes(size))
            } else {
                Err(unsupported())
            };
        }
        if let Some(bits) = sized("uint") {
            let bits = bits?;
            return if valid_int_bits(bits) {
                Ok(Self::Uint(bits))
            } else {
                Err(unsupported())
            };
        }
        if let Some(bits) = sized("int") {
            let bits = bits?;
            return if valid_int_bits(bits) {
                Ok(Self::Int(bits))
            } else {
                Err(unsupported())
            };
        }
        Err(unsupported())
    }
}

impl fmt::Display for SchemaFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address => f.write_str("address"),
            Self::Bool => f.write_str("bool"),
            Self::String => f.write_str("string"),
            Self::Bytes => f.write_str("bytes"),
            Self::FixedBytes(size) => write!(f, "bytes{size}"),
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::Int(bits) => write!(f, "int{bits}"),
        }
    }
}

/// A single named, typed field of a schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub field_type: SchemaFieldType,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, field_type: SchemaFieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

impl fmt::Display for SchemaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field_type, self.name)
    }
}

/// The outcome of parsing a raw schema string.
///
/// Parsing is permissive: segments with an unsupported type are recorded in
/// `errors` and the remaining segments are still parsed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedSchema {
    pub fields: Vec<SchemaField>,
    pub errors: Vec<BatchError>,
}

fn parse_segment(segment: &str) -> Result<SchemaField, BatchError> {
    let segment = segment.trim();
    let invalid = |field_type: &str| BatchError::InvalidSchemaFieldType {
        segment: segment.to_string(),
        field_type: field_type.to_string(),
    };

    let mut parts = segment.split_whitespace();
    let (Some(field_type), Some(name), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid(segment.split_whitespace().next().unwrap_or_default()));
    };

    let field_type = field_type
        .parse::<SchemaFieldType>()
        .map_err(|UnsupportedType(ty)| invalid(&ty))?;
    Ok(SchemaField::new(name, field_type))
}

/// Parse a raw schema string, collecting invalid segments instead of failing.
#[must_use]
pub fn parse_schema(raw: &str) -> ParsedSchema {
    let mut parsed = ParsedSchema::default();
    if raw.trim().is_empty() {
        return parsed;
    }

    for segment in raw.split(',') {
        match parse_segment(segment) {
            Ok(field) => parsed.fields.push(field),
            Err(e) => {
                tracing::warn!(segment = segment.trim(), "{e}");
                parsed.errors.push(e);
            }
        }
    }
    parsed
}

/// Parse a raw schema string, failing on the first invalid segment.
pub fn parse_schema_strict(raw: &str) -> Result<Vec<SchemaField>, BatchError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',').map(parse_segment).collect()
}

/// The ordered field list a CSV row is validated against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSchema {
    fields: Vec<SchemaField>,
    ref_uid: bool,
    errors: Vec<BatchError>,
}

impl ResolvedSchema {
    /// All fields, trailing `refUID` and `recipient` columns included.
    #[must_use]
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// The fields encoded into the attestation payload.
    #[must_use]
    pub fn data_fields(&self) -> &[SchemaField] {
        &self.fields[..self.fields.len() - self.trailing_columns()]
    }

    /// Whether the CSV carries a reference UID column.
    #[must_use]
    pub const fn ref_uid(&self) -> bool {
        self.ref_uid
    }

    /// Invalid segments recorded while parsing the schema string.
    #[must_use]
    pub fn errors(&self) -> &[BatchError] {
        &self.errors
    }

    const fn trailing_columns(&self) -> usize {
        if self.ref_uid {
            2
        } else {
            1
        }
    }

    /// The typed row layout derived from this field list.
    #[must_use]
    pub fn layout(&self) -> RowLayout {
        RowLayout::new(self.data_fields().to_vec(), self.ref_uid)
    }
}

/// Resolve the full field list of `raw`: the parsed schema fields, a `refUID`
/// field when `ref_uid` is set, and the trailing `recipient` field.
#[must_use]
pub fn resolve_fields(raw: &str, ref_uid: bool) -> ResolvedSchema {
    let ParsedSchema { mut fields, errors } = parse_schema(raw);
    if ref_uid {
        fields.push(SchemaField::new(REF_UID_FIELD, SchemaFieldType::FixedBytes(32)));
    }
    fields.push(SchemaField::new(RECIPIENT_FIELD, SchemaFieldType::Address));

    ResolvedSchema {
        fields,
        ref_uid,
        errors,
    }
}
