//! Schema driven ABI encoding of CSV cells.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{hex, Address, Bytes, Sign, B256, I256, U256};

use crate::{
    error::BatchError,
    schema::{parse_schema_strict, SchemaField, SchemaFieldType},
};

/// Encodes attestation payloads for one schema string.
///
/// Construction is strict: a schema with any unsupported segment cannot be
/// encoded against and fails with [`BatchError::SchemaEncoderConstruction`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaEncoder {
    schema: String,
    fields: Vec<SchemaField>,
}

impl SchemaEncoder {
    pub fn new(schema: &str) -> Result<Self, BatchError> {
        let fields = parse_schema_strict(schema)
            .map_err(|e| BatchError::SchemaEncoderConstruction(e.to_string()))?;
        Ok(Self {
            schema: schema.to_string(),
            fields,
        })
    }

    /// The raw schema string this encoder is bound to.
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    #[must_use]
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// ABI-encode one value per schema field, in declaration order.
    pub fn encode_values(&self, values: Vec<DynSolValue>) -> Result<Bytes, BatchError> {
        if values.len() != self.fields.len() {
            return Err(BatchError::SchemaEncoderConstruction(format!(
                "schema has {} fields but {} values were given",
                self.fields.len(),
                values.len()
            )));
        }
        for (field, value) in self.fields.iter().zip(&values) {
            if !field.field_type.sol_type().matches(value) {
                return Err(BatchError::RowEncoding {
                    field: field.name.clone(),
                    field_type: field.field_type.to_string(),
                    reason: "value does not match the declared type".to_string(),
                });
            }
        }
        Ok(DynSolValue::Tuple(values).abi_encode_params().into())
    }

    /// Convert the data cells of a row and encode them.
    pub fn encode_row(&self, cells: &[String]) -> Result<Bytes, BatchError> {
        let values = self
            .fields
            .iter()
            .zip(cells)
            .map(|(field, cell)| coerce_cell(field, cell))
            .collect::<Result<Vec<_>, _>>()?;
        self.encode_values(values)
    }

    /// Decode a payload produced by this encoder.
    pub fn decode(&self, data: &[u8]) -> Result<Vec<DynSolValue>, BatchError> {
        let ty = DynSolType::Tuple(self.fields.iter().map(|f| f.field_type.sol_type()).collect());
        match ty.abi_decode_params(data) {
            Ok(DynSolValue::Tuple(values)) => Ok(values),
            Ok(other) => Ok(vec![other]),
            Err(e) => Err(BatchError::RowEncoding {
                field: "*".to_string(),
                field_type: ty.sol_type_name().into_owned(),
                reason: e.to_string(),
            }),
        }
    }
}

fn strip_hex_prefix(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

/// Convert a CSV cell into the ABI value its field declares.
pub fn coerce_cell(field: &SchemaField, cell: &str) -> Result<DynSolValue, BatchError> {
    let fail = |reason: String| BatchError::RowEncoding {
        field: field.name.clone(),
        field_type: field.field_type.to_string(),
        reason,
    };
    let cell = cell.trim();
    if cell.is_empty()
        && !matches!(
            field.field_type,
            SchemaFieldType::String | SchemaFieldType::Bytes
        )
    {
        return Err(fail("empty cell".to_string()));
    }

    let value = match field.field_type {
        SchemaFieldType::Address => {
            DynSolValue::Address(cell.parse::<Address>().map_err(|e| fail(e.to_string()))?)
        }
        SchemaFieldType::Bool => match cell.to_ascii_lowercase().as_str() {
            "true" | "1" => DynSolValue::Bool(true),
            "false" | "0" => DynSolValue::Bool(false),
            _ => return Err(fail(format!("`{cell}` is not a boolean"))),
        },
        SchemaFieldType::String => DynSolValue::String(cell.to_string()),
        SchemaFieldType::Bytes => {
            DynSolValue::Bytes(hex::decode(cell).map_err(|e| fail(e.to_string()))?)
        }
        SchemaFieldType::FixedBytes(size) => {
            let bytes = hex::decode(cell).map_err(|e| fail(e.to_string()))?;
            if bytes.len() != size {
                return Err(fail(format!("expected {size} bytes, got {}", bytes.len())));
            }
            let mut word = B256::ZERO;
            word[..size].copy_from_slice(&bytes);
            DynSolValue::FixedBytes(word, size)
        }
        SchemaFieldType::Uint(bits) => {
            let value = match strip_hex_prefix(cell) {
                Some(digits) => parse_digits(digits, 16),
                None => parse_digits(cell, 10),
            }
            .map_err(fail)?;
            if value.bit_len() > bits {
                return Err(fail(format!("`{cell}` does not fit in {bits} bits")));
            }
            DynSolValue::Uint(value, bits)
        }
        SchemaFieldType::Int(bits) => {
            let (negative, unsigned) = match cell.as_bytes().first() {
                Some(b'-') => (true, &cell[1..]),
                Some(b'+') => (false, &cell[1..]),
                _ => (false, cell),
            };
            let magnitude = match strip_hex_prefix(unsigned) {
                Some(digits) => parse_digits(digits, 16),
                None => parse_digits(unsigned, 10),
            }
            .map_err(fail)?;
            let value = I256::checked_from_sign_and_abs(
                if negative { Sign::Negative } else { Sign::Positive },
                magnitude,
            )
            .filter(|value| int_fits(*value, bits))
            .ok_or_else(|| fail(format!("`{cell}` does not fit in {bits} bits")))?;
            DynSolValue::Int(value, bits)
        }
    };
    Ok(value)
}

/// Parse unsigned digits in `radix`, rejecting an empty digit string.
fn parse_digits(digits: &str, radix: u64) -> Result<U256, String> {
    if digits.is_empty() {
        return Err("missing digits".to_string());
    }
    U256::from_str_radix(digits, radix).map_err(|e| e.to_string())
}

fn int_fits(value: I256, bits: usize) -> bool {
    if bits >= 256 {
        return true;
    }
    let limit = U256::from(1u8) << (bits - 1);
    if value.is_negative() {
        value.unsigned_abs() <= limit
    } else {
        value.unsigned_abs() < limit
    }
}
