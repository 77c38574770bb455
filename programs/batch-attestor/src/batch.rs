//! Turning parsed CSV rows into attestation requests.
//!
//! Errors here are row-level: a row that cannot be split, encoded or resolved is
//! skipped and reported, the rest of the batch goes through.

use alloy_primitives::B256;
use eas_batch_solidity_types::eas::{AttestationRequestData, MultiAttestationRequest};
use futures::{stream, StreamExt};

use crate::{
    encoder::SchemaEncoder, error::BatchError, layout::RowLayout, recipient::RecipientResolver,
    rows::ParsedRow, schema::REF_UID_FIELD,
};

/// Default number of recipients resolved concurrently.
pub const DEFAULT_RESOLVE_CONCURRENCY: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedRow {
    pub line: u64,
    pub request: AttestationRequestData,
}

/// A row excluded from the batch and why.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: u64,
    pub error: BatchError,
}

/// The included and skipped rows of a batch, both in input order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub included: Vec<EncodedRow>,
    pub skipped: Vec<SkippedRow>,
}

impl BatchOutcome {
    #[must_use]
    pub fn requests(&self) -> Vec<AttestationRequestData> {
        self.included.iter().map(|row| row.request.clone()).collect()
    }

    /// Number of included rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.included.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }

    /// Wrap the included rows into a single request for `schema`.
    #[must_use]
    pub fn multi_request(&self, schema: B256) -> MultiAttestationRequest {
        MultiAttestationRequest {
            schema,
            data: self.requests(),
        }
    }
}

/// Parse a reference UID cell. An empty cell means "no reference".
pub fn parse_ref_uid(cell: &str) -> Result<B256, BatchError> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(B256::ZERO);
    }
    cell.parse::<B256>().map_err(|e| BatchError::RowEncoding {
        field: REF_UID_FIELD.to_string(),
        field_type: "bytes32".to_string(),
        reason: e.to_string(),
    })
}

async fn encode_one(
    row: &ParsedRow,
    layout: &RowLayout,
    encoder: &SchemaEncoder,
    revocable: bool,
    resolver: &dyn RecipientResolver,
) -> Result<AttestationRequestData, BatchError> {
    let view = layout.split(row)?;
    let data = encoder.encode_row(view.data)?;
    let ref_uid = view.ref_uid.map_or(Ok(B256::ZERO), parse_ref_uid)?;
    let recipient = resolver.resolve(view.recipient).await?;

    Ok(AttestationRequestData::new(recipient, revocable, ref_uid, data))
}

/// Encode every row, skipping the ones that fail.
///
/// Up to `concurrency` rows are in flight at once; the outcome keeps input order.
pub async fn build_batch(
    rows: &[ParsedRow],
    layout: &RowLayout,
    encoder: &SchemaEncoder,
    revocable: bool,
    resolver: &dyn RecipientResolver,
    concurrency: usize,
) -> BatchOutcome {
    let results: Vec<_> = stream::iter(rows)
        .map(|row| async move {
            let result = encode_one(row, layout, encoder, revocable, resolver).await;
            (row.line, result)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut outcome = BatchOutcome::default();
    for (line, result) in results {
        match result {
            Ok(request) => outcome.included.push(EncodedRow { line, request }),
            Err(error) => {
                tracing::warn!(line, "skipping row: {error}");
                outcome.skipped.push(SkippedRow { line, error });
            }
        }
    }

    tracing::info!(
        included = outcome.included.len(),
        skipped = outcome.skipped.len(),
        "encoded batch"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{recipient::LiteralResolver, rows::parse_rows, schema::resolve_fields};
    use alloy_primitives::{address, U256};
    use alloy_sol_types::SolValue;
    use rstest::rstest;

    const RECIPIENT: &str = "0x00000000000000000000000000000000000000aa";

    fn setup(schema: &str, ref_uid: bool) -> (RowLayout, SchemaEncoder) {
        (
            resolve_fields(schema, ref_uid).layout(),
            SchemaEncoder::new(schema).unwrap(),
        )
    }

    #[tokio::test]
    async fn includes_well_formed_rows_only() {
        let (layout, encoder) = setup("uint256 value, string note", false);
        let text = format!("42,hello,{RECIPIENT}\n42,hello\n");
        let rows = parse_rows(text.as_bytes(), false);

        let outcome = build_batch(&rows, &layout, &encoder, true, &LiteralResolver, 4).await;

        assert_eq!(outcome.len(), 1);
        let request = &outcome.included[0].request;
        assert_eq!(request.recipient, address!("0x00000000000000000000000000000000000000aa"));
        assert!(request.revocable);
        assert_eq!(request.refUID, B256::ZERO);
        assert_eq!(
            request.data.to_vec(),
            (U256::from(42), String::from("hello")).abi_encode_params()
        );

        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].line, 2);
        assert_eq!(
            outcome.skipped[0].error,
            BatchError::MalformedRow {
                expected: 3,
                found: 2
            }
        );
    }

    #[tokio::test]
    async fn keeps_input_order_and_counts() {
        let (layout, encoder) = setup("uint8 n", false);
        let text = (0..20)
            .map(|i| {
                if i % 3 == 0 {
                    format!("{i},not-an-address")
                } else {
                    format!("{i},{RECIPIENT}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        let rows = parse_rows(text.as_bytes(), false);

        let outcome = build_batch(&rows, &layout, &encoder, false, &LiteralResolver, 3).await;

        assert_eq!(outcome.len() + outcome.skipped.len(), rows.len());
        assert_eq!(outcome.skipped.len(), 7);
        let lines: Vec<u64> = outcome.included.iter().map(|r| r.line).collect();
        let mut sorted = lines.clone();
        sorted.sort_unstable();
        assert_eq!(lines, sorted);
    }

    #[tokio::test]
    async fn ref_uid_column_is_decoded() {
        let (layout, encoder) = setup("bool ok", true);
        let uid = B256::repeat_byte(0xab);
        let text = format!("true,{uid},{RECIPIENT}\nfalse,,{RECIPIENT}\n");
        let rows = parse_rows(text.as_bytes(), false);

        let outcome = build_batch(&rows, &layout, &encoder, true, &LiteralResolver, 1).await;

        assert_eq!(outcome.len(), 2);
        assert_eq!(outcome.included[0].request.refUID, uid);
        assert_eq!(outcome.included[1].request.refUID, B256::ZERO);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn empty_ref_uid_is_zero(#[case] cell: &str) {
        assert_eq!(parse_ref_uid(cell).unwrap(), B256::ZERO);
    }

    #[rstest]
    #[case("0x01")]
    #[case("zz")]
    fn malformed_ref_uid_is_row_error(#[case] cell: &str) {
        assert!(parse_ref_uid(cell).unwrap_err().is_row_level());
    }

    #[tokio::test]
    async fn empty_input_gives_empty_outcome() {
        let (layout, encoder) = setup("uint256 value", false);
        let outcome = build_batch(&[], &layout, &encoder, true, &LiteralResolver, 8).await;
        assert!(outcome.is_empty());
        assert!(outcome.skipped.is_empty());
    }
}
