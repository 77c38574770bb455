use crate::{error::BatchError, rows::ParsedRow, schema::SchemaField};

/// The column layout every CSV row must follow:
/// `[data fields...] [refUID]? [recipient]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowLayout {
    data_fields: Vec<SchemaField>,
    ref_uid: bool,
}

/// A row that passed the cell count check, split into its columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowView<'a> {
    pub data: &'a [String],
    pub ref_uid: Option<&'a str>,
    pub recipient: &'a str,
}

impl RowLayout {
    #[must_use]
    pub const fn new(data_fields: Vec<SchemaField>, ref_uid: bool) -> Self {
        Self {
            data_fields,
            ref_uid,
        }
    }

    #[must_use]
    pub fn data_fields(&self) -> &[SchemaField] {
        &self.data_fields
    }

    #[must_use]
    pub const fn has_ref_uid(&self) -> bool {
        self.ref_uid
    }

    /// Number of cells a well-formed row has.
    #[must_use]
    pub fn expected_len(&self) -> usize {
        self.data_fields.len() + usize::from(self.ref_uid) + 1
    }

    /// Validate the cell count of `row` and split it into its columns.
    pub fn split<'a>(&self, row: &'a ParsedRow) -> Result<RowView<'a>, BatchError> {
        let expected = self.expected_len();
        if row.cells.len() != expected {
            return Err(BatchError::MalformedRow {
                expected,
                found: row.cells.len(),
            });
        }

        let (data, trailing) = row.cells.split_at(self.data_fields.len());
        let (ref_uid, recipient) = match trailing {
            [recipient] => (None, recipient),
            [ref_uid, recipient] => (Some(ref_uid.as_str()), recipient),
            _ => unreachable!("cell count checked above"),
        };

        Ok(RowView {
            data,
            ref_uid,
            recipient,
        })
    }
}
