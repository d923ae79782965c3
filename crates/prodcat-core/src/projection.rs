//! Column projection for product exports.
//!
//! Callers name columns with the identifiers their screens use
//! (`col-ean`, `col-descricao`, ...). [`ColumnProjector`] translates those
//! through a fixed table into [`ProductField`]s and always keeps the
//! mandatory core so an exported row can be traced back to a product.

use serde_json::{Map, Value};

use crate::record::{FieldValue, ProductField, ProductRecord};

/// Fields present in every projection.
pub const MANDATORY_FIELDS: [ProductField; 3] = [
    ProductField::Barcode,
    ProductField::ProductCode,
    ProductField::Description,
];

/// Caller column identifier to record field.
const COLUMN_MAPPING: &[(&str, ProductField)] = &[
    ("col-ean", ProductField::Barcode),
    ("col-codigo", ProductField::ProductCode),
    ("col-familia", ProductField::FamilyCode),
    ("col-descricao", ProductField::Description),
    ("col-estoque", ProductField::StockQuantity),
    ("col-empresa", ProductField::CompanyNumber),
    ("col-icms", ProductField::IcmsRate),
    ("col-pis", ProductField::PisPercent),
    ("col-cofins", ProductField::CofinsPercent),
    ("col-uf", ProductField::BillingState),
    ("col-embalagem", ProductField::PackageQuantity),
    ("col-fornecedor", ProductField::SupplierName),
    ("col-inclusao", ProductField::IncludedAt),
    ("col-pesavel", ProductField::Weighable),
    ("col-cadastrante", ProductField::RegisteredBy),
    ("col-usuario", ProductField::RegisteringUserId),
    ("col-nome-usuario", ProductField::RegisteringUserName),
];

/// Looks up the record field behind a caller column identifier.
pub fn field_for_column(column_id: &str) -> Option<ProductField> {
    COLUMN_MAPPING
        .iter()
        .find(|(id, _)| *id == column_id.trim())
        .map(|(_, field)| *field)
}

/// Reduces product records to a caller-requested set of columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnProjector;

impl ColumnProjector {
    /// Resolves the columns to emit, or `None` when every column is kept.
    ///
    /// Unknown identifiers are dropped. The result is in record field
    /// order with duplicates removed.
    pub fn resolve<S: AsRef<str>>(requested: Option<&[S]>) -> Option<Vec<ProductField>> {
        let requested = requested.filter(|ids| !ids.is_empty())?;

        let mut fields: Vec<ProductField> = MANDATORY_FIELDS
            .into_iter()
            .chain(requested.iter().filter_map(|id| field_for_column(id.as_ref())))
            .collect();
        fields.sort_unstable();
        fields.dedup();
        Some(fields)
    }

    /// Projects `records` onto the requested columns.
    pub fn project<S: AsRef<str>>(
        records: Vec<ProductRecord>,
        requested: Option<&[S]>,
    ) -> ProjectedRows {
        match Self::resolve(requested) {
            Some(columns) => ProjectedRows {
                columns,
                records,
                full: false,
            },
            None => ProjectedRows {
                columns: ProductField::ALL.to_vec(),
                records,
                full: true,
            },
        }
    }
}

/// Records paired with the columns a consumer should emit for them.
#[derive(Debug, Clone)]
pub struct ProjectedRows {
    columns: Vec<ProductField>,
    records: Vec<ProductRecord>,
    full: bool,
}

impl ProjectedRows {
    pub fn columns(&self) -> &[ProductField] {
        &self.columns
    }

    /// Header names, one per column.
    pub fn header(&self) -> Vec<&'static str> {
        self.columns.iter().map(ProductField::column).collect()
    }

    /// The underlying records, untouched.
    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    /// True when no column filtering was requested.
    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Projected cells, row by row.
    pub fn rows(&self) -> impl Iterator<Item = Vec<FieldValue>> + '_ {
        self.records
            .iter()
            .map(|record| self.columns.iter().map(|field| record.get(*field)).collect())
    }

    /// Projected records as JSON objects keyed by column name.
    pub fn to_json(&self) -> Vec<Value> {
        self.rows()
            .map(|cells| {
                let object: Map<String, Value> = self
                    .columns
                    .iter()
                    .zip(cells)
                    .map(|(field, cell)| {
                        (
                            field.column().to_string(),
                            serde_json::to_value(cell).unwrap_or(Value::Null),
                        )
                    })
                    .collect();
                Value::Object(object)
            })
            .collect()
    }
}
