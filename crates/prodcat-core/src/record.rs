//! Read-only projections of catalog rows.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

/// One product as offered by one company under one barcode.
///
/// Serialized with the column names the lookup statement selects, which
/// are also the spreadsheet header names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    #[serde(rename = "EAN")]
    pub barcode: String,
    #[serde(rename = "CODIGO_PRODUTO")]
    pub product_code: i64,
    #[serde(rename = "CODIGO_FAMILIA")]
    pub family_code: i64,
    #[serde(rename = "DESCRICAO")]
    pub description: String,
    #[serde(rename = "ESTOQUE")]
    pub stock_quantity: Option<f64>,
    #[serde(rename = "NRO_EMPRESA")]
    pub company_number: i64,
    #[serde(rename = "ALIQUOTA_ICMS")]
    pub icms_rate: Option<f64>,
    #[serde(rename = "PERCENT_PIS")]
    pub pis_percent: Option<f64>,
    #[serde(rename = "PERCENT_COFINS")]
    pub cofins_percent: Option<f64>,
    #[serde(rename = "ESTADO_FATUR")]
    pub billing_state: Option<String>,
    #[serde(rename = "EMBALAGEM")]
    pub package_quantity: Option<f64>,
    #[serde(rename = "FORNECEDOR")]
    pub supplier_name: Option<String>,
    #[serde(rename = "DIA_DA_INCLUSAO")]
    pub included_at: Option<NaiveDateTime>,
    #[serde(rename = "ITEM_PESAVEL")]
    pub weighable: Option<bool>,
    #[serde(rename = "QUEM_CADASTROU")]
    pub registered_by: String,
    #[serde(rename = "NUMERO_USUARIO")]
    pub registering_user_id: i64,
    #[serde(rename = "NOME_DE_QUEM_CADASTROU")]
    pub registering_user_name: String,
}

impl ProductRecord {
    /// Returns the value of a single field.
    pub fn get(&self, field: ProductField) -> FieldValue {
        match field {
            ProductField::Barcode => FieldValue::Text(self.barcode.clone()),
            ProductField::ProductCode => FieldValue::Integer(self.product_code),
            ProductField::FamilyCode => FieldValue::Integer(self.family_code),
            ProductField::Description => FieldValue::Text(self.description.clone()),
            ProductField::StockQuantity => self.stock_quantity.into(),
            ProductField::CompanyNumber => FieldValue::Integer(self.company_number),
            ProductField::IcmsRate => self.icms_rate.into(),
            ProductField::PisPercent => self.pis_percent.into(),
            ProductField::CofinsPercent => self.cofins_percent.into(),
            ProductField::BillingState => self.billing_state.clone().into(),
            ProductField::PackageQuantity => self.package_quantity.into(),
            ProductField::SupplierName => self.supplier_name.clone().into(),
            ProductField::IncludedAt => self
                .included_at
                .map_or(FieldValue::Null, FieldValue::Timestamp),
            ProductField::Weighable => self.weighable.map_or(FieldValue::Null, FieldValue::Flag),
            ProductField::RegisteredBy => FieldValue::Text(self.registered_by.clone()),
            ProductField::RegisteringUserId => FieldValue::Integer(self.registering_user_id),
            ProductField::RegisteringUserName => {
                FieldValue::Text(self.registering_user_name.clone())
            }
        }
    }
}

/// Field identifiers of [`ProductRecord`], in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProductField {
    Barcode,
    ProductCode,
    FamilyCode,
    Description,
    StockQuantity,
    CompanyNumber,
    IcmsRate,
    PisPercent,
    CofinsPercent,
    BillingState,
    PackageQuantity,
    SupplierName,
    IncludedAt,
    Weighable,
    RegisteredBy,
    RegisteringUserId,
    RegisteringUserName,
}

impl ProductField {
    pub const ALL: [ProductField; 17] = [
        Self::Barcode,
        Self::ProductCode,
        Self::FamilyCode,
        Self::Description,
        Self::StockQuantity,
        Self::CompanyNumber,
        Self::IcmsRate,
        Self::PisPercent,
        Self::CofinsPercent,
        Self::BillingState,
        Self::PackageQuantity,
        Self::SupplierName,
        Self::IncludedAt,
        Self::Weighable,
        Self::RegisteredBy,
        Self::RegisteringUserId,
        Self::RegisteringUserName,
    ];

    /// Column alias in the lookup statement; also the serialized name.
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Barcode => "EAN",
            Self::ProductCode => "CODIGO_PRODUTO",
            Self::FamilyCode => "CODIGO_FAMILIA",
            Self::Description => "DESCRICAO",
            Self::StockQuantity => "ESTOQUE",
            Self::CompanyNumber => "NRO_EMPRESA",
            Self::IcmsRate => "ALIQUOTA_ICMS",
            Self::PisPercent => "PERCENT_PIS",
            Self::CofinsPercent => "PERCENT_COFINS",
            Self::BillingState => "ESTADO_FATUR",
            Self::PackageQuantity => "EMBALAGEM",
            Self::SupplierName => "FORNECEDOR",
            Self::IncludedAt => "DIA_DA_INCLUSAO",
            Self::Weighable => "ITEM_PESAVEL",
            Self::RegisteredBy => "QUEM_CADASTROU",
            Self::RegisteringUserId => "NUMERO_USUARIO",
            Self::RegisteringUserName => "NOME_DE_QUEM_CADASTROU",
        }
    }
}

/// A single cell of a projected record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Timestamp(NaiveDateTime),
    Flag(bool),
    Null,
}

impl From<Option<f64>> for FieldValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Null, Self::Decimal)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Null, Self::Text)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Integer(n) => serializer.serialize_i64(*n),
            Self::Decimal(n) => serializer.serialize_f64(*n),
            Self::Timestamp(ts) => ts.serialize(serializer),
            Self::Flag(flag) => serializer.serialize_bool(*flag),
            Self::Null => serializer.serialize_none(),
        }
    }
}

/// Product family reference entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyRecord {
    #[serde(rename = "CODIGO_FAMILIA")]
    pub family_code: i64,
    #[serde(rename = "DESCRICAO")]
    pub description: String,
}

/// Catalog user reference entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    #[serde(rename = "CODUSUARIO")]
    pub user_code: String,
    #[serde(rename = "NOME")]
    pub name: String,
}

/// Catalog-wide counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticsSummary {
    #[serde(rename = "totalProdutos")]
    pub total_products: i64,
    #[serde(rename = "totalFamilias")]
    pub total_families: i64,
    #[serde(rename = "totalUsuarios")]
    pub total_users: i64,
    /// `None` when the product table is empty.
    #[serde(rename = "ultimaAtualizacao")]
    pub last_inclusion: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProductRecord {
        ProductRecord {
            barcode: "7891000100103".into(),
            product_code: 4521,
            family_code: 10,
            description: "ARROZ TIPO 1 5KG".into(),
            stock_quantity: Some(42.0),
            company_number: 2,
            icms_rate: Some(18.0),
            pis_percent: Some(1.65),
            cofins_percent: Some(7.6),
            billing_state: Some("SP".into()),
            package_quantity: Some(6.0),
            supplier_name: None,
            included_at: NaiveDateTime::parse_from_str("2024-03-01 08:30:00", "%Y-%m-%d %H:%M:%S")
                .ok(),
            weighable: Some(false),
            registered_by: "ANA".into(),
            registering_user_id: 7,
            registering_user_name: "Ana Souza".into(),
        }
    }

    #[test]
    fn serialized_keys_match_field_columns() {
        let json = serde_json::to_value(sample()).expect("serialize");
        let object = json.as_object().expect("object");

        assert_eq!(object.len(), ProductField::ALL.len());
        for field in ProductField::ALL {
            assert!(object.contains_key(field.column()), "{}", field.column());
        }
        assert_eq!(object["CODIGO_PRODUTO"], 4521);
        assert!(object["FORNECEDOR"].is_null());
    }

    #[test]
    fn get_returns_typed_values() {
        let record = sample();

        assert_eq!(record.get(ProductField::ProductCode), FieldValue::Integer(4521));
        assert_eq!(record.get(ProductField::Weighable), FieldValue::Flag(false));
        assert_eq!(record.get(ProductField::SupplierName), FieldValue::Null);
        assert_eq!(
            record.get(ProductField::Description),
            FieldValue::Text("ARROZ TIPO 1 5KG".into())
        );
    }

    #[test]
    fn statistics_use_wire_names() {
        let summary = StatisticsSummary {
            total_products: 3,
            total_families: 2,
            total_users: 1,
            last_inclusion: None,
        };
        let json = serde_json::to_value(summary).expect("serialize");

        assert_eq!(json["totalProdutos"], 3);
        assert!(json["ultimaAtualizacao"].is_null());
    }
}
