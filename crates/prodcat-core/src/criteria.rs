//! Product lookup filters.
//!
//! [`RawFilter`] carries the parameters exactly as a caller sent them;
//! [`RawFilter::into_criteria`] normalizes and validates them into a
//! [`FilterCriteria`] for one of the two lookup modes.

use serde::{Deserialize, Serialize};

use crate::config::QueryConfig;
use crate::error::{CatalogError, CatalogResult};

/// Which path a lookup comes from. The two modes differ in their limit
/// bounds and in whether a lookup key is mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    /// On-screen search: needs product code, barcode or description.
    Interactive,
    /// Spreadsheet export: any combination of filters, larger limits.
    Export,
}

/// Normalized product lookup filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
    #[serde(rename = "codigo_produto")]
    product_code: Option<i64>,
    #[serde(rename = "codigo_familia")]
    family_code: Option<i64>,
    #[serde(rename = "ean")]
    barcode: Option<String>,
    #[serde(rename = "descricao")]
    description: Option<String>,
    #[serde(rename = "nroEmpresa")]
    company_number: Option<i64>,
    limit: u32,
}

impl FilterCriteria {
    /// Creates criteria with no filters and the given row limit.
    #[must_use]
    pub const fn new(limit: u32) -> Self {
        Self {
            product_code: None,
            family_code: None,
            barcode: None,
            description: None,
            company_number: None,
            limit,
        }
    }

    #[must_use]
    pub fn with_product_code(mut self, code: i64) -> Self {
        self.product_code = Some(code);
        self
    }

    #[must_use]
    pub fn with_family_code(mut self, code: i64) -> Self {
        self.family_code = Some(code);
        self
    }

    /// Sets the barcode filter; blank input clears it.
    #[must_use]
    pub fn with_barcode(mut self, barcode: impl AsRef<str>) -> Self {
        self.barcode = non_blank(barcode.as_ref());
        self
    }

    /// Sets the description substring; blank input clears it.
    #[must_use]
    pub fn with_description(mut self, description: impl AsRef<str>) -> Self {
        self.description = non_blank(description.as_ref());
        self
    }

    #[must_use]
    pub fn with_company_number(mut self, company: i64) -> Self {
        self.company_number = Some(company);
        self
    }

    pub const fn product_code(&self) -> Option<i64> {
        self.product_code
    }

    pub const fn family_code(&self) -> Option<i64> {
        self.family_code
    }

    pub fn barcode(&self) -> Option<&str> {
        self.barcode.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub const fn company_number(&self) -> Option<i64> {
        self.company_number
    }

    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// True when at least one of product code, barcode or description is set.
    pub const fn has_lookup_key(&self) -> bool {
        self.product_code.is_some() || self.barcode.is_some() || self.description.is_some()
    }

    /// Checks the invariants of `mode` against `bounds`.
    ///
    /// Runs before any storage access, so a rejected lookup never takes a
    /// connection from the pool.
    pub fn validate(&self, mode: LookupMode, bounds: &QueryConfig) -> CatalogResult<()> {
        match mode {
            LookupMode::Interactive => {
                if !self.has_lookup_key() {
                    return Err(CatalogError::validation(MISSING_LOOKUP_KEY));
                }
                check_limit(self.limit, bounds.max_limit)
            }
            LookupMode::Export => check_limit(self.limit, bounds.export_max_limit),
        }
    }
}

const MISSING_LOOKUP_KEY: &str =
    "at least one search parameter is required (product code, barcode or description)";

fn check_limit(limit: u32, max: u32) -> CatalogResult<()> {
    if limit == 0 || limit > max {
        return Err(CatalogError::validation(format!(
            "limit must be a number between 1 and {max}"
        )));
    }
    Ok(())
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Lookup parameters as received on the wire.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawFilter {
    #[serde(default)]
    pub codigo_produto: Option<String>,
    #[serde(default)]
    pub codigo_familia: Option<String>,
    #[serde(default)]
    pub ean: Option<String>,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default, rename = "nroEmpresa")]
    pub nro_empresa: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

impl RawFilter {
    /// Parses and validates the raw parameters for `mode`.
    ///
    /// Interactive lookups report a missing lookup key before anything
    /// else, then the limit, then malformed numbers.
    pub fn into_criteria(self, mode: LookupMode, bounds: &QueryConfig) -> CatalogResult<FilterCriteria> {
        let codigo_produto = self.codigo_produto.as_deref().and_then(non_blank);
        let ean = self.ean.as_deref().and_then(non_blank);
        let descricao = self.descricao.as_deref().and_then(non_blank);

        if mode == LookupMode::Interactive
            && codigo_produto.is_none()
            && ean.is_none()
            && descricao.is_none()
        {
            return Err(CatalogError::validation(MISSING_LOOKUP_KEY));
        }

        let (default_limit, max_limit) = match mode {
            LookupMode::Interactive => (bounds.default_limit, bounds.max_limit),
            LookupMode::Export => (bounds.export_default_limit, bounds.export_max_limit),
        };
        let limit = match self.limit.as_deref().and_then(non_blank) {
            None => default_limit,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|n| (1..=i64::from(max_limit)).contains(n))
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| {
                    CatalogError::validation(format!(
                        "limit must be a number between 1 and {max_limit}"
                    ))
                })?,
        };

        let mut criteria = FilterCriteria::new(limit);
        if let Some(raw) = codigo_produto {
            criteria = criteria.with_product_code(parse_number(&raw, "product code")?);
        }
        if let Some(raw) = self.codigo_familia.as_deref().and_then(non_blank) {
            criteria = criteria.with_family_code(parse_number(&raw, "family code")?);
        }
        if let Some(raw) = ean {
            criteria = criteria.with_barcode(raw);
        }
        if let Some(raw) = descricao {
            criteria = criteria.with_description(raw);
        }
        if let Some(raw) = self.nro_empresa.as_deref().and_then(non_blank) {
            criteria = criteria.with_company_number(parse_number(&raw, "company number")?);
        }

        criteria.validate(mode, bounds)?;
        Ok(criteria)
    }
}

fn parse_number(raw: &str, field: &str) -> CatalogResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| CatalogError::validation(format!("{field} must be a valid number")))
}
