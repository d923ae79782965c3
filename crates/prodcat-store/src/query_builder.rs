//! Product lookup statement construction.
//!
//! The statement is a fixed base join followed by one conjunctive
//! predicate per filter present in the criteria. Predicates are appended
//! in a fixed order (product code, family code, barcode, description,
//! company number) and every value travels as a named parameter.

use prodcat_core::{CatalogResult, FilterCriteria, LookupMode, QueryConfig};

use crate::statement::{BoundStatement, SqlValue};

/// Base join of the product lookup. A product row only appears when its
/// user, family, sale barcode, supplier, purchase cost and company stock
/// rows all exist.
pub const PRODUCT_BASE_QUERY: &str = "SELECT DISTINCT
    e.codacesso AS EAN,
    a.seqproduto AS CODIGO_PRODUTO,
    a.seqfamilia AS CODIGO_FAMILIA,
    a.descreduzida AS DESCRICAO,
    i.estqloja AS ESTOQUE,
    i.nroempresa AS NRO_EMPRESA,
    h.aliquotaicms AS ALIQUOTA_ICMS,
    h.perpis AS PERCENT_PIS,
    h.percofins AS PERCENT_COFINS,
    h.uffaturamento AS ESTADO_FATUR,
    g.qtdembalagem AS EMBALAGEM,
    g.nomerazao AS FORNECEDOR,
    a.dtahorinclusao AS DIA_DA_INCLUSAO,
    d.pesavel AS ITEM_PESAVEL,
    a.usuarioinclusao AS QUEM_CADASTROU,
    b.sequsuario AS NUMERO_USUARIO,
    b.nome AS NOME_DE_QUEM_CADASTROU
FROM map_produto a
JOIN ge_usuario b ON a.usuarioinclusao = b.codusuario
JOIN map_produto c ON a.seqproduto = c.seqproduto
JOIN map_familia d ON a.seqfamilia = d.seqfamilia
JOIN map_prodcodigo e ON e.seqfamilia = a.seqfamilia
JOIN map_famdivcateg f ON f.seqfamilia = a.seqfamilia
JOIN mlo_prodcodfornec g ON a.seqproduto = g.seqproduto
JOIN macv_custocomprauf h ON h.seqfamilia = a.seqfamilia AND g.seqpessoa = h.seqfornecedor
JOIN mrl_produtoempresa i ON a.seqproduto = i.seqproduto
WHERE e.indutilvenda = 'S'
  AND e.tipcodigo IN ('B', 'E')";

/// Newest inclusion first; the trailing keys make ties deterministic.
const ORDER_BY: &str =
    "ORDER BY a.dtahorinclusao DESC, a.seqproduto ASC, e.codacesso ASC, i.nroempresa ASC";

/// One conjunctive filter clause and its bound value.
#[derive(Debug, Clone, PartialEq)]
struct Predicate {
    clause: &'static str,
    param: &'static str,
    value: SqlValue,
}

/// Builds product lookup statements.
#[derive(Debug, Clone)]
pub struct ProductQueryBuilder {
    bounds: QueryConfig,
    excluded_companies: Vec<i64>,
}

impl ProductQueryBuilder {
    /// Creates a builder using the limits and company exclusions in `config`.
    pub fn new(config: &QueryConfig) -> Self {
        let mut excluded_companies = config.excluded_companies.clone();
        excluded_companies.sort_unstable();
        excluded_companies.dedup();

        Self {
            bounds: config.clone(),
            excluded_companies,
        }
    }

    pub fn excluded_companies(&self) -> &[i64] {
        &self.excluded_companies
    }

    /// Validates `criteria` for `mode` and composes the lookup statement.
    pub fn build(&self, criteria: &FilterCriteria, mode: LookupMode) -> CatalogResult<BoundStatement> {
        criteria.validate(mode, &self.bounds)?;

        let mut sql = String::from(PRODUCT_BASE_QUERY);
        let mut statement_params: Vec<(String, SqlValue)> = Vec::new();

        if !self.excluded_companies.is_empty() {
            let names: Vec<String> = (1..=self.excluded_companies.len())
                .map(|n| format!("empresaExcluida{n}"))
                .collect();
            let placeholders: Vec<String> = names.iter().map(|name| format!(":{name}")).collect();
            sql.push_str(&format!(
                "\n  AND i.nroempresa NOT IN ({})",
                placeholders.join(", ")
            ));
            statement_params.extend(
                names
                    .into_iter()
                    .zip(self.excluded_companies.iter())
                    .map(|(name, company)| (name, SqlValue::Integer(*company))),
            );
        }

        for predicate in predicates(criteria) {
            sql.push_str("\n  AND ");
            sql.push_str(predicate.clause);
            statement_params.push((predicate.param.to_string(), predicate.value));
        }

        sql.push('\n');
        sql.push_str(ORDER_BY);
        sql.push_str("\nLIMIT :limite");
        statement_params.push((
            "limite".to_string(),
            SqlValue::Integer(i64::from(criteria.limit())),
        ));

        Ok(statement_params
            .into_iter()
            .fold(BoundStatement::new(sql), |statement, (name, value)| {
                statement.bind(name, value)
            }))
    }
}

fn predicates(criteria: &FilterCriteria) -> Vec<Predicate> {
    [
        criteria.product_code().map(|code| Predicate {
            clause: "a.seqproduto = :codigoProduto",
            param: "codigoProduto",
            value: SqlValue::Integer(code),
        }),
        criteria.family_code().map(|code| Predicate {
            clause: "a.seqfamilia = :codigoFamilia",
            param: "codigoFamilia",
            value: SqlValue::Integer(code),
        }),
        criteria.barcode().map(|barcode| Predicate {
            clause: "e.codacesso = :ean",
            param: "ean",
            value: SqlValue::Text(barcode.to_string()),
        }),
        // UPPER is the Unicode-aware override installed on every pooled connection.
        criteria.description().map(|description| Predicate {
            clause: "UPPER(a.descreduzida) LIKE UPPER(:descricao) ESCAPE '\\'",
            param: "descricao",
            value: SqlValue::Text(format!("%{}%", escape_like(description))),
        }),
        criteria.company_number().map(|company| Predicate {
            clause: "i.nroempresa = :nroEmpresa",
            param: "nroEmpresa",
            value: SqlValue::Integer(company),
        }),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Escapes LIKE metacharacters so the text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
