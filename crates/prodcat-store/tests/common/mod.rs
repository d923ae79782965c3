#![allow(dead_code)]

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use prodcat_core::QueryConfig;
use prodcat_store::{ConnectionPoolManager, PoolSettings, SqliteProductCatalog};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    "CREATE TABLE ge_usuario (codusuario TEXT NOT NULL, sequsuario INTEGER NOT NULL, nome TEXT NOT NULL)",
    "CREATE TABLE map_familia (seqfamilia INTEGER NOT NULL, descricao TEXT NOT NULL, pesavel TEXT)",
    "CREATE TABLE map_produto (seqproduto INTEGER NOT NULL, seqfamilia INTEGER NOT NULL, descreduzida TEXT NOT NULL, dtahorinclusao TEXT, usuarioinclusao TEXT NOT NULL)",
    "CREATE TABLE map_prodcodigo (codacesso TEXT NOT NULL, seqfamilia INTEGER NOT NULL, indutilvenda TEXT NOT NULL, tipcodigo TEXT NOT NULL)",
    "CREATE TABLE map_famdivcateg (seqfamilia INTEGER NOT NULL, seqcategoria INTEGER NOT NULL)",
    "CREATE TABLE mlo_prodcodfornec (seqproduto INTEGER NOT NULL, seqpessoa INTEGER NOT NULL, qtdembalagem REAL, nomerazao TEXT)",
    "CREATE TABLE macv_custocomprauf (seqfamilia INTEGER NOT NULL, seqfornecedor INTEGER NOT NULL, aliquotaicms REAL, perpis REAL, percofins REAL, uffaturamento TEXT)",
    "CREATE TABLE mrl_produtoempresa (seqproduto INTEGER NOT NULL, nroempresa INTEGER NOT NULL, estqloja REAL)",
];

const SEED: &[&str] = &[
    "INSERT INTO ge_usuario VALUES ('ANA', 7, 'Ana Souza'), ('BRUNO', 8, 'Bruno Lima')",
    "INSERT INTO map_familia VALUES
        (10, 'ARROZ BRANCO', 'N'),
        (11, 'ARROZ INTEGRAL', 'N'),
        (20, 'FEIJÃO', 'N'),
        (30, 'ACUCAR CRISTAL', 'S'),
        (31, 'ACUCAR REFINADO', 'N'),
        (40, 'SEM PRODUTOS', 'N'),
        (50, 'OLEOS', 'N')",
    "INSERT INTO map_produto VALUES
        (4521, 10, 'ARROZ TIPO 1 5KG', '2024-03-10 08:00:00', 'ANA'),
        (4522, 11, 'Arroz Integral 1kg', '2024-05-01 09:30:00', 'BRUNO'),
        (4600, 20, 'FEIJÃO CARIOCA 1KG', '2024-01-15 10:00:00', 'ANA'),
        (4700, 30, 'DESCONTO 50% ACUCAR', '2024-02-01 11:00:00', 'ANA'),
        (4701, 31, 'AÇÚCAR 500G', '2024-02-02 11:00:00', 'BRUNO'),
        (4800, 50, 'OLEO DE SOJA 900ML', '2024-06-01 07:45:00', 'ANA')",
    "INSERT INTO map_prodcodigo VALUES
        ('7891000000010', 10, 'S', 'B'),
        ('7891000000011', 11, 'S', 'E'),
        ('7891000000020', 20, 'S', 'B'),
        ('INT-20', 20, 'S', 'I'),
        ('7891000000030', 30, 'S', 'B'),
        ('7891000000031', 31, 'S', 'E'),
        ('7891000000050', 50, 'N', 'B')",
    "INSERT INTO map_famdivcateg VALUES (10, 1), (11, 1), (20, 2), (30, 3), (31, 3), (50, 4)",
    "INSERT INTO mlo_prodcodfornec VALUES
        (4521, 900, 5, 'DISTRIBUIDORA CENTRAL'),
        (4522, 900, 1, 'DISTRIBUIDORA CENTRAL'),
        (4600, 901, 10, 'GRAOS DO SUL'),
        (4700, 902, 1, 'DOCE LAR'),
        (4701, 902, 1, 'DOCE LAR'),
        (4800, 900, 20, 'DISTRIBUIDORA CENTRAL')",
    "INSERT INTO macv_custocomprauf VALUES
        (10, 900, 7.0, 1.65, 7.6, 'SP'),
        (11, 900, 7.0, 1.65, 7.6, 'SP'),
        (20, 901, 12.0, 1.65, 7.6, 'PR'),
        (30, 902, 18.0, 0.65, 3.0, 'MG'),
        (31, 902, 18.0, 0.65, 3.0, 'MG'),
        (50, 900, 18.0, 1.65, 7.6, 'SP')",
    "INSERT INTO mrl_produtoempresa VALUES
        (4521, 2, 120.0),
        (4521, 38, 15.0),
        (4522, 2, 40.0),
        (4522, 3, 12.5),
        (4600, 2, 300),
        (4700, 2, 8.0),
        (4701, 2, 64.0),
        (4800, 2, 90.0)",
];

pub fn temp_db_path() -> PathBuf {
    let filename = format!("prodcat-store-test-{}.db", Uuid::new_v4());
    std::env::temp_dir().join(filename)
}

pub fn database_url(path: &PathBuf) -> String {
    format!("sqlite://{}", path.display())
}

/// Opens a writable pool on `path`, creating the file.
pub async fn admin_pool(path: &PathBuf) -> SqlitePool {
    let options = SqliteConnectOptions::from_str(&database_url(path))
        .expect("parse url")
        .create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("open admin pool")
}

/// Creates the catalog tables, optionally with the reference data set.
pub async fn create_catalog(seed: bool) -> PathBuf {
    let path = temp_db_path();
    let pool = admin_pool(&path).await;
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .expect("create table");
    }
    if seed {
        for statement in SEED {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .expect("seed rows");
        }
    }
    pool.close().await;
    path
}

pub fn settings_for(path: &PathBuf) -> PoolSettings {
    PoolSettings {
        url: database_url(path),
        min_connections: 1,
        max_connections: 5,
        increment: 1,
        acquire_timeout: Duration::from_secs(5),
    }
}

pub struct TestContext {
    pub path: PathBuf,
    pub pool: Arc<ConnectionPoolManager>,
    pub catalog: SqliteProductCatalog,
}

pub async fn setup_context() -> TestContext {
    setup_with(true, QueryConfig::default()).await
}

pub async fn setup_with(seed: bool, config: QueryConfig) -> TestContext {
    let path = create_catalog(seed).await;
    let pool = Arc::new(ConnectionPoolManager::new(settings_for(&path)));
    pool.initialize().await.expect("initialize pool");
    let catalog = SqliteProductCatalog::new(Arc::clone(&pool), &config);
    TestContext {
        path,
        pool,
        catalog,
    }
}
