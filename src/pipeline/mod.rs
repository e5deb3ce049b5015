//! Full reload of the Olist extracts: check files, truncate, load, count.

use crate::config::LoaderConfig;
use crate::duck::{TableRef, Warehouse};
use crate::error::{LoadError, LoadResult};
use crate::load::{load_csv, LoadSpec, LoadSummary};
use crate::process::utils::list_csv_files;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub const CUSTOMERS_CSV: &str = "olist_customers_dataset.csv";
pub const PRODUCTS_CSV: &str = "olist_products_dataset.csv";
pub const ORDERS_CSV: &str = "olist_orders_dataset.csv";
pub const ORDER_ITEMS_CSV: &str = "olist_order_items_dataset.csv";

/// Children before parents.
pub const TRUNCATE_ORDER: [&str; 4] = ["order_items", "orders", "customers", "products"];

pub const ORDER_DATE_COLUMNS: [&str; 5] = [
    "order_purchase_timestamp",
    "order_approved_at",
    "order_delivered_carrier_date",
    "order_delivered_customer_date",
    "order_estimated_delivery_date",
];

pub const ORDER_ITEM_DATE_COLUMNS: [&str; 1] = ["shipping_limit_date"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCount {
    pub table: TableRef,
    pub rows: i64,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub loads: Vec<LoadSummary>,
    pub counts: Vec<TableCount>,
    pub elapsed: Duration,
}

/// The fixed load plan: dimensions (customers, products) before facts.
pub fn olist_plan(csv_dir: &Path, schema: &str, batch_size: usize) -> Vec<LoadSpec> {
    let table = |name: &str| TableRef::new(schema, name);
    vec![
        LoadSpec::new(csv_dir.join(CUSTOMERS_CSV), table("customers"), batch_size),
        LoadSpec::new(csv_dir.join(PRODUCTS_CSV), table("products"), batch_size),
        LoadSpec::new(csv_dir.join(ORDERS_CSV), table("orders"), batch_size)
            .with_parse_dates(ORDER_DATE_COLUMNS),
        LoadSpec::new(csv_dir.join(ORDER_ITEMS_CSV), table("order_items"), batch_size)
            .with_parse_dates(ORDER_ITEM_DATE_COLUMNS),
    ]
}

/// Every planned source must exist before anything is truncated.
/// The orders file is checked first.
fn check_sources(csv_dir: &Path, plan: &[LoadSpec]) -> LoadResult<()> {
    let mut paths: Vec<&PathBuf> = plan.iter().map(|s| &s.source).collect();
    paths.sort_by_key(|p| !p.ends_with(ORDERS_CSV));

    if let Some(missing) = paths.into_iter().find(|p| !p.exists()) {
        let found = list_csv_files(csv_dir);
        warn!(csv_dir = %csv_dir.display(), found = ?found, "source csv missing");
        return Err(LoadError::MissingSourceFile {
            dir: csv_dir.to_path_buf(),
            path: missing.clone(),
            found,
        });
    }
    Ok(())
}

/// Row count per table, in load order. Purely informational.
pub fn validate_counts(warehouse: &Warehouse, plan: &[LoadSpec]) -> LoadResult<Vec<TableCount>> {
    let mut counts = Vec::with_capacity(plan.len());
    for spec in plan {
        let rows = warehouse.row_count(&spec.target)?;
        info!(table = %spec.target, rows, "row count");
        counts.push(TableCount {
            table: spec.target.clone(),
            rows,
        });
    }
    Ok(counts)
}

/// TRUNCATE → LOAD(customers) → LOAD(products) → LOAD(orders) → LOAD(order_items) → VALIDATE.
///
/// Only the truncation is atomic. A later load failing does not undo the
/// tables already loaded.
pub fn run(config: &LoaderConfig, warehouse: &mut Warehouse) -> LoadResult<RunReport> {
    config.validate()?;
    let start = Instant::now();
    let csv_dir = config.resolved_csv_dir()?;
    let plan = olist_plan(&csv_dir, &config.schema, config.batch_size);

    check_sources(&csv_dir, &plan)?;

    let truncate: Vec<TableRef> = TRUNCATE_ORDER
        .iter()
        .map(|t| TableRef::new(config.schema.as_str(), *t))
        .collect();
    warehouse.truncate_all(&truncate)?;

    let mut loads = Vec::with_capacity(plan.len());
    for spec in &plan {
        loads.push(load_csv(warehouse, spec)?);
    }

    let counts = validate_counts(warehouse, &plan)?;
    let elapsed = start.elapsed();
    info!(elapsed = ?elapsed, "run complete");

    Ok(RunReport {
        loads,
        counts,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duck::tests::seeded_warehouse;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    const OLIST_DDL: &str = "
        CREATE SCHEMA olist;
        CREATE TABLE olist.customers (
            customer_id VARCHAR,
            customer_unique_id VARCHAR,
            customer_zip_code_prefix INTEGER,
            customer_city VARCHAR,
            customer_state VARCHAR
        );
        CREATE TABLE olist.products (
            product_id VARCHAR,
            product_category_name VARCHAR,
            product_weight_g DOUBLE
        );
        CREATE TABLE olist.orders (
            order_id VARCHAR,
            customer_id VARCHAR,
            order_status VARCHAR,
            order_purchase_timestamp TIMESTAMP,
            order_approved_at TIMESTAMP,
            order_delivered_carrier_date TIMESTAMP,
            order_delivered_customer_date TIMESTAMP,
            order_estimated_delivery_date TIMESTAMP
        );
        CREATE TABLE olist.order_items (
            order_id VARCHAR,
            order_item_id INTEGER,
            product_id VARCHAR,
            seller_id VARCHAR,
            shipping_limit_date TIMESTAMP,
            price DOUBLE,
            freight_value DOUBLE
        );
        INSERT INTO olist.customers VALUES ('stale', 'stale', 1, 'x', 'SP');
        INSERT INTO olist.order_items VALUES ('stale', 1, 'p', 's', NULL, 1.0, 1.0);
    ";

    fn write_olist(dir: &Path) -> Result<()> {
        fs::write(
            dir.join(CUSTOMERS_CSV),
            "customer_id,customer_unique_id,customer_zip_code_prefix,customer_city,customer_state\n\
             c1,u1,14409,franca,SP\n\
             c2,u2,9790,,SP\n\
             c3,u3,1151,sao paulo,SP\n",
        )?;
        fs::write(
            dir.join(PRODUCTS_CSV),
            "product_id,product_category_name,product_name_lenght,product_weight_g\n\
             p1,perfumaria,40,225\n\
             p2,artes,44,1000\n",
        )?;
        fs::write(
            dir.join(ORDERS_CSV),
            "order_id,customer_id,order_status,order_purchase_timestamp,order_approved_at,\
             order_delivered_carrier_date,order_delivered_customer_date,order_estimated_delivery_date\n\
             o1,c1,delivered,2017-10-02 10:56:33,2017-10-02 11:07:15,2017-10-04 19:55:00,2017-10-10 21:25:13,2017-10-18 00:00:00\n\
             o2,c3,delivered,2018-07-24 20:41:37,not-a-date,2018-07-26 14:31:00,2018-08-07 15:27:45,2018-08-13 00:00:00\n",
        )?;
        fs::write(
            dir.join(ORDER_ITEMS_CSV),
            "order_id,order_item_id,product_id,seller_id,shipping_limit_date,price,freight_value\n\
             o1,1,p1,s1,2017-10-06 11:07:15,58.9,13.29\n\
             o2,1,p2,s2,2018-07-30 03:24:27,239.9,19.93\n",
        )?;
        Ok(())
    }

    fn config_for(dir: &Path) -> LoaderConfig {
        LoaderConfig {
            database: ":memory:".into(),
            csv_dir: dir.to_path_buf(),
            ..LoaderConfig::default()
        }
    }

    #[test]
    fn plan_loads_dimensions_before_facts() {
        let plan = olist_plan(Path::new("/data"), "olist", 10_000);
        let tables: Vec<&str> = plan.iter().map(|s| s.target.table.as_str()).collect();
        assert_eq!(tables, vec!["customers", "products", "orders", "order_items"]);
        assert_eq!(plan[2].parse_dates.len(), 5);
        assert_eq!(plan[3].parse_dates, vec!["shipping_limit_date"]);
        assert!(plan.iter().all(|s| s.batch_size == 10_000 && s.rename.is_empty()));
    }

    #[test]
    fn end_to_end_reload() -> Result<()> {
        let dir = tempdir()?;
        write_olist(dir.path())?;
        let mut wh = seeded_warehouse(OLIST_DDL)?;

        let report = run(&config_for(dir.path()), &mut wh)?;

        let counts: Vec<(String, i64)> = report
            .counts
            .iter()
            .map(|c| (c.table.to_string(), c.rows))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("olist.customers".to_string(), 3),
                ("olist.products".to_string(), 2),
                ("olist.orders".to_string(), 2),
                ("olist.order_items".to_string(), 2),
            ]
        );
        assert_eq!(report.loads.len(), 4);
        assert!(report.loads.iter().all(|l| l.batches == 1));

        let conn = wh.connection();
        let blank_city: i64 = conn.query_row(
            "SELECT COUNT(*) FROM olist.customers WHERE customer_city IS NULL",
            [],
            |r| r.get(0),
        )?;
        assert_eq!(blank_city, 1);

        let approved: Option<String> = conn.query_row(
            "SELECT CAST(order_approved_at AS VARCHAR) FROM olist.orders WHERE order_id = 'o2'",
            [],
            |r| r.get(0),
        )?;
        assert_eq!(approved, None);

        let purchased: String = conn.query_row(
            "SELECT CAST(order_purchase_timestamp AS VARCHAR) FROM olist.orders WHERE order_id = 'o1'",
            [],
            |r| r.get(0),
        )?;
        assert_eq!(purchased, "2017-10-02 10:56:33");

        let nulls: i64 = conn.query_row(
            "SELECT COUNT(*) FROM olist.orders WHERE order_approved_at IS NULL",
            [],
            |r| r.get(0),
        )?;
        assert_eq!(nulls, 1);
        Ok(())
    }

    #[test]
    fn rerun_does_not_duplicate() -> Result<()> {
        let dir = tempdir()?;
        write_olist(dir.path())?;
        let mut wh = seeded_warehouse(OLIST_DDL)?;
        let cfg = config_for(dir.path());

        run(&cfg, &mut wh)?;
        let report = run(&cfg, &mut wh)?;
        let rows: Vec<i64> = report.counts.iter().map(|c| c.rows).collect();
        assert_eq!(rows, vec![3, 2, 2, 2]);
        Ok(())
    }

    #[test]
    fn missing_source_fails_before_truncation() -> Result<()> {
        let dir = tempdir()?;
        write_olist(dir.path())?;
        fs::remove_file(dir.path().join(PRODUCTS_CSV))?;
        let mut wh = seeded_warehouse(OLIST_DDL)?;

        let err = run(&config_for(dir.path()), &mut wh).unwrap_err();
        match &err {
            LoadError::MissingSourceFile { dir: d, path, found } => {
                assert_eq!(d, dir.path());
                assert_eq!(path, &dir.path().join(PRODUCTS_CSV));
                assert_eq!(
                    found,
                    &vec![
                        CUSTOMERS_CSV.to_string(),
                        ORDER_ITEMS_CSV.to_string(),
                        ORDERS_CSV.to_string(),
                    ]
                );
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(err.to_string().contains(CUSTOMERS_CSV));

        // stale rows survive: nothing was mutated
        assert_eq!(wh.row_count(&TableRef::new("olist", "customers"))?, 1);
        assert_eq!(wh.row_count(&TableRef::new("olist", "order_items"))?, 1);
        Ok(())
    }

    #[test]
    fn later_load_failure_keeps_earlier_tables() -> Result<()> {
        let dir = tempdir()?;
        write_olist(dir.path())?;
        fs::write(
            dir.path().join(ORDER_ITEMS_CSV),
            "order_id,order_item_id,price\no1,first,1.0\n",
        )?;
        let mut wh = seeded_warehouse(OLIST_DDL)?;

        let err = run(&config_for(dir.path()), &mut wh).unwrap_err();
        assert!(matches!(err, LoadError::Write { ref table, .. } if table == "olist.order_items"));

        assert_eq!(wh.row_count(&TableRef::new("olist", "customers"))?, 3);
        assert_eq!(wh.row_count(&TableRef::new("olist", "orders"))?, 2);
        assert_eq!(wh.row_count(&TableRef::new("olist", "order_items"))?, 0);
        Ok(())
    }
}
