//! View-to-table dependency edges from the PostgreSQL system catalogs.

use anyhow::{Context, Result};
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, Connection};

/// Transitive view dependencies, skipping a view's rewrite rule pointing
/// back at the view itself. `$1` is the namespace of the source relation.
pub const VIEW_DEPENDENCY_QUERY: &str = r#"
WITH RECURSIVE view_deps AS (
  SELECT DISTINCT
      dependent_ns.nspname AS dependent_schema
    , dependent_view.relname AS dependent_view
    , source_ns.nspname AS source_schema
    , source_table.relname AS source_table
  FROM pg_depend
  JOIN pg_rewrite
    ON pg_depend.objid = pg_rewrite.oid
  JOIN pg_class AS dependent_view
    ON pg_rewrite.ev_class = dependent_view.oid
  JOIN pg_class AS source_table
    ON pg_depend.refobjid = source_table.oid
  JOIN pg_namespace dependent_ns
    ON dependent_ns.oid = dependent_view.relnamespace
  JOIN pg_namespace source_ns
    ON source_ns.oid = source_table.relnamespace
  WHERE NOT (    dependent_ns.nspname   = source_ns.nspname
             AND dependent_view.relname = source_table.relname
            )
  UNION
  SELECT DISTINCT
      dependent_ns.nspname AS dependent_schema
    , dependent_view.relname AS dependent_view
    , source_ns.nspname AS source_schema
    , source_table.relname AS source_table
  FROM pg_depend
  JOIN pg_rewrite
    ON pg_depend.objid = pg_rewrite.oid
  JOIN pg_class AS dependent_view
    ON pg_rewrite.ev_class = dependent_view.oid
  JOIN pg_class AS source_table
    ON pg_depend.refobjid = source_table.oid
  JOIN pg_namespace dependent_ns
    ON dependent_ns.oid = dependent_view.relnamespace
  JOIN pg_namespace source_ns
    ON source_ns.oid = source_table.relnamespace
  INNER JOIN view_deps vd
     ON vd.dependent_schema = source_ns.nspname
    AND vd.dependent_view = source_table.relname
    AND NOT (    dependent_ns.nspname   = vd.dependent_schema
             AND dependent_view.relname = vd.dependent_view
            )
)
SELECT
    dependent_view::text
  , source_table::text
FROM view_deps
WHERE source_schema = $1
ORDER BY source_schema, dependent_view, source_table
"#;

/// One `view -> relation it reads from` edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDependency {
    pub dependent_view: String,
    pub source_table: String,
}

impl ViewDependency {
    /// Edge line from the view's right column anchor to the source's left.
    pub fn dot_edge(&self) -> String {
        format!(
            "\"{}\":rtcol0 -> \"{}\":ltcol0 ;\n",
            self.dependent_view, self.source_table
        )
    }
}

/// Run [`VIEW_DEPENDENCY_QUERY`] against `db_name` on the default local
/// server (libpq-style `PG*` environment is honoured).
///
/// The query runs inside a transaction that is always rolled back.
pub fn view_dependencies(db_name: &str, namespace: &str) -> Result<Vec<ViewDependency>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting database runtime")?;

    runtime.block_on(async {
        let options = PgConnectOptions::new()
            .database(db_name)
            .disable_statement_logging();
        let mut conn = options
            .connect()
            .await
            .with_context(|| format!("connecting to database '{db_name}'"))?;

        let mut tx = conn.begin().await.context("opening catalog transaction")?;
        let rows: Vec<(String, String)> = sqlx::query_as(VIEW_DEPENDENCY_QUERY)
            .bind(namespace)
            .fetch_all(&mut *tx)
            .await
            .with_context(|| format!("querying view dependencies in namespace '{namespace}'"))?;
        tx.rollback().await.context("rolling back catalog transaction")?;
        conn.close().await.context("closing database connection")?;

        Ok(rows
            .into_iter()
            .map(|(dependent_view, source_table)| ViewDependency {
                dependent_view,
                source_table,
            })
            .collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_edge_format() {
        let dep = ViewDependency {
            dependent_view: "raw_device_ip_addrs".to_string(),
            source_table: "raw_ip_addrs".to_string(),
        };
        assert_eq!(
            dep.dot_edge(),
            "\"raw_device_ip_addrs\":rtcol0 -> \"raw_ip_addrs\":ltcol0 ;\n"
        );
    }

    #[test]
    fn test_query_filters_and_orders() {
        assert!(VIEW_DEPENDENCY_QUERY.contains("WHERE source_schema = $1"));
        assert!(VIEW_DEPENDENCY_QUERY
            .contains("ORDER BY source_schema, dependent_view, source_table"));
        assert!(VIEW_DEPENDENCY_QUERY.contains("WITH RECURSIVE view_deps"));
    }
}
