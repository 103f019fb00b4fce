use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::readme::ReadmeMetrics;
use crate::registry::Registry;

// Table layouts match the stores written by the ingestion tool, so an
// existing database is picked up without migration.
const NPM_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS npmpackage (
        id                         INTEGER PRIMARY KEY,
        name                       VARCHAR(255) NOT NULL,
        repository_url             VARCHAR(255),
        page_no                    INTEGER,
        readme                     TEXT,
        description                VARCHAR(255),
        dependents                 VARCHAR(255),
        dependencies               VARCHAR(255),
        day_download_count         INTEGER,
        week_download_count        INTEGER,
        month_download_count       INTEGER,
        stargazers_count           INTEGER,
        forks_count                INTEGER,
        open_issues_count          INTEGER,
        has_wiki                   INTEGER,
        subscribers_count          INTEGER,
        github_contributions_count INTEGER
    );
    CREATE INDEX IF NOT EXISTS npmpackage_name ON npmpackage(name);

    CREATE TABLE IF NOT EXISTS npmreadmeanalysis (
        id         INTEGER PRIMARY KEY,
        code_count INTEGER NOT NULL,
        word_count INTEGER NOT NULL,
        package_id INTEGER NOT NULL REFERENCES npmpackage(id)
    );
    CREATE UNIQUE INDEX IF NOT EXISTS npmreadmeanalysis_package_unique
        ON npmreadmeanalysis(package_id);
";

const PYPI_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS pypipackage (
        id                   INTEGER PRIMARY KEY,
        name                 VARCHAR(255) NOT NULL,
        readme               TEXT,
        description          VARCHAR(255),
        day_download_count   INTEGER,
        week_download_count  INTEGER,
        month_download_count INTEGER
    );
    CREATE INDEX IF NOT EXISTS pypipackage_name ON pypipackage(name);

    CREATE TABLE IF NOT EXISTS pypireadmeanalysis (
        id         INTEGER PRIMARY KEY,
        code_count INTEGER NOT NULL,
        word_count INTEGER NOT NULL,
        package_id INTEGER NOT NULL REFERENCES pypipackage(id)
    );
    CREATE UNIQUE INDEX IF NOT EXISTS pypireadmeanalysis_package_unique
        ON pypireadmeanalysis(package_id);
";

/// A package row as the analysis pass sees it. Only rows with README text
/// are ever loaded, so `readme` is never empty.
#[derive(Debug, Clone)]
pub struct Package {
    pub id: i64,
    pub name: String,
    pub readme: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadmeAnalysis {
    pub id: i64,
    pub package_id: i64,
    pub word_count: usize,
    pub code_count: usize,
}

/// Handle on one registry's database.
pub struct Store {
    conn: Connection,
    registry: Registry,
}

impl Store {
    pub fn open(path: &Path, registry: Registry) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Store { conn, registry })
    }

    #[cfg(test)]
    pub fn open_in_memory(registry: Registry) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Store { conn, registry })
    }

    pub fn registry(&self) -> Registry {
        self.registry
    }

    pub fn ensure_tables(&self) -> Result<()> {
        let schema = match self.registry {
            Registry::Npm => NPM_SCHEMA,
            Registry::Pypi => PYPI_SCHEMA,
        };
        self.conn
            .execute_batch(schema)
            .with_context(|| format!("Failed to create {} tables", self.registry.label()))?;
        Ok(())
    }

    // ── Packages ──

    /// Packages with README text. NULL and empty READMEs are both skipped.
    pub fn fetch_readme_packages(&self) -> Result<Vec<Package>> {
        let sql = format!(
            "SELECT id, name, readme FROM {} WHERE readme IS NOT NULL AND readme != ''",
            self.registry.package_table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Package {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    readme: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    #[cfg(test)]
    pub fn insert_package(&self, name: &str, readme: Option<&str>) -> Result<i64> {
        let sql = format!(
            "INSERT INTO {} (name, readme) VALUES (?1, ?2)",
            self.registry.package_table()
        );
        self.conn.execute(&sql, params![name, readme])?;
        Ok(self.conn.last_insert_rowid())
    }

    #[cfg(test)]
    pub fn set_readme(&self, package_id: i64, readme: Option<&str>) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET readme = ?1 WHERE id = ?2",
            self.registry.package_table()
        );
        self.conn.execute(&sql, params![readme, package_id])?;
        Ok(())
    }

    // ── Analyses ──

    pub fn find_analysis(&self, package_id: i64) -> Result<Option<ReadmeAnalysis>> {
        let sql = format!(
            "SELECT id, package_id, word_count, code_count FROM {} WHERE package_id = ?1",
            self.registry.analysis_table()
        );
        let analysis = self
            .conn
            .query_row(&sql, params![package_id], analysis_from_row)
            .optional()?;
        Ok(analysis)
    }

    pub fn insert_analysis(&self, package_id: i64, metrics: ReadmeMetrics) -> Result<ReadmeAnalysis> {
        let sql = format!(
            "INSERT INTO {} (package_id, word_count, code_count) VALUES (?1, ?2, ?3)",
            self.registry.analysis_table()
        );
        self.conn.execute(
            &sql,
            params![package_id, metrics.word_count as i64, metrics.code_count as i64],
        )?;
        Ok(ReadmeAnalysis {
            id: self.conn.last_insert_rowid(),
            package_id,
            word_count: metrics.word_count,
            code_count: metrics.code_count,
        })
    }

    pub fn update_analysis(&self, analysis: &ReadmeAnalysis) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET word_count = ?1, code_count = ?2 WHERE id = ?3 AND package_id = ?4",
            self.registry.analysis_table()
        );
        self.conn.execute(
            &sql,
            params![
                analysis.word_count as i64,
                analysis.code_count as i64,
                analysis.id,
                analysis.package_id
            ],
        )?;
        Ok(())
    }

    pub fn count_analyses(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.registry.analysis_table());
        let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

fn analysis_from_row(row: &Row<'_>) -> rusqlite::Result<ReadmeAnalysis> {
    Ok(ReadmeAnalysis {
        id: row.get(0)?,
        package_id: row.get(1)?,
        word_count: count_column(row, 2)?,
        code_count: count_column(row, 3)?,
    })
}

fn count_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<usize> {
    let val: i64 = row.get(idx)?;
    usize::try_from(val).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, val))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(registry: Registry) -> Store {
        let store = Store::open_in_memory(registry).unwrap();
        store.ensure_tables().unwrap();
        store
    }

    #[test]
    fn ensure_tables_is_idempotent() {
        let s = store(Registry::Npm);
        let id = s.insert_package("left-pad", Some("# left-pad")).unwrap();
        s.ensure_tables().unwrap();
        s.ensure_tables().unwrap();
        let pkgs = s.fetch_readme_packages().unwrap();
        assert_eq!(pkgs.len(), 1);
        assert_eq!(pkgs[0].id, id);
    }

    #[test]
    fn registries_use_separate_tables() {
        let s = store(Registry::Pypi);
        s.insert_package("requests", Some("Requests")).unwrap();
        let err = s.conn.prepare("SELECT id FROM npmpackage");
        assert!(err.is_err());
        assert_eq!(s.fetch_readme_packages().unwrap().len(), 1);
    }

    #[test]
    fn fetch_skips_null_and_empty_readmes() {
        let s = store(Registry::Pypi);
        s.insert_package("with-readme", Some("Hello")).unwrap();
        s.insert_package("empty", Some("")).unwrap();
        s.insert_package("null", None).unwrap();
        let pkgs = s.fetch_readme_packages().unwrap();
        assert_eq!(pkgs.len(), 1);
        assert_eq!(pkgs[0].name, "with-readme");
        assert_eq!(pkgs[0].readme, "Hello");
    }

    #[test]
    fn missing_analysis_is_none() {
        let s = store(Registry::Npm);
        let id = s.insert_package("a", Some("x")).unwrap();
        assert_eq!(s.find_analysis(id).unwrap(), None);
    }

    #[test]
    fn insert_then_update_analysis() {
        let s = store(Registry::Npm);
        let id = s.insert_package("a", Some("x")).unwrap();
        let created = s
            .insert_analysis(id, ReadmeMetrics { word_count: 10, code_count: 2 })
            .unwrap();
        assert_eq!(s.find_analysis(id).unwrap(), Some(created.clone()));

        let mut loaded = s.find_analysis(id).unwrap().unwrap();
        loaded.word_count = 3;
        loaded.code_count = 0;
        s.update_analysis(&loaded).unwrap();

        let reloaded = s.find_analysis(id).unwrap().unwrap();
        assert_eq!(reloaded.id, created.id);
        assert_eq!(reloaded.word_count, 3);
        assert_eq!(reloaded.code_count, 0);
        assert_eq!(s.count_analyses().unwrap(), 1);
    }

    #[test]
    fn second_analysis_for_package_is_rejected() {
        let s = store(Registry::Pypi);
        let id = s.insert_package("a", Some("x")).unwrap();
        s.insert_analysis(id, ReadmeMetrics::default()).unwrap();
        assert!(s.insert_analysis(id, ReadmeMetrics::default()).is_err());
        assert_eq!(s.count_analyses().unwrap(), 1);
    }

    #[test]
    fn analysis_requires_existing_package() {
        let s = store(Registry::Npm);
        assert!(s.insert_analysis(42, ReadmeMetrics::default()).is_err());
    }

    #[test]
    fn negative_count_is_a_read_error() {
        let s = store(Registry::Npm);
        let id = s.insert_package("a", Some("x")).unwrap();
        s.conn
            .execute(
                "INSERT INTO npmreadmeanalysis (package_id, word_count, code_count) VALUES (?1, -1, 0)",
                params![id],
            )
            .unwrap();
        assert!(s.find_analysis(id).is_err());
    }
}
