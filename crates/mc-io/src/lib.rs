#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use mc_data::{DataError, MasterTable};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("csv input has no headers")]
    MissingHeaders,
    #[error("no csv files found under '{dir}'")]
    NoCsvFiles { dir: PathBuf },
    #[error("master file '{path}' has no usable file stem")]
    BadFileName { path: PathBuf },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Read one master file. The file stem becomes the master name; each
/// record becomes a column-name → raw-string mapping.
pub fn read_csv(path: &Path) -> Result<MasterTable, IoError> {
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| IoError::BadFileName {
            path: path.to_owned(),
        })?;

    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(IoError::MissingHeaders);
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let record = row?;
        let mut values = BTreeMap::new();
        for (idx, header) in headers.iter().enumerate() {
            values.insert(
                header.to_owned(),
                record.get(idx).unwrap_or_default().to_owned(),
            );
        }
        records.push(values);
    }

    Ok(MasterTable::from_records(name, records)?)
}

/// Read every `*.csv` under `dir` (recursively) into a table, in sorted
/// path order. An empty scan is an error: a master directory with nothing
/// to validate is a misconfiguration.
pub fn read_csv_dir(dir: &Path) -> Result<Vec<MasterTable>, IoError> {
    let mut paths = collect_csv_paths(dir)?;
    if paths.is_empty() {
        return Err(IoError::NoCsvFiles {
            dir: dir.to_owned(),
        });
    }
    paths.sort();
    paths.iter().map(|path| read_csv(path)).collect()
}

fn collect_csv_paths(dir: &Path) -> Result<Vec<PathBuf>, IoError> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            out.extend(collect_csv_paths(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "csv") {
            out.push(path);
        }
    }
    Ok(out)
}

/// Read the rule file for `master_name`: `<rules_dir>/<master_name>.txt`,
/// one DSL line per entry, order preserved.
pub fn read_rule_lines(rules_dir: &Path, master_name: &str) -> Result<Vec<String>, IoError> {
    let path = rules_dir.join(master_name).with_extension("txt");
    let content = fs::read_to_string(&path)?;
    Ok(content.lines().map(str::to_owned).collect())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use mc_data::{DataError, MasterTable};
    use tempfile::tempdir;

    use super::{IoError, read_csv, read_csv_dir, read_rule_lines};

    #[test]
    fn read_csv_builds_a_named_table() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("character.csv");
        fs::write(&path, "id,name,x\n1,alpha,3\n2,beta,6\n").expect("write");

        let table = read_csv(&path).expect("read");
        assert_eq!(table.name(), "character");
        assert_eq!(table.count(), 2);
        assert_eq!(
            table
                .find_by_pk(2)
                .expect("row")
                .get("name")
                .expect("name"),
            "beta"
        );
    }

    #[test]
    fn read_csv_fails_fast_on_a_record_without_id() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("broken.csv");
        fs::write(&path, "name,x\nalpha,3\n").expect("write");

        let err = read_csv(&path).expect_err("must fail");
        assert!(matches!(err, IoError::Data(DataError::MissingIdColumn)));
    }

    #[test]
    fn read_csv_dir_scans_recursively_in_sorted_order() {
        let dir = tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("nested")).expect("mkdir");
        fs::write(dir.path().join("b.csv"), "id\n1\n").expect("write");
        fs::write(dir.path().join("nested/a.csv"), "id\n1\n2\n").expect("write");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let tables = read_csv_dir(dir.path()).expect("read");
        let names = tables.iter().map(MasterTable::name).collect::<Vec<_>>();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(tables[1].count(), 2);
    }

    #[test]
    fn read_csv_dir_rejects_a_directory_without_csv_files() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let err = read_csv_dir(dir.path()).expect_err("must fail");
        assert!(matches!(err, IoError::NoCsvFiles { .. }));
    }

    #[test]
    fn rule_lines_come_back_in_file_order() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join("character.txt"),
            "equal_filter(kind, 1) > count_validation(2)\ncount_validation(1)\n",
        )
        .expect("write");

        let lines = read_rule_lines(dir.path(), "character").expect("read");
        assert_eq!(
            lines,
            vec![
                "equal_filter(kind, 1) > count_validation(2)",
                "count_validation(1)",
            ]
        );
    }

    #[test]
    fn missing_rule_file_surfaces_the_io_error() {
        let dir = tempdir().expect("tempdir");
        let err = read_rule_lines(dir.path(), "absent").expect_err("must fail");
        assert!(matches!(err, IoError::Io(_)));
    }
}
