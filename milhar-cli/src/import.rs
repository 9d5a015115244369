use anyhow::{bail, Context, Result};
use std::path::Path;

use milhar_db::models::{DataSet, DATASET_ROWS};
use milhar_engine::input::{module_is_stable, parse_module};

fn parse_record(record: &csv::StringRecord) -> Result<DataSet> {
    if record.len() < DATASET_ROWS {
        bail!("Esperados {} campos, recebidos {}", DATASET_ROWS, record.len());
    }
    let lines: Vec<String> = (0..DATASET_ROWS)
        .map(|idx| {
            record
                .get(idx)
                .map(|s| s.chars().filter(|c| !c.is_whitespace()).collect::<String>())
                .with_context(|| format!("Campo ausente no índice {}", idx))
        })
        .collect::<Result<_>>()?;

    if !module_is_stable(lines.as_slice()) {
        bail!("Resultado instável: {}", lines.join(" "));
    }
    Ok(parse_module(lines.as_slice()))
}

pub struct ImportResult {
    pub total_records: u32,
    pub imported: u32,
    pub errors: u32,
}

/// Lit un fichier `;` : une ligne par tirage, du plus récent au plus ancien.
pub fn read_history(path: &Path) -> Result<(Vec<DataSet>, ImportResult)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossível abrir {:?}", path))?;

    let mut sets = Vec::new();
    let mut result = ImportResult {
        total_records: 0,
        imported: 0,
        errors: 0,
    };

    for record_result in reader.records() {
        result.total_records += 1;
        match record_result {
            Ok(record) => match parse_record(&record) {
                Ok(set) => {
                    sets.push(set);
                    result.imported += 1;
                }
                Err(e) => {
                    log::warn!("Erro na linha {}: {}", result.total_records, e);
                    result.errors += 1;
                }
            },
            Err(e) => {
                log::warn!("Erro de leitura na linha {}: {}", result.total_records, e);
                result.errors += 1;
            }
        }
    }

    Ok((sets, result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_ok() {
        let record = csv::StringRecord::from(vec!["1234", " 5678", "9012", "3456", "7890", "1111", "222"]);
        let set = parse_record(&record).unwrap();
        assert_eq!(set.len(), 7);
        assert_eq!(set[1], vec![5, 6, 7, 8]);
        assert_eq!(set[6], vec![2, 2, 2]);
    }

    #[test]
    fn test_parse_record_too_short() {
        let record = csv::StringRecord::from(vec!["1234", "5678"]);
        assert!(parse_record(&record).is_err());
    }

    #[test]
    fn test_parse_record_unstable() {
        let record = csv::StringRecord::from(vec!["1234", "5678", "9012", "3456", "7890", "1111", "2222"]);
        assert!(parse_record(&record).is_err());
    }

    #[test]
    fn test_read_history_counts_errors() {
        let path = std::env::temp_dir().join(format!("milhar_import_{}.csv", std::process::id()));
        std::fs::write(
            &path,
            "1234;5678;9012;3456;7890;1111;222\nxx;5678\n4321;8765;2109;6543;0987;2222;333\n",
        ).unwrap();
        let (sets, result) = read_history(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(result.total_records, 3);
        assert_eq!(result.imported, 2);
        assert_eq!(result.errors, 1);
        assert_eq!(sets[0][0], vec![1, 2, 3, 4]);
        assert_eq!(sets[1][6], vec![3, 3, 3]);
    }
}
