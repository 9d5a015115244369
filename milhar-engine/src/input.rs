use milhar_db::models::{expected_line_len, is_valid_line, DataSet, ModuleLines, Row, DATASET_ROWS};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedModules {
    pub modules: Vec<DataSet>,
    /// Diagnostics consultatifs : ils ne bloquent jamais la génération.
    pub errors: Vec<String>,
}

/// Convertit une ligne en chiffres. Toute ligne contenant autre chose qu'un chiffre devient vide.
pub fn parse_line(line: &str) -> Row {
    let line = line.trim();
    if !line.chars().all(|c| c.is_ascii_digit()) {
        return Row::new();
    }
    line.bytes().map(|b| b - b'0').collect()
}

pub fn module_is_stable<S: AsRef<str>>(lines: &[S]) -> bool {
    lines.len() == DATASET_ROWS
        && lines
            .iter()
            .enumerate()
            .all(|(idx, line)| is_valid_line(idx, line.as_ref()))
}

pub fn parse_module<S: AsRef<str>>(lines: &[S]) -> DataSet {
    lines.iter().map(|line| parse_line(line.as_ref())).collect()
}

pub fn parse_modules(vectors: &[&ModuleLines]) -> ParsedModules {
    let mut parsed = ParsedModules::default();
    for (idx, lines) in vectors.iter().enumerate() {
        if !module_is_stable(lines.as_slice()) {
            parsed.errors.push(format!("Vetor {} instável.", idx + 1));
        }
        parsed.modules.push(parse_module(lines.as_slice()));
    }
    parsed
}

/// Nettoie une saisie manuelle : chiffres seulement, tronqués à la taille de la ligne.
pub fn sanitize_line(index: usize, raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(expected_line_len(index))
        .collect()
}

/// Normalise un texte collé (une valeur par ligne) vers les 7 lignes d'un module.
///
/// Les lignes manquantes reprennent la valeur courante.
pub fn normalize_paste(text: &str, current: &ModuleLines) -> ModuleLines {
    let lines: Vec<String> = text
        .lines()
        .map(|l| l.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|l| !l.is_empty())
        .take(DATASET_ROWS)
        .collect();

    std::array::from_fn(|i| match lines.get(i) {
        Some(line) => line.chars().take(expected_line_len(i)).collect(),
        None => current[i].clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(values: [&str; 7]) -> ModuleLines {
        values.map(String::from)
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("0427"), vec![0, 4, 2, 7]);
        assert_eq!(parse_line(" 12 "), vec![1, 2]);
        assert!(parse_line("").is_empty());
        assert!(parse_line("12a4").is_empty());
    }

    #[test]
    fn test_parse_modules_valid() {
        let m = module(["1234", "5678", "9012", "3456", "7890", "1111", "222"]);
        let parsed = parse_modules(&[&m]);
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.modules[0].len(), 7);
        assert_eq!(parsed.modules[0][6], vec![2, 2, 2]);
    }

    #[test]
    fn test_parse_modules_reports_but_converts() {
        let good = module(["1234", "5678", "9012", "3456", "7890", "1111", "222"]);
        let bad = module(["1234", "", "12", "x234", "7890", "1111", "2222"]);
        let parsed = parse_modules(&[&good, &bad, &ModuleLines::default()]);
        assert_eq!(parsed.errors, vec!["Vetor 2 instável.".to_string(), "Vetor 3 instável.".to_string()]);
        assert_eq!(parsed.modules.len(), 3);
        assert!(parsed.modules[1][1].is_empty());
        assert_eq!(parsed.modules[1][2], vec![1, 2]);
        assert!(parsed.modules[1][3].is_empty());
        assert_eq!(parsed.modules[1][6], vec![2, 2, 2, 2]);
        assert!(parsed.modules[2].iter().all(|r| r.is_empty()));
    }

    #[test]
    fn test_sanitize_line() {
        assert_eq!(sanitize_line(0, "12-34-56"), "1234");
        assert_eq!(sanitize_line(6, "9876"), "987");
        assert_eq!(sanitize_line(2, "abc"), "");
    }

    #[test]
    fn test_normalize_paste() {
        let current = module(["0000", "1111", "2222", "3333", "4444", "5555", "666"]);
        let pasted = normalize_paste("12 34\r\n\n56789\n  \n4321", &current);
        assert_eq!(pasted[0], "1234");
        assert_eq!(pasted[1], "5678");
        assert_eq!(pasted[2], "4321");
        assert_eq!(pasted[3], "3333");
        assert_eq!(pasted[6], "666");
    }

    #[test]
    fn test_normalize_paste_centena_truncated() {
        let text = "1111\n2222\n3333\n4444\n5555\n6666\n7777\n8888";
        let pasted = normalize_paste(text, &ModuleLines::default());
        assert_eq!(pasted[5], "6666");
        assert_eq!(pasted[6], "777");
    }
}
