use milhar_db::models::{
    rank_label, row_to_string, DataSet, HitRecord, HitStatus, PrizeKind, RectificationRecord,
};

/// Valeur minimale (en chiffres) pour qu'une valeur observée soit comparée.
const MIN_ACTUAL_LEN: usize = 3;

/// Compare une valeur générée à la valeur observée.
///
/// Ordre de priorité : égalité exacte, mêmes chiffres dans un autre ordre,
/// puis nombre de positions identiques contre le seuil du type.
pub fn classify(generated: &str, actual: &str, kind: PrizeKind) -> Option<HitStatus> {
    if generated == actual {
        return Some(HitStatus::Exact);
    }

    let mut gen_sorted: Vec<char> = generated.chars().collect();
    let mut act_sorted: Vec<char> = actual.chars().collect();
    gen_sorted.sort_unstable();
    act_sorted.sort_unstable();
    if gen_sorted == act_sorted {
        return Some(HitStatus::Near);
    }

    let matches = actual
        .chars()
        .zip(generated.chars())
        .filter(|(a, g)| a == g)
        .count();
    if matches >= kind.near_hit_threshold() {
        Some(HitStatus::Near)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Absolute,
    Approximation,
    Assimilated,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Absolute => write!(f, "Ressonância absoluta. Ajustes salvos automaticamente no banco neural."),
            Verdict::Approximation => write!(f, "Aproximação detectada. O Oráculo está recalibrando a matriz."),
            Verdict::Assimilated => write!(f, "Dados assimilados. Ajustes de realidade registrados."),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrectionReport {
    pub hits: Vec<HitRecord>,
    pub rectifications: Vec<RectificationRecord>,
}

impl CorrectionReport {
    pub fn verdict(&self) -> Verdict {
        if self.hits.iter().any(|h| h.status == HitStatus::Exact) {
            Verdict::Absolute
        } else if self.hits.iter().any(|h| h.status == HitStatus::Near) {
            Verdict::Approximation
        } else {
            Verdict::Assimilated
        }
    }
}

/// Confronte la matrice générée aux valeurs observées, rang par rang.
///
/// Chaque rang comparé produit une retificação, qu'il y ait acerto ou non.
pub fn auto_correct<S: AsRef<str>>(generated: &DataSet, actual: &[S]) -> CorrectionReport {
    let mut report = CorrectionReport::default();

    for (idx, act) in actual.iter().enumerate() {
        let act = act.as_ref();
        if act.len() < MIN_ACTUAL_LEN {
            continue;
        }
        let Some(row) = generated.get(idx) else {
            log::warn!("Rank {} ausente da matriz gerada", idx + 1);
            continue;
        };
        let rank = idx + 1;
        let gen = row_to_string(row);
        let kind = PrizeKind::for_rank(rank);
        let label = rank_label(rank);

        if let Some(status) = classify(&gen, act, kind) {
            log::info!("{label}: {gen} x {act} -> {status}");
            report.hits.push(HitRecord::new(gen.clone(), kind, rank, status));
        }
        report.rectifications.push(RectificationRecord::new(gen, act, kind, label));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> DataSet {
        vec![
            vec![1, 2, 3, 4],
            vec![5, 6, 7, 8],
            vec![0, 0, 0, 0],
            vec![1, 1, 1, 1],
            vec![2, 2, 2, 2],
            vec![3, 3, 3, 3],
            vec![1, 2, 3],
        ]
    }

    #[test]
    fn test_classify_exact() {
        assert_eq!(classify("1234", "1234", PrizeKind::Milhar), Some(HitStatus::Exact));
    }

    #[test]
    fn test_classify_permutation() {
        assert_eq!(classify("1234", "4321", PrizeKind::Milhar), Some(HitStatus::Near));
    }

    #[test]
    fn test_classify_positional_milhar() {
        assert_eq!(classify("1234", "1235", PrizeKind::Milhar), Some(HitStatus::Near));
        assert_eq!(classify("1234", "1265", PrizeKind::Milhar), None);
    }

    #[test]
    fn test_classify_positional_centena() {
        assert_eq!(classify("123", "124", PrizeKind::Centena), Some(HitStatus::Near));
        assert_eq!(classify("123", "154", PrizeKind::Centena), None);
    }

    #[test]
    fn test_classify_miss() {
        assert_eq!(classify("1234", "5678", PrizeKind::Milhar), None);
    }

    #[test]
    fn test_auto_correct_records_every_compared_rank() {
        let actual = ["5678", "5678", "", "12", "2222", "9999", "124"];
        let report = auto_correct(&matrix(), &actual);

        // Rangs 3 (vide) et 4 (trop court) ignorés
        assert_eq!(report.rectifications.len(), 5);
        assert_eq!(report.rectifications[0].generated, "1234");
        assert_eq!(report.rectifications[0].actual, "5678");
        assert_eq!(report.rectifications[0].rank_label, "1º PRÊMIO");
        assert_eq!(report.rectifications[4].kind, PrizeKind::Centena);

        assert_eq!(report.hits.len(), 3);
        assert_eq!(report.hits[0].position, 2);
        assert_eq!(report.hits[0].status, HitStatus::Exact);
        assert_eq!(report.hits[1].position, 5);
        assert_eq!(report.hits[2].position, 7);
        assert_eq!(report.hits[2].status, HitStatus::Near);
        assert_eq!(report.hits[2].kind, PrizeKind::Centena);
        assert_eq!(report.verdict(), Verdict::Absolute);
    }

    #[test]
    fn test_miss_still_rectified() {
        let report = auto_correct(&matrix(), &["5678"]);
        assert!(report.hits.is_empty());
        assert_eq!(report.rectifications.len(), 1);
        assert_eq!(report.verdict(), Verdict::Assimilated);
    }

    #[test]
    fn test_near_verdict() {
        let report = auto_correct(&matrix(), &["4321"]);
        assert_eq!(report.hits.len(), 1);
        assert_eq!(report.hits[0].value, "1234");
        assert_eq!(report.verdict(), Verdict::Approximation);
    }

    #[test]
    fn test_short_matrix_tolerated() {
        let report = auto_correct(&vec![vec![1, 2, 3, 4]], &["1234", "5678"]);
        assert_eq!(report.rectifications.len(), 1);
        assert_eq!(report.hits.len(), 1);
    }
}
