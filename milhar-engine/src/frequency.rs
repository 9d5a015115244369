use milhar_db::models::{
    AnalysisResult, CombinedAnalysis, DataSet, EvenOdd, FrequencyTable, HistoricalAnalysis, Row,
    DATASET_ROWS,
};

/// Analyse un ensemble aplati de lignes.
///
/// Une ligne dont l'index aplati est multiple de 7 est le 1er prix de son tirage.
/// Les lignes vides sont ignorées mais comptent dans l'index.
pub fn analyze(rows: &[Row]) -> AnalysisResult {
    let mut result = AnalysisResult::default();

    for (row_index, row) in rows.iter().enumerate() {
        if row.is_empty() {
            continue;
        }
        let is_head = row_index % DATASET_ROWS == 0;

        let mut row_freq = FrequencyTable::new();
        let mut row_parity = EvenOdd::default();
        let mut row_sum = 0u32;

        for (col, &digit) in row.iter().enumerate() {
            result.global_digit_freq.increment(digit);
            if let Some(column) = result.col_digit_freq.get_mut(col) {
                column.increment(digit);
            }
            if is_head {
                result.first_prize_freq.increment(digit);
            }
            result.total_even_odd.record(digit);

            row_freq.increment(digit);
            row_parity.record(digit);
            row_sum += digit as u32;
        }

        result.row_sums.push(row_sum);
        result.row_even_odd.push(row_parity);
        result.row_digit_freq.push(row_freq);
    }

    result
}

/// Aplatit les modules puis l'historique en une seule suite de lignes.
pub fn flatten(modules: &[DataSet], history: &[DataSet]) -> Vec<Row> {
    modules
        .iter()
        .chain(history.iter())
        .flat_map(|set| set.iter().cloned())
        .collect()
}

/// La vue historique reprend la table globale : aucune analyse séparée n'existe encore.
pub fn combine(input_analysis: AnalysisResult) -> CombinedAnalysis {
    let historical_analysis = HistoricalAnalysis {
        historical_digit_freq: input_analysis.global_digit_freq,
    };
    CombinedAnalysis {
        input_analysis,
        historical_analysis,
    }
}
