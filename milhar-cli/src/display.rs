use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::import::ImportResult;
use milhar_db::models::{
    rank_label, row_to_string, AdvancedPredictions, AnalysisResult, Candidate, DataSet, HitRecord,
    HitStatus, ModuleLines, ModuleSlots, Prediction, PrizeKind, RectificationRecord, Settings,
};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&chrono::Local).format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn show_line(line: &str) -> &str {
    if line.is_empty() { "----" } else { line }
}

pub fn display_matrix(result: &DataSet) {
    println!("\n🎯 Matriz prevista\n");
    let mut table = new_table(vec!["Prêmio", "Valor", "Tipo"]);
    for (idx, row) in result.iter().enumerate() {
        let rank = idx + 1;
        let value = Cell::new(row_to_string(row));
        let value = if rank <= 3 { value.fg(Color::Yellow) } else { value };
        table.add_row(vec![
            Cell::new(rank_label(rank)),
            value,
            Cell::new(PrizeKind::for_rank(rank)),
        ]);
    }
    println!("{table}");
}

pub fn display_candidates(candidates: &[Candidate]) {
    println!("\n💎 Tríade de milhares elite\n");
    let mut table = new_table(vec!["#", "Milhar", "Confiança"]);
    for (i, c) in candidates.iter().enumerate() {
        table.add_row(vec![
            format!("{}", i + 1),
            row_to_string(&c.sequence),
            format!("{:.2}%", c.confidence),
        ]);
    }
    println!("{table}");
}

fn add_predictions(table: &mut Table, family: &str, predictions: &[Prediction]) {
    for p in predictions {
        table.add_row(vec![family.to_string(), p.value.clone(), format!("{:.2}%", p.confidence)]);
    }
}

pub fn display_advanced(advanced: &AdvancedPredictions) {
    println!("\n🔮 Predições avançadas\n");
    let mut table = new_table(vec!["Família", "Valor", "Confiança"]);
    add_predictions(&mut table, "Centenas", &advanced.hundreds);
    add_predictions(&mut table, "Dezenas", &advanced.tens);
    add_predictions(&mut table, "Dezenas elite", &advanced.elite_tens);
    add_predictions(&mut table, "Super dezenas", &advanced.super_tens);
    println!("{table}");
}

pub fn display_modules(modules: &ModuleSlots, locked: bool) {
    let mut table = new_table(vec!["#", "CORE-A", "CORE-B", "ONDA-REAL"]);
    for idx in 0..modules.live.len() {
        table.add_row(vec![
            if idx == 6 { "7º".to_string() } else { format!("{}", idx + 1) },
            show_line(&modules.core_a[idx]).to_string(),
            show_line(&modules.core_b[idx]).to_string(),
            show_line(&modules.live[idx]).to_string(),
        ]);
    }
    println!("{table}");
    if locked {
        println!("Matriz manifestada (bloqueada).");
    }
}

pub fn display_history(history: &[DataSet], last: usize) {
    if history.is_empty() {
        println!("Histórico vazio.");
        return;
    }
    let mut table = new_table(vec!["#", "1º", "2º", "3º", "4º", "5º", "6º", "7º"]);
    for (i, set) in history.iter().take(last).enumerate() {
        let mut row = vec![format!("{i}")];
        row.extend(set.iter().map(|r| show_line(&row_to_string(r)).to_string()));
        table.add_row(row);
    }
    println!("{table}");
    println!("{} entradas no total", history.len());
}

pub fn display_hits(hits: &[HitRecord]) {
    if hits.is_empty() {
        println!("Nenhum acerto registrado.");
        return;
    }
    let mut table = new_table(vec!["#", "Valor", "Tipo", "Posição", "Status", "Data"]);
    for (i, hit) in hits.iter().enumerate() {
        let color = match hit.status {
            HitStatus::Exact => Color::Green,
            HitStatus::Near => Color::Yellow,
        };
        table.add_row(vec![
            Cell::new(i),
            Cell::new(&hit.value),
            Cell::new(hit.kind),
            Cell::new(format!("{}º", hit.position)),
            Cell::new(hit.status).fg(color),
            Cell::new(format_timestamp(hit.timestamp)),
        ]);
    }
    println!("{table}");
}

pub fn display_rectifications(rects: &[RectificationRecord]) {
    if rects.is_empty() {
        println!("Nenhuma retificação registrada.");
        return;
    }
    let mut table = new_table(vec!["#", "Prêmio", "Gerado", "Real", "Tipo", "Data"]);
    for (i, r) in rects.iter().enumerate() {
        table.add_row(vec![
            i.to_string(),
            r.rank_label.clone(),
            r.generated.clone(),
            r.actual.clone(),
            r.kind.to_string(),
            format_timestamp(r.timestamp),
        ]);
    }
    println!("{table}");
}

pub fn display_stats(analysis: &AnalysisResult, rows: usize) {
    println!("\n📊 Frequências sobre {rows} linhas\n");
    let mut table = new_table(vec!["Dígito", "Global", "1º prêmio", "Col 1", "Col 2", "Col 3", "Col 4"]);
    for digit in 0..10u8 {
        let mut row = vec![
            digit.to_string(),
            analysis.global_digit_freq.get(digit).to_string(),
            analysis.first_prize_freq.get(digit).to_string(),
        ];
        row.extend(analysis.col_digit_freq.iter().map(|c| c.get(digit).to_string()));
        table.add_row(row);
    }
    println!("{table}");
    println!(
        "Pares : {}  Ímpares : {}",
        analysis.total_even_odd.evens, analysis.total_even_odd.odds
    );
}

pub fn display_settings(settings: &Settings) {
    println!("Entropia : {:.0}%", settings.entropy * 100.0);
    println!("Voz      : {}", if settings.voice_enabled { "ativada" } else { "desativada" });
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Importação concluída :");
    println!("  Linhas lidas : {}", result.total_records);
    println!("  Importadas   : {}", result.imported);
    if result.errors > 0 {
        println!("  Erros        : {}", result.errors);
    }
}

pub fn display_pasted(lines: &ModuleLines) {
    let joined: Vec<&str> = lines.iter().map(|l| show_line(l)).collect();
    println!("Resultado recebido : {}", joined.join(" "));
}
