use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Chiffre 0..=9.
pub type Digit = u8;
/// Une ligne de tirage : 4 chiffres (milhar) ou 3 chiffres (centena, 7e rang).
pub type Row = Vec<Digit>;
/// Un tirage complet : 6 lignes de 4 chiffres + 1 ligne de 3 chiffres.
pub type DataSet = Vec<Row>;
/// Les 7 lignes brutes d'un module de saisie.
pub type ModuleLines = [String; DATASET_ROWS];

pub const DATASET_ROWS: usize = 7;
pub const CENTENA_RANK: usize = 7;
pub const HISTORY_CAP: usize = 300;
pub const NAVIGATION_CAP: usize = 50;
pub const COLUMNS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrizeKind {
    Milhar,
    Centena,
    Dezena,
}

impl PrizeKind {
    pub fn for_rank(rank: usize) -> Self {
        if rank == CENTENA_RANK {
            PrizeKind::Centena
        } else {
            PrizeKind::Milhar
        }
    }

    pub fn digits(&self) -> usize {
        match self {
            PrizeKind::Milhar => 4,
            PrizeKind::Centena => 3,
            PrizeKind::Dezena => 2,
        }
    }

    /// Nombre de positions identiques à partir duquel on parle de quase acerto.
    pub fn near_hit_threshold(&self) -> usize {
        match self {
            PrizeKind::Milhar => 3,
            PrizeKind::Centena | PrizeKind::Dezena => 2,
        }
    }
}

impl std::fmt::Display for PrizeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrizeKind::Milhar => write!(f, "Milhar"),
            PrizeKind::Centena => write!(f, "Centena"),
            PrizeKind::Dezena => write!(f, "Dezena"),
        }
    }
}

impl std::str::FromStr for PrizeKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "milhar" | "m" => Ok(PrizeKind::Milhar),
            "centena" | "c" => Ok(PrizeKind::Centena),
            "dezena" | "d" => Ok(PrizeKind::Dezena),
            other => bail!("Tipo desconhecido : '{}' (milhar, centena, dezena)", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitStatus {
    #[serde(rename = "Acerto")]
    Exact,
    #[serde(rename = "Quase Acerto")]
    Near,
}

impl std::fmt::Display for HitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HitStatus::Exact => write!(f, "Acerto"),
            HitStatus::Near => write!(f, "Quase Acerto"),
        }
    }
}

pub fn rank_label(rank: usize) -> String {
    format!("{rank}º PRÊMIO")
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitRecord {
    pub id: Uuid,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: PrizeKind,
    pub position: usize,
    pub status: HitStatus,
    pub timestamp: i64,
}

impl HitRecord {
    pub fn new(value: impl Into<String>, kind: PrizeKind, position: usize, status: HitStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            value: value.into(),
            kind,
            position,
            status,
            timestamp: now_millis(),
        }
    }

    pub fn is_exact(&self) -> bool {
        self.status == HitStatus::Exact
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectificationRecord {
    pub id: Uuid,
    pub generated: String,
    pub actual: String,
    #[serde(rename = "type")]
    pub kind: PrizeKind,
    pub rank_label: String,
    pub timestamp: i64,
}

impl RectificationRecord {
    pub fn new(
        generated: impl Into<String>,
        actual: impl Into<String>,
        kind: PrizeKind,
        rank_label: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            generated: generated.into(),
            actual: actual.into(),
            kind,
            rank_label: rank_label.into(),
            timestamp: now_millis(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrequencyTable([u32; 10]);

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, digit: Digit) {
        if let Some(count) = self.0.get_mut(digit as usize) {
            *count += 1;
        }
    }

    pub fn get(&self, digit: Digit) -> u32 {
        self.0.get(digit as usize).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    pub fn counts(&self) -> &[u32; 10] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvenOdd {
    pub evens: u32,
    pub odds: u32,
}

impl EvenOdd {
    pub fn record(&mut self, digit: Digit) {
        if digit % 2 == 0 {
            self.evens += 1;
        } else {
            self.odds += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub row_sums: Vec<u32>,
    pub row_even_odd: Vec<EvenOdd>,
    pub row_digit_freq: Vec<FrequencyTable>,
    pub col_digit_freq: [FrequencyTable; COLUMNS],
    pub global_digit_freq: FrequencyTable,
    pub first_prize_freq: FrequencyTable,
    pub total_even_odd: EvenOdd,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoricalAnalysis {
    pub historical_digit_freq: FrequencyTable,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CombinedAnalysis {
    pub input_analysis: AnalysisResult,
    pub historical_analysis: HistoricalAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub sequence: Row,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub value: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdvancedPredictions {
    pub hundreds: Vec<Prediction>,
    pub tens: Vec<Prediction>,
    pub elite_tens: Vec<Prediction>,
    pub super_tens: Vec<Prediction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub entropy: f64,
    pub voice_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            entropy: 0.4,
            voice_enabled: true,
        }
    }
}

impl Settings {
    pub fn with_entropy(mut self, entropy: f64) -> Self {
        self.entropy = if entropy.is_finite() { entropy.clamp(0.0, 1.0) } else { 0.0 };
        self
    }
}

/// Les trois modules de saisie : CORE-A, CORE-B (lecture seule) et ONDA-REAL.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleSlots {
    pub core_a: ModuleLines,
    pub core_b: ModuleLines,
    pub live: ModuleLines,
}

impl ModuleSlots {
    pub fn as_vectors(&self) -> [&ModuleLines; 3] {
        [&self.core_a, &self.core_b, &self.live]
    }

    /// Décale les modules : A <- B, B <- live, live <- nouvelles valeurs.
    pub fn rotate(&self, incoming: ModuleLines) -> Self {
        Self {
            core_a: self.core_b.clone(),
            core_b: self.live.clone(),
            live: incoming,
        }
    }
}

/// Historique de navigation (précédent/suivant) du module ONDA-REAL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleNavigation {
    pub entries: Vec<ModuleLines>,
    pub cursor: usize,
}

impl Default for ModuleNavigation {
    fn default() -> Self {
        Self {
            entries: vec![ModuleLines::default()],
            cursor: 0,
        }
    }
}

impl ModuleNavigation {
    pub fn push(&mut self, lines: ModuleLines) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(lines);
        if self.entries.len() > NAVIGATION_CAP {
            let excess = self.entries.len() - NAVIGATION_CAP;
            self.entries.drain(..excess);
        }
        self.cursor = self.entries.len() - 1;
    }

    pub fn back(&mut self) -> Option<&ModuleLines> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    pub fn forward(&mut self) -> Option<&ModuleLines> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }
}

pub fn expected_line_len(index: usize) -> usize {
    if index == DATASET_ROWS - 1 {
        3
    } else {
        4
    }
}

/// Une ligne est valide si elle contient exactement le nombre de chiffres attendu.
pub fn is_valid_line(index: usize, line: &str) -> bool {
    line.len() == expected_line_len(index) && line.chars().all(|c| c.is_ascii_digit())
}

pub fn row_to_string(row: &[Digit]) -> String {
    row.iter().map(|d| d.to_string()).collect()
}
