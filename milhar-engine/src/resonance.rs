use std::cmp::Ordering;

use rand::Rng;

use milhar_db::models::{CombinedAnalysis, Digit, HitRecord};

use crate::config::ResonanceConfig;
use crate::session::SessionLog;

/// Paramètres propres à une position dans une séquence.
#[derive(Debug, Clone, Copy)]
pub struct Slot<'a> {
    pub entropy: f64,
    /// Colonne 0..=3
    pub position: usize,
    /// Rang 1..=7
    pub rank: usize,
    pub prior: &'a [Digit],
}

/// Score de résonance par chiffre : plus la résistance est basse, plus le chiffre est favori.
pub struct Scorer<'a> {
    analysis: &'a CombinedAnalysis,
    hits: &'a [HitRecord],
    config: &'a ResonanceConfig,
}

impl<'a> Scorer<'a> {
    pub fn new(analysis: &'a CombinedAnalysis, hits: &'a [HitRecord], config: &'a ResonanceConfig) -> Self {
        Self { analysis, hits, config }
    }

    /// Nombre d'acertos exacts enregistrés à ce rang dont la valeur contient le chiffre.
    pub fn historic_weight(&self, digit: Digit, rank: usize) -> usize {
        let needle = char::from(b'0' + digit.min(9));
        self.hits
            .iter()
            .filter(|h| h.position == rank && h.is_exact())
            .filter(|h| h.value.contains(needle))
            .count()
    }

    pub fn resonance(&self, digit: Digit, slot: &Slot<'_>, session: &SessionLog) -> f64 {
        let input = &self.analysis.input_analysis;
        let cfg = self.config;

        let mut resonance = input.global_digit_freq.get(digit) as f64 * cfg.global_weight;
        resonance += input
            .col_digit_freq
            .get(slot.position)
            .map_or(0, |col| col.get(digit)) as f64
            * cfg.column_weight;
        resonance += input.first_prize_freq.get(digit) as f64 * cfg.first_prize_factor(slot.rank);
        resonance += self.historic_weight(digit, slot.rank) as f64 * cfg.hit_weight;

        if slot.prior.contains(&digit) {
            resonance -= cfg.repetition_penalty * (cfg.repetition_entropy_offset - slot.entropy);
        }
        if session.contains_digit(digit) {
            resonance -= cfg.session_penalty;
        }

        resonance
    }

    pub fn resistances(&self, slot: &Slot<'_>, session: &SessionLog) -> [f64; 10] {
        let mut map = [self.config.baseline_resistance; 10];
        for (digit, resistance) in map.iter_mut().enumerate() {
            *resistance -= self.resonance(digit as Digit, slot, session) / (1.0 + slot.entropy);
        }
        map
    }

    /// Chiffres triés par résistance croissante ; à égalité, le plus petit chiffre d'abord.
    pub fn ranked_digits(&self, slot: &Slot<'_>, session: &SessionLog) -> [Digit; 10] {
        let resistances = self.resistances(slot, session);
        let mut order: [Digit; 10] = std::array::from_fn(|d| d as Digit);
        order.sort_by(|&a, &b| {
            resistances[a as usize]
                .partial_cmp(&resistances[b as usize])
                .unwrap_or(Ordering::Equal)
        });
        order
    }

    pub fn choose_digit<R: Rng + ?Sized>(&self, slot: &Slot<'_>, session: &SessionLog, rng: &mut R) -> Digit {
        let ranked = self.ranked_digits(slot, session);
        let window = self.config.window_size(slot.entropy, slot.rank);
        let pick = rng.random_range(0..window);
        ranked.get(pick).copied().unwrap_or(ranked[0])
    }
}
