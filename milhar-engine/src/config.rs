use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Poids du score de résonance. Les valeurs par défaut sont les constantes de référence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResonanceConfig {
    pub baseline_resistance: f64,
    pub global_weight: f64,
    pub column_weight: f64,
    pub first_prize_weight: f64,
    pub podium_weight: f64,
    pub hit_weight: f64,
    pub repetition_penalty: f64,
    pub repetition_entropy_offset: f64,
    pub session_penalty: f64,
    pub first_rank_window: f64,
    pub window_factor: f64,
}

impl Default for ResonanceConfig {
    fn default() -> Self {
        Self {
            baseline_resistance: 100.0,
            global_weight: 0.4,
            column_weight: 2.8,
            first_prize_weight: 15.0,
            podium_weight: 7.5,
            hit_weight: 60.0,
            repetition_penalty: 35.0,
            repetition_entropy_offset: 1.1,
            session_penalty: 8.0,
            first_rank_window: 2.0,
            window_factor: 4.0,
        }
    }
}

impl ResonanceConfig {
    /// Poids appliqué à la fréquence 1er prix selon le rang.
    pub fn first_prize_factor(&self, rank: usize) -> f64 {
        match rank {
            1 => self.first_prize_weight,
            2 | 3 => self.podium_weight,
            _ => 0.0,
        }
    }

    /// Taille de la fenêtre de tirage aléatoire parmi les chiffres triés.
    pub fn window_size(&self, entropy: f64, rank: usize) -> usize {
        let factor = if rank == 1 { self.first_rank_window } else { self.window_factor };
        let raw = (entropy * factor).floor();
        if raw.is_finite() && raw >= 1.0 {
            raw as usize
        } else {
            1
        }
    }
}

pub fn save_config(config: &ResonanceConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)
        .with_context(|| format!("Impossível gravar {:?}", path))?;
    Ok(())
}

pub fn load_config(path: &Path) -> Result<ResonanceConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossível ler {:?}", path))?;
    let config = serde_json::from_str(&json)
        .with_context(|| format!("JSON inválido em {:?}", path))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_prize_factor() {
        let config = ResonanceConfig::default();
        assert_eq!(config.first_prize_factor(1), 15.0);
        assert_eq!(config.first_prize_factor(2), 7.5);
        assert_eq!(config.first_prize_factor(3), 7.5);
        assert_eq!(config.first_prize_factor(4), 0.0);
        assert_eq!(config.first_prize_factor(7), 0.0);
    }

    #[test]
    fn test_window_size() {
        let config = ResonanceConfig::default();
        assert_eq!(config.window_size(0.0, 1), 1);
        assert_eq!(config.window_size(0.0, 5), 1);
        assert_eq!(config.window_size(0.4, 1), 1);
        assert_eq!(config.window_size(0.4, 2), 1);
        assert_eq!(config.window_size(0.5, 2), 2);
        assert_eq!(config.window_size(1.0, 1), 2);
        assert_eq!(config.window_size(1.0, 4), 4);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ResonanceConfig = serde_json::from_str(r#"{"hit_weight": 10.0}"#).unwrap();
        assert_eq!(config.hit_weight, 10.0);
        assert_eq!(config.column_weight, 2.8);
    }

    #[test]
    fn test_config_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("milhar_config_{}.json", std::process::id()));
        let config = ResonanceConfig { session_penalty: 3.0, ..ResonanceConfig::default() };
        save_config(&config, &path).unwrap();
        let restored = load_config(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(restored, config);
    }
}
