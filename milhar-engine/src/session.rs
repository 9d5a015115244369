use milhar_db::models::{row_to_string, Digit};

/// Valeurs déjà émises pendant un cycle de génération.
///
/// Créé au début d'un cycle et abandonné à la fin : jamais partagé entre deux cycles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionLog {
    used: Vec<String>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, row: &[Digit]) {
        self.used.push(row_to_string(row));
    }

    pub fn contains_digit(&self, digit: Digit) -> bool {
        let c = char::from(b'0' + digit.min(9));
        self.used.iter().any(|value| value.contains(c))
    }

    pub fn values(&self) -> &[String] {
        &self.used
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}
