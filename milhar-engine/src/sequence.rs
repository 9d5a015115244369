use rand::Rng;

use milhar_db::models::{Digit, Row, COLUMNS};

use crate::resonance::{Scorer, Slot};
use crate::session::SessionLog;

/// Ne garde que les `length` derniers chiffres (4 -> tout, 3 -> [1..4], 2 -> [2..4]).
pub fn truncate(sequence: &[Digit], length: usize) -> Row {
    let start = sequence.len().saturating_sub(length.clamp(1, COLUMNS));
    sequence[start..].to_vec()
}

/// Construit une séquence de 4 chiffres position par position puis la tronque.
///
/// Le résultat tronqué est ajouté au journal de session.
pub fn generate_sequence<R: Rng + ?Sized>(
    scorer: &Scorer<'_>,
    entropy: f64,
    rank: usize,
    length: usize,
    session: &mut SessionLog,
    rng: &mut R,
) -> Row {
    let mut sequence: Row = Vec::with_capacity(COLUMNS);
    for position in 0..COLUMNS {
        let slot = Slot {
            entropy,
            position,
            rank,
            prior: &sequence,
        };
        let digit = scorer.choose_digit(&slot, session, rng);
        sequence.push(digit);
    }

    let result = truncate(&sequence, length);
    session.record(&result);
    result
}
