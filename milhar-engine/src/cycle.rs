use rand::Rng;

use milhar_db::models::{
    row_to_string, AdvancedPredictions, Candidate, CombinedAnalysis, DataSet, HitRecord,
    Prediction, RectificationRecord, CENTENA_RANK, DATASET_ROWS,
};

use crate::config::ResonanceConfig;
use crate::frequency::{analyze, combine, flatten};
use crate::resonance::Scorer;
use crate::sequence::generate_sequence;
use crate::session::SessionLog;

const CANDIDATE_COUNT: usize = 3;
const CANDIDATE_ENTROPY_SCALE: f64 = 0.4;
const CANDIDATE_BASE_CONFIDENCE: f64 = 99.85;
const CANDIDATE_CONFIDENCE_SPREAD: f64 = 0.14;

/// Famille de prédictions avancées : une entrée (entropie, confiance) par valeur.
struct Family {
    length: usize,
    profile: &'static [(f64, f64)],
}

const HUNDREDS: Family = Family { length: 3, profile: &[(0.05, 99.98); 3] };
const TENS: Family = Family { length: 2, profile: &[(0.1, 99.95); 3] };
const ELITE_TENS: Family = Family { length: 2, profile: &[(0.02, 99.99), (0.06, 99.97)] };
const SUPER_TENS: Family = Family { length: 2, profile: &[(0.04, 99.96); 3] };

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationCycle {
    pub result: DataSet,
    pub candidates: Vec<Candidate>,
    pub advanced_predictions: AdvancedPredictions,
    pub analysis: CombinedAnalysis,
}

fn build_family<R: Rng + ?Sized>(
    scorer: &Scorer<'_>,
    family: &Family,
    session: &mut SessionLog,
    rng: &mut R,
) -> Vec<Prediction> {
    family
        .profile
        .iter()
        .map(|&(entropy, confidence)| {
            let row = generate_sequence(scorer, entropy, 1, family.length, session, rng);
            Prediction {
                value: row_to_string(&row),
                confidence,
            }
        })
        .collect()
}

/// Un cycle complet : analyse unique, matrice principale, tríade et prédictions avancées.
///
/// Toutes les générations partagent le même journal de session, créé ici.
pub fn run_cycle<R: Rng + ?Sized>(
    modules: &[DataSet],
    history: &[DataSet],
    hits: &[HitRecord],
    rectifications: &[RectificationRecord],
    entropy: f64,
    config: &ResonanceConfig,
    rng: &mut R,
) -> GenerationCycle {
    let rows = flatten(modules, history);
    let analysis = combine(analyze(&rows));
    log::debug!(
        "Ciclo: {} linhas, {} acertos, {} retificações, entropia {:.2}",
        rows.len(),
        hits.len(),
        rectifications.len(),
        entropy
    );

    let scorer = Scorer::new(&analysis, hits, config);
    let mut session = SessionLog::new();

    let result: DataSet = (1..=DATASET_ROWS)
        .map(|rank| {
            let length = if rank == CENTENA_RANK { 3 } else { 4 };
            generate_sequence(&scorer, entropy, rank, length, &mut session, rng)
        })
        .collect();

    let candidates: Vec<Candidate> = (0..CANDIDATE_COUNT)
        .map(|_| {
            let sequence = generate_sequence(
                &scorer,
                entropy * CANDIDATE_ENTROPY_SCALE,
                1,
                4,
                &mut session,
                rng,
            );
            let confidence = CANDIDATE_BASE_CONFIDENCE + rng.random::<f64>() * CANDIDATE_CONFIDENCE_SPREAD;
            Candidate { sequence, confidence }
        })
        .collect();

    let advanced_predictions = AdvancedPredictions {
        hundreds: build_family(&scorer, &HUNDREDS, &mut session, rng),
        tens: build_family(&scorer, &TENS, &mut session, rng),
        elite_tens: build_family(&scorer, &ELITE_TENS, &mut session, rng),
        super_tens: build_family(&scorer, &SUPER_TENS, &mut session, rng),
    };
    log::debug!("Sessão encerrada com {} valores emitidos", session.len());

    GenerationCycle {
        result,
        candidates,
        advanced_predictions,
        analysis,
    }
}
