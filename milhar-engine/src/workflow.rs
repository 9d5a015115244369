use anyhow::{bail, Result};
use rand::Rng;

use milhar_db::db::{LastGeneration, Mutation, StoreSnapshot};
use milhar_db::models::{
    HitRecord, HitStatus, ModuleLines, PrizeKind, RectificationRecord, Settings, DATASET_ROWS,
};

use crate::config::ResonanceConfig;
use crate::cycle::{run_cycle, GenerationCycle};
use crate::input::{parse_module, parse_modules, sanitize_line};
use crate::rectify::{auto_correct, CorrectionReport, Verdict};

/// Lance un cycle sur la photo du store. Refusé tant que la matrice est verrouillée.
pub fn generate<R: Rng + ?Sized>(
    snapshot: &StoreSnapshot,
    config: &ResonanceConfig,
    rng: &mut R,
) -> Result<(GenerationCycle, Vec<Mutation>)> {
    if snapshot.locked {
        bail!("Matriz já manifestada. Informe um novo resultado ou desbloqueie antes de gerar.");
    }

    let parsed = parse_modules(&snapshot.modules.as_vectors());
    for error in &parsed.errors {
        log::warn!("{error}");
    }

    let cycle = run_cycle(
        &parsed.modules,
        &snapshot.history,
        &snapshot.hits,
        &snapshot.rectifications,
        snapshot.settings.entropy,
        config,
        rng,
    );
    log::info!("Matriz gerada ({} entradas no histórico)", snapshot.history.len());

    let mutations = vec![
        Mutation::SetLastGeneration(Box::new(LastGeneration {
            result: cycle.result.clone(),
            candidates: cycle.candidates.clone(),
            advanced: cycle.advanced_predictions.clone(),
            analysis: cycle.analysis.clone(),
        })),
        Mutation::SetLocked(true),
    ];
    Ok((cycle, mutations))
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub report: Option<CorrectionReport>,
    pub mutations: Vec<Mutation>,
}

impl IngestOutcome {
    pub fn verdict(&self) -> Verdict {
        self.report.as_ref().map_or(Verdict::Assimilated, |r| r.verdict())
    }
}

/// Intègre un tirage observé : correction automatique, rotation des modules,
/// navigation, historique, déverrouillage.
pub fn ingest_draw(snapshot: &StoreSnapshot, values: ModuleLines) -> IngestOutcome {
    let mut mutations = Vec::new();

    let report = snapshot
        .last_generation
        .as_ref()
        .map(|last| auto_correct(&last.result, &values));
    if let Some(report) = &report {
        if !report.hits.is_empty() {
            mutations.push(Mutation::PrependHits(report.hits.clone()));
        }
        if !report.rectifications.is_empty() {
            mutations.push(Mutation::PrependRectifications(report.rectifications.clone()));
        }
    }

    let mut navigation = snapshot.navigation.clone();
    navigation.push(values.clone());

    mutations.push(Mutation::PrependHistory(parse_module(&values)));
    mutations.push(Mutation::SetModules(snapshot.modules.rotate(values)));
    mutations.push(Mutation::SetNavigation(navigation));
    mutations.push(Mutation::SetLocked(false));

    IngestOutcome { report, mutations }
}

fn move_live(snapshot: &StoreSnapshot, forward: bool) -> Vec<Mutation> {
    let mut navigation = snapshot.navigation.clone();
    let target = if forward { navigation.forward() } else { navigation.back() };
    match target.cloned() {
        Some(lines) => vec![
            Mutation::SetLiveModule(lines),
            Mutation::SetNavigation(navigation),
            Mutation::SetLocked(false),
        ],
        None => Vec::new(),
    }
}

pub fn undo_module(snapshot: &StoreSnapshot) -> Vec<Mutation> {
    move_live(snapshot, false)
}

pub fn redo_module(snapshot: &StoreSnapshot) -> Vec<Mutation> {
    move_live(snapshot, true)
}

pub fn clear_module() -> Vec<Mutation> {
    vec![
        Mutation::SetLiveModule(ModuleLines::default()),
        Mutation::SetNavigation(Default::default()),
    ]
}

pub fn edit_module_line(snapshot: &StoreSnapshot, index: usize, raw: &str) -> Result<Vec<Mutation>> {
    if index >= DATASET_ROWS {
        bail!("Linha {} inexistente (1-{})", index + 1, DATASET_ROWS);
    }
    let mut live = snapshot.modules.live.clone();
    live[index] = sanitize_line(index, raw);
    Ok(vec![Mutation::SetLiveModule(live), Mutation::SetLocked(false)])
}

pub fn mark_hit(value: &str, kind: PrizeKind, position: usize, status: Option<HitStatus>) -> Vec<Mutation> {
    let record = HitRecord::new(value, kind, position, status.unwrap_or(HitStatus::Exact));
    vec![Mutation::PrependHits(vec![record])]
}

pub fn manual_rectify(generated: &str, actual: &str, kind: PrizeKind, rank_label: &str) -> Vec<Mutation> {
    let record = RectificationRecord::new(generated, actual, kind, rank_label);
    vec![Mutation::PrependRectifications(vec![record])]
}

pub fn update_settings(snapshot: &StoreSnapshot, entropy: Option<f64>, voice_enabled: Option<bool>) -> Vec<Mutation> {
    let mut settings: Settings = snapshot.settings;
    if let Some(entropy) = entropy {
        settings = settings.with_entropy(entropy);
    }
    if let Some(voice) = voice_enabled {
        settings.voice_enabled = voice;
    }
    vec![Mutation::SetSettings(settings)]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    History,
    Hits,
    Rectifications,
}

impl Collection {
    fn len(&self, snapshot: &StoreSnapshot) -> usize {
        match self {
            Collection::History => snapshot.history.len(),
            Collection::Hits => snapshot.hits.len(),
            Collection::Rectifications => snapshot.rectifications.len(),
        }
    }
}

pub fn delete_entry(snapshot: &StoreSnapshot, collection: Collection, index: usize) -> Result<Vec<Mutation>> {
    let len = collection.len(snapshot);
    if index >= len {
        bail!("Índice {} fora dos limites (0-{})", index, len.saturating_sub(1));
    }
    let mutation = match collection {
        Collection::History => Mutation::DeleteHistory(index),
        Collection::Hits => Mutation::DeleteHit(index),
        Collection::Rectifications => Mutation::DeleteRectification(index),
    };
    Ok(vec![mutation])
}

pub fn clear_collection(collection: Collection) -> Vec<Mutation> {
    let mutation = match collection {
        Collection::History => Mutation::ClearHistory,
        Collection::Hits => Mutation::ClearHits,
        Collection::Rectifications => Mutation::ClearRectifications,
    };
    vec![mutation]
}

#[cfg(test)]
mod tests {
    use super::*;
    use milhar_db::db::{apply_mutations, load_snapshot, migrate};
    use milhar_db::models::{ModuleSlots, HISTORY_CAP};
    use milhar_db::rusqlite::Connection;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn draw(values: [&str; 7]) -> ModuleLines {
        values.map(String::from)
    }

    #[test]
    fn test_generate_persists_and_locks() {
        let conn = memory_db();
        let snap = load_snapshot(&conn).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let (cycle, mutations) = generate(&snap, &ResonanceConfig::default(), &mut rng).unwrap();
        apply_mutations(&conn, &mutations).unwrap();

        let snap = load_snapshot(&conn).unwrap();
        assert!(snap.locked);
        let last = snap.last_generation.as_ref().unwrap();
        assert_eq!(last.result, cycle.result);
        let sequences = |c: &[milhar_db::models::Candidate]| c.iter().map(|x| x.sequence.clone()).collect::<Vec<_>>();
        assert_eq!(sequences(&last.candidates), sequences(&cycle.candidates));
        assert_eq!(last.advanced, cycle.advanced_predictions);

        let again = generate(&snap, &ResonanceConfig::default(), &mut rng);
        assert!(again.is_err(), "la matrice verrouillée doit refuser");
    }

    #[test]
    fn test_ingest_without_generation() {
        let snap = StoreSnapshot::default();
        let values = draw(["1234", "5678", "9012", "3456", "7890", "1111", "222"]);
        let outcome = ingest_draw(&snap, values.clone());
        assert!(outcome.report.is_none());
        assert_eq!(outcome.verdict(), Verdict::Assimilated);
        assert!(outcome.mutations.contains(&Mutation::SetLocked(false)));
        assert!(outcome.mutations.iter().all(|m| !matches!(m, Mutation::PrependHits(_))));
    }

    #[test]
    fn test_ingest_full_flow() {
        let conn = memory_db();
        let mut rng = StdRng::seed_from_u64(11);
        let snap = load_snapshot(&conn).unwrap();
        let (cycle, mutations) = generate(&snap, &ResonanceConfig::default(), &mut rng).unwrap();
        apply_mutations(&conn, &mutations).unwrap();

        // Le 1er rang observé égale la valeur générée
        let first: String = cycle.result[0].iter().map(|d| d.to_string()).collect();
        let values = draw([first.as_str(), "", "", "", "", "", ""]);
        let snap = load_snapshot(&conn).unwrap();
        let outcome = ingest_draw(&snap, values.clone());
        assert_eq!(outcome.verdict(), Verdict::Absolute);
        apply_mutations(&conn, &outcome.mutations).unwrap();

        let snap = load_snapshot(&conn).unwrap();
        assert!(!snap.locked);
        assert_eq!(snap.hits.len(), 1);
        assert_eq!(snap.hits[0].position, 1);
        assert_eq!(snap.rectifications.len(), 1);
        assert_eq!(snap.history.len(), 1);
        assert_eq!(snap.modules.live, values);
        assert_eq!(snap.navigation.cursor, 1);
    }

    #[test]
    fn test_module_rotation_on_ingest() {
        let conn = memory_db();
        let a = draw(["1111", "1111", "1111", "1111", "1111", "1111", "111"]);
        let b = draw(["2222", "2222", "2222", "2222", "2222", "2222", "222"]);
        let c = draw(["3333", "3333", "3333", "3333", "3333", "3333", "333"]);
        for values in [a.clone(), b.clone(), c.clone()] {
            let snap = load_snapshot(&conn).unwrap();
            apply_mutations(&conn, &ingest_draw(&snap, values).mutations).unwrap();
        }
        let snap = load_snapshot(&conn).unwrap();
        assert_eq!(snap.modules, ModuleSlots { core_a: a, core_b: b, live: c });
        assert_eq!(snap.history.len(), 3);
        assert_eq!(snap.history[0][0], vec![3, 3, 3, 3]);
    }

    #[test]
    fn test_history_cap_after_ingest() {
        let mut snap = StoreSnapshot::default();
        snap.history = vec![Vec::new(); HISTORY_CAP];
        let conn = memory_db();
        apply_mutations(&conn, &[Mutation::SetHistory(snap.history.clone())]).unwrap();
        let values = draw(["1234", "1234", "1234", "1234", "1234", "1234", "123"]);
        apply_mutations(&conn, &ingest_draw(&snap, values).mutations).unwrap();
        let history = load_snapshot(&conn).unwrap().history;
        assert_eq!(history.len(), HISTORY_CAP);
        assert_eq!(history[0][6], vec![1, 2, 3]);
    }

    #[test]
    fn test_undo_redo() {
        let conn = memory_db();
        let a = draw(["1111", "", "", "", "", "", ""]);
        let b = draw(["2222", "", "", "", "", "", ""]);
        for values in [a.clone(), b.clone()] {
            let snap = load_snapshot(&conn).unwrap();
            apply_mutations(&conn, &ingest_draw(&snap, values).mutations).unwrap();
        }

        let snap = load_snapshot(&conn).unwrap();
        apply_mutations(&conn, &undo_module(&snap)).unwrap();
        assert_eq!(load_snapshot(&conn).unwrap().modules.live, a);

        let snap = load_snapshot(&conn).unwrap();
        apply_mutations(&conn, &undo_module(&snap)).unwrap();
        let snap = load_snapshot(&conn).unwrap();
        assert_eq!(snap.modules.live, ModuleLines::default());
        assert!(undo_module(&snap).is_empty());

        apply_mutations(&conn, &redo_module(&snap)).unwrap();
        let snap = load_snapshot(&conn).unwrap();
        apply_mutations(&conn, &redo_module(&snap)).unwrap();
        let snap = load_snapshot(&conn).unwrap();
        assert_eq!(snap.modules.live, b);
        assert!(redo_module(&snap).is_empty());
    }

    #[test]
    fn test_clear_and_edit_module() {
        let conn = memory_db();
        let snap = load_snapshot(&conn).unwrap();
        apply_mutations(&conn, &edit_module_line(&snap, 6, "98-76").unwrap()).unwrap();
        let snap = load_snapshot(&conn).unwrap();
        assert_eq!(snap.modules.live[6], "987");
        assert!(edit_module_line(&snap, 7, "1").is_err());

        apply_mutations(&conn, &clear_module()).unwrap();
        let snap = load_snapshot(&conn).unwrap();
        assert_eq!(snap.modules.live, ModuleLines::default());
        assert_eq!(snap.navigation.entries.len(), 1);
    }

    #[test]
    fn test_mark_hit_defaults_to_exact() {
        let mutations = mark_hit("12", PrizeKind::Dezena, 3, None);
        match &mutations[0] {
            Mutation::PrependHits(hits) => {
                assert_eq!(hits[0].status, HitStatus::Exact);
                assert_eq!(hits[0].kind, PrizeKind::Dezena);
                assert_eq!(hits[0].position, 3);
            }
            other => panic!("mutation inattendue : {other:?}"),
        }
        let near = mark_hit("12", PrizeKind::Dezena, 3, Some(HitStatus::Near));
        assert!(matches!(&near[0], Mutation::PrependHits(h) if h[0].status == HitStatus::Near));
    }

    #[test]
    fn test_manual_rectify() {
        let mutations = manual_rectify("123", "456", PrizeKind::Centena, "7º PRÊMIO");
        assert!(matches!(
            &mutations[0],
            Mutation::PrependRectifications(r) if r[0].actual == "456" && r[0].rank_label == "7º PRÊMIO"
        ));
    }

    #[test]
    fn test_update_settings() {
        let snap = StoreSnapshot::default();
        let mutations = update_settings(&snap, Some(3.0), Some(false));
        assert_eq!(mutations, vec![Mutation::SetSettings(Settings { entropy: 1.0, voice_enabled: false })]);
    }

    #[test]
    fn test_delete_entry_bounds() {
        let mut snap = StoreSnapshot::default();
        assert!(delete_entry(&snap, Collection::Hits, 0).is_err());
        snap.hits.push(HitRecord::new("1234", PrizeKind::Milhar, 1, HitStatus::Exact));
        assert_eq!(delete_entry(&snap, Collection::Hits, 0).unwrap(), vec![Mutation::DeleteHit(0)]);
        assert_eq!(clear_collection(Collection::History), vec![Mutation::ClearHistory]);
    }
}
