use anyhow::{bail, Context, Result};
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::models::{
    AdvancedPredictions, Candidate, CombinedAnalysis, DataSet, HitRecord, ModuleLines,
    ModuleNavigation, ModuleSlots, RectificationRecord, Settings, HISTORY_CAP,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS state (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,
    updated_at  INTEGER NOT NULL
);
";

pub mod keys {
    pub const HISTORY: &str = "history";
    pub const HITS: &str = "hits";
    pub const RECTIFICATIONS: &str = "rectifications";
    pub const SETTINGS: &str = "settings";
    pub const MODULE_1: &str = "module_1";
    pub const MODULE_2: &str = "module_2";
    pub const MODULE_3: &str = "module_3";
    pub const MODULE_NAV: &str = "module_nav";
    pub const LAST_RESULT: &str = "last_result";
    pub const LAST_CANDIDATES: &str = "last_candidates";
    pub const LAST_ADVANCED: &str = "last_advanced";
    pub const LAST_ANALYSIS: &str = "last_analysis";
    pub const LOCKED: &str = "locked";
}

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("milhar.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossível criar o diretório {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossível abrir a base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Falha na migração")?;
    Ok(())
}

pub fn get_optional<T: DeserializeOwned>(conn: &Connection, key: &str) -> Result<Option<T>> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM state WHERE key = ?1", [key], |row| row.get(0))
        .optional()
        .with_context(|| format!("Falha na leitura da chave '{key}'"))?;
    match raw {
        Some(json) => {
            let value = serde_json::from_str(&json)
                .with_context(|| format!("JSON inválido na chave '{key}'"))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

pub fn get_value<T: DeserializeOwned + Default>(conn: &Connection, key: &str) -> Result<T> {
    Ok(get_optional(conn, key)?.unwrap_or_default())
}

pub fn put_value<T: Serialize + ?Sized>(conn: &Connection, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO state (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        rusqlite::params![key, json, crate::models::now_millis()],
    ).with_context(|| format!("Falha na escrita da chave '{key}'"))?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LastGeneration {
    pub result: DataSet,
    pub candidates: Vec<Candidate>,
    pub advanced: AdvancedPredictions,
    pub analysis: CombinedAnalysis,
}

/// Photo immuable de l'état persistant, lue une fois par invocation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreSnapshot {
    pub history: Vec<DataSet>,
    pub hits: Vec<HitRecord>,
    pub rectifications: Vec<RectificationRecord>,
    pub settings: Settings,
    pub modules: ModuleSlots,
    pub navigation: ModuleNavigation,
    pub last_generation: Option<LastGeneration>,
    pub locked: bool,
}

pub fn load_snapshot(conn: &Connection) -> Result<StoreSnapshot> {
    let last_generation = match get_optional::<DataSet>(conn, keys::LAST_RESULT)? {
        Some(result) => Some(LastGeneration {
            result,
            candidates: get_value(conn, keys::LAST_CANDIDATES)?,
            advanced: get_value(conn, keys::LAST_ADVANCED)?,
            analysis: get_value(conn, keys::LAST_ANALYSIS)?,
        }),
        None => None,
    };

    Ok(StoreSnapshot {
        history: get_value(conn, keys::HISTORY)?,
        hits: get_value(conn, keys::HITS)?,
        rectifications: get_value(conn, keys::RECTIFICATIONS)?,
        settings: get_value(conn, keys::SETTINGS)?,
        modules: ModuleSlots {
            core_a: get_value(conn, keys::MODULE_1)?,
            core_b: get_value(conn, keys::MODULE_2)?,
            live: get_value(conn, keys::MODULE_3)?,
        },
        navigation: get_value(conn, keys::MODULE_NAV)?,
        last_generation,
        locked: get_value(conn, keys::LOCKED)?,
    })
}

/// Modification à appliquer au store après un calcul du moteur.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    SetHistory(Vec<DataSet>),
    PrependHistory(DataSet),
    DeleteHistory(usize),
    ClearHistory,
    PrependHits(Vec<HitRecord>),
    DeleteHit(usize),
    ClearHits,
    PrependRectifications(Vec<RectificationRecord>),
    DeleteRectification(usize),
    ClearRectifications,
    SetModules(ModuleSlots),
    SetLiveModule(ModuleLines),
    SetNavigation(ModuleNavigation),
    SetSettings(Settings),
    SetLastGeneration(Box<LastGeneration>),
    SetLocked(bool),
}

fn prepend<T: Serialize + DeserializeOwned>(conn: &Connection, key: &str, items: Vec<T>, cap: Option<usize>) -> Result<()> {
    let existing: Vec<T> = get_optional(conn, key)?.unwrap_or_default();
    let mut merged = items;
    merged.extend(existing);
    if let Some(cap) = cap {
        merged.truncate(cap);
    }
    put_value(conn, key, &merged)
}

fn remove_at<T: Serialize + DeserializeOwned>(conn: &Connection, key: &str, index: usize) -> Result<()> {
    let mut items: Vec<T> = get_optional(conn, key)?.unwrap_or_default();
    if index >= items.len() {
        bail!("Índice {} fora dos limites ({} elementos em '{}')", index, items.len(), key);
    }
    items.remove(index);
    put_value(conn, key, &items)
}

fn apply_one(conn: &Connection, mutation: &Mutation) -> Result<()> {
    match mutation {
        Mutation::SetHistory(history) => {
            let capped: Vec<&DataSet> = history.iter().take(HISTORY_CAP).collect();
            put_value(conn, keys::HISTORY, &capped)
        }
        Mutation::PrependHistory(set) => {
            prepend(conn, keys::HISTORY, vec![set.clone()], Some(HISTORY_CAP))
        }
        Mutation::DeleteHistory(i) => remove_at::<DataSet>(conn, keys::HISTORY, *i),
        Mutation::ClearHistory => put_value::<[DataSet]>(conn, keys::HISTORY, &[]),
        Mutation::PrependHits(hits) => prepend(conn, keys::HITS, hits.clone(), None),
        Mutation::DeleteHit(i) => remove_at::<HitRecord>(conn, keys::HITS, *i),
        Mutation::ClearHits => put_value::<[HitRecord]>(conn, keys::HITS, &[]),
        Mutation::PrependRectifications(rects) => {
            prepend(conn, keys::RECTIFICATIONS, rects.clone(), None)
        }
        Mutation::DeleteRectification(i) => {
            remove_at::<RectificationRecord>(conn, keys::RECTIFICATIONS, *i)
        }
        Mutation::ClearRectifications => {
            put_value::<[RectificationRecord]>(conn, keys::RECTIFICATIONS, &[])
        }
        Mutation::SetModules(slots) => {
            put_value(conn, keys::MODULE_1, &slots.core_a)?;
            put_value(conn, keys::MODULE_2, &slots.core_b)?;
            put_value(conn, keys::MODULE_3, &slots.live)
        }
        Mutation::SetLiveModule(lines) => put_value(conn, keys::MODULE_3, lines),
        Mutation::SetNavigation(nav) => put_value(conn, keys::MODULE_NAV, nav),
        Mutation::SetSettings(settings) => put_value(conn, keys::SETTINGS, settings),
        Mutation::SetLastGeneration(generation) => {
            put_value(conn, keys::LAST_RESULT, &generation.result)?;
            put_value(conn, keys::LAST_CANDIDATES, &generation.candidates)?;
            put_value(conn, keys::LAST_ADVANCED, &generation.advanced)?;
            put_value(conn, keys::LAST_ANALYSIS, &generation.analysis)
        }
        Mutation::SetLocked(locked) => put_value(conn, keys::LOCKED, locked),
    }
}

/// Applique les mutations dans une seule transaction : tout ou rien.
pub fn apply_mutations(conn: &Connection, mutations: &[Mutation]) -> Result<()> {
    if mutations.is_empty() {
        return Ok(());
    }
    let tx = conn.unchecked_transaction()
        .context("Impossível iniciar a transação")?;
    for mutation in mutations {
        apply_one(&tx, mutation)?;
    }
    tx.commit().context("Falha no commit")?;
    log::debug!("{} mutações aplicadas", mutations.len());
    Ok(())
}
