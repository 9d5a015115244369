mod display;
mod import;

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;

use milhar_db::db::{apply_mutations, db_path, load_snapshot, migrate, open_db, Mutation, StoreSnapshot};
use milhar_db::models::{rank_label, HitStatus, PrizeKind, DATASET_ROWS, HISTORY_CAP};
use milhar_db::rusqlite::Connection;
use milhar_engine::config::{load_config, save_config, ResonanceConfig};
use milhar_engine::frequency::{analyze, flatten};
use milhar_engine::input::{normalize_paste, parse_modules};
use milhar_engine::workflow::{self, Collection};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Milhar,
    Centena,
    Dezena,
}

impl From<KindArg> for PrizeKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Milhar => PrizeKind::Milhar,
            KindArg::Centena => PrizeKind::Centena,
            KindArg::Dezena => PrizeKind::Dezena,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CollectionArg {
    History,
    Hits,
    Rectifications,
}

impl From<CollectionArg> for Collection {
    fn from(arg: CollectionArg) -> Self {
        match arg {
            CollectionArg::History => Collection::History,
            CollectionArg::Hits => Collection::Hits,
            CollectionArg::Rectifications => Collection::Rectifications,
        }
    }
}

#[derive(Parser)]
#[command(name = "milhar", about = "Gerador heurístico de milhares e centenas")]
struct Cli {
    /// Caminho da base (padrão : ./data/milhar.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Gerar a matriz, a tríade e as predições avançadas
    Generate {
        /// Seed para reprodutibilidade
        #[arg(long)]
        seed: Option<u64>,

        /// Arquivo de pesos de ressonância
        #[arg(short, long, default_value = "resonance.json")]
        config: PathBuf,
    },

    /// Gravar os pesos de referência num arquivo JSON
    InitConfig {
        #[arg(short, long, default_value = "resonance.json")]
        output: PathBuf,
    },

    /// Informar um resultado real (7 valores, ou texto colado na entrada padrão)
    Paste {
        values: Vec<String>,
    },

    /// Editar uma linha do módulo ONDA-REAL
    Edit {
        /// Linha 1-7
        line: usize,
        value: String,
    },

    /// Voltar ao valor anterior do módulo ONDA-REAL
    Undo,

    /// Avançar ao valor seguinte do módulo ONDA-REAL
    Redo,

    /// Limpar o módulo ONDA-REAL
    Clear,

    /// Mostrar os três módulos de entrada
    Modules,

    /// Mostrar a última matriz gerada
    Last,

    /// Listar o histórico de resultados
    History {
        #[arg(short, long, default_value = "10")]
        last: usize,
    },

    /// Listar os acertos
    Hits,

    /// Listar as retificações
    Rectifications,

    /// Registrar um acerto
    Hit {
        value: String,
        #[arg(short, long, default_value = "milhar")]
        kind: KindArg,
        #[arg(short, long, default_value = "1")]
        position: usize,
        /// Quase acerto em vez de acerto
        #[arg(long)]
        near: bool,
    },

    /// Registrar uma retificação manual
    Rectify {
        generated: String,
        actual: String,
        #[arg(short, long, default_value = "milhar")]
        kind: KindArg,
        /// Prêmio (1-7)
        #[arg(short, long, default_value = "1")]
        rank: usize,
    },

    /// Apagar um elemento por índice
    Delete {
        collection: CollectionArg,
        index: usize,
    },

    /// Apagar uma coleção inteira
    Wipe {
        collection: CollectionArg,
    },

    /// Ajustar entropia e voz
    Settings {
        #[arg(long)]
        entropy: Option<f64>,
        #[arg(long)]
        voice: Option<bool>,
    },

    /// Desbloquear a geração
    Unlock,

    /// Frequências dos módulos e do histórico
    Stats,

    /// Importar o histórico de um arquivo CSV (;)
    Import {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Mostrar o caminho da base
    DbPath,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let path = cli.db.clone().unwrap_or_else(db_path);
    let conn = open_db(&path)?;
    migrate(&conn)?;
    let snapshot = load_snapshot(&conn)?;

    match cli.command {
        Command::Generate { seed, config } => cmd_generate(&conn, &snapshot, seed, &config),
        Command::InitConfig { output } => {
            save_config(&ResonanceConfig::default(), &output)?;
            println!("Pesos de referência gravados em {}", output.display());
            Ok(())
        }
        Command::Paste { values } => cmd_paste(&conn, &snapshot, &values),
        Command::Edit { line, value } => {
            if line == 0 {
                bail!("As linhas vão de 1 a {}", DATASET_ROWS);
            }
            commit(&conn, &workflow::edit_module_line(&snapshot, line - 1, &value)?)?;
            display::display_modules(&load_snapshot(&conn)?.modules, false);
            Ok(())
        }
        Command::Undo => cmd_navigate(&conn, workflow::undo_module(&snapshot)),
        Command::Redo => cmd_navigate(&conn, workflow::redo_module(&snapshot)),
        Command::Clear => {
            commit(&conn, &workflow::clear_module())?;
            println!("Memória limpa.");
            Ok(())
        }
        Command::Modules => {
            display::display_modules(&snapshot.modules, snapshot.locked);
            Ok(())
        }
        Command::Last => cmd_last(&snapshot),
        Command::History { last } => {
            display::display_history(&snapshot.history, last);
            Ok(())
        }
        Command::Hits => {
            display::display_hits(&snapshot.hits);
            Ok(())
        }
        Command::Rectifications => {
            display::display_rectifications(&snapshot.rectifications);
            Ok(())
        }
        Command::Hit { value, kind, position, near } => {
            let status = if near { HitStatus::Near } else { HitStatus::Exact };
            commit(&conn, &workflow::mark_hit(&value, kind.into(), position, Some(status)))?;
            println!("{status} registrado : {value} ({}º)", position);
            Ok(())
        }
        Command::Rectify { generated, actual, kind, rank } => {
            let label = rank_label(rank);
            commit(&conn, &workflow::manual_rectify(&generated, &actual, kind.into(), &label))?;
            println!("Retificação registrada : {generated} -> {actual} ({label})");
            Ok(())
        }
        Command::Delete { collection, index } => {
            commit(&conn, &workflow::delete_entry(&snapshot, collection.into(), index)?)?;
            println!("Elemento {index} apagado.");
            Ok(())
        }
        Command::Wipe { collection } => {
            commit(&conn, &workflow::clear_collection(collection.into()))?;
            println!("Coleção apagada.");
            Ok(())
        }
        Command::Settings { entropy, voice } => {
            if entropy.is_some() || voice.is_some() {
                commit(&conn, &workflow::update_settings(&snapshot, entropy, voice))?;
            }
            display::display_settings(&load_snapshot(&conn)?.settings);
            Ok(())
        }
        Command::Unlock => {
            commit(&conn, &[Mutation::SetLocked(false)])?;
            println!("Geração desbloqueada.");
            Ok(())
        }
        Command::Stats => cmd_stats(&snapshot),
        Command::Import { file } => cmd_import(&conn, &snapshot, &file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn commit(conn: &Connection, mutations: &[Mutation]) -> Result<()> {
    apply_mutations(conn, mutations)
}

fn resolve_config(path: &Path) -> Result<ResonanceConfig> {
    if path.exists() {
        load_config(path)
    } else {
        println!("(Sem arquivo de pesos, usando os pesos de referência)");
        Ok(ResonanceConfig::default())
    }
}

fn cmd_generate(conn: &Connection, snapshot: &StoreSnapshot, seed: Option<u64>, config_path: &Path) -> Result<()> {
    let config = resolve_config(config_path)?;
    let mut rng: StdRng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    let (cycle, mutations) = workflow::generate(snapshot, &config, &mut rng)?;
    commit(conn, &mutations)?;

    display::display_matrix(&cycle.result);
    display::display_candidates(&cycle.candidates);
    display::display_advanced(&cycle.advanced_predictions);
    if snapshot.settings.voice_enabled {
        println!("\nMatriz prevista manifestada. Foco nos três primeiros prêmios.");
    }
    Ok(())
}

fn cmd_paste(conn: &Connection, snapshot: &StoreSnapshot, values: &[String]) -> Result<()> {
    let text = if values.is_empty() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Erro de leitura")?;
        buffer
    } else {
        values.join("\n")
    };
    if text.trim().is_empty() {
        bail!("Nenhum valor informado");
    }

    let lines = normalize_paste(&text, &snapshot.modules.live);
    display::display_pasted(&lines);

    let outcome = workflow::ingest_draw(snapshot, lines);
    commit(conn, &outcome.mutations)?;

    if let Some(report) = &outcome.report {
        if !report.hits.is_empty() {
            display::display_hits(&report.hits);
        }
        println!("{} retificações registradas.", report.rectifications.len());
    }
    if snapshot.settings.voice_enabled {
        println!("{}", outcome.verdict());
    }
    Ok(())
}

fn cmd_navigate(conn: &Connection, mutations: Vec<Mutation>) -> Result<()> {
    if mutations.is_empty() {
        println!("Nada a navegar.");
        return Ok(());
    }
    commit(conn, &mutations)?;
    display::display_modules(&load_snapshot(conn)?.modules, false);
    Ok(())
}

fn cmd_last(snapshot: &StoreSnapshot) -> Result<()> {
    let Some(last) = &snapshot.last_generation else {
        println!("Nenhuma matriz gerada. Lance primeiro : milhar generate");
        return Ok(());
    };
    display::display_matrix(&last.result);
    display::display_candidates(&last.candidates);
    display::display_advanced(&last.advanced);
    Ok(())
}

fn cmd_stats(snapshot: &StoreSnapshot) -> Result<()> {
    let parsed = parse_modules(&snapshot.modules.as_vectors());
    for error in &parsed.errors {
        println!("⚠ {error}");
    }
    let rows = flatten(&parsed.modules, &snapshot.history);
    let analysis = analyze(&rows);
    display::display_stats(&analysis, rows.len());
    Ok(())
}

fn cmd_import(conn: &Connection, snapshot: &StoreSnapshot, file: &Path) -> Result<()> {
    let (imported, result) = import::read_history(file)?;
    display::display_import_summary(&result);
    if imported.is_empty() {
        return Ok(());
    }

    let mut history = imported;
    history.extend(snapshot.history.iter().cloned());
    if history.len() > HISTORY_CAP {
        println!("Histórico limitado a {HISTORY_CAP} entradas.");
    }
    commit(conn, &[Mutation::SetHistory(history)])
}
