//! sim-runner: headless runner for the storefront economy simulation.
//!
//! Usage:
//!   sim-runner --seed 12345 --days 90 --db run.db
//!   sim-runner --seed 12345 --data-dir ./data --verbose
//!   sim-runner --seed 12345 --ipc-mode

use anyhow::Result;
use std::collections::BTreeMap;
use std::env;
use std::io::{self, BufRead, Write};
use storefront_core::{
    command::PlayerCommand,
    config::SimConfig,
    engine::SimEngine,
    error::Rejection,
    store::SimStore,
    types::Day,
};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Advance {
        days: u64,
    },
    Command {
        player:  String,
        command: PlayerCommand,
    },
    Quit,
}

#[derive(serde::Serialize)]
struct PlayerView {
    name:                String,
    cash:                f64,
    reputation:          f64,
    average_fulfillment: f64,
    store_level:         u32,
    stocked_products:    usize,
    units_on_hand:       u32,
}

#[derive(serde::Serialize)]
struct UiState {
    day:           Day,
    players:       Vec<PlayerView>,
    market_prices: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejection:     Option<Rejection>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let days = parse_arg(&args, "--days", 90u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let verbose = args.iter().any(|a| a == "--verbose");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    if !ipc_mode {
        println!("Storefront economy: sim-runner");
        println!("  seed:      {seed}");
        println!("  days:      {days}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let store = SimStore::open(db)?;
    store.migrate()?;

    let run_id = format!("run-{seed}-{}", chrono::Utc::now().timestamp());
    store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"))?;

    let config = SimConfig::load(data_dir)?;
    let mut engine = SimEngine::build(run_id.clone(), seed, store, config)?;
    log::info!(
        "run {run_id}: {} stores, {} customers, {} vendors",
        engine.state.players.len(),
        engine.state.customers.len(),
        engine.state.vendors.len()
    );

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else {
        for _ in 0..days {
            engine.run_day(verbose)?;
        }
        print_summary(&engine, days)?;
    }

    Ok(())
}

fn run_ipc_loop(engine: &mut SimEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let state = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Advance { days } => {
                engine.run_days(days)?;
                build_ui_state(engine, None)
            }
            IpcCommand::GetState => build_ui_state(engine, None),
            IpcCommand::Command { player, command } => match engine.submit_command(&player, command) {
                Ok(outcome) => build_ui_state(engine, outcome.err()),
                Err(e) => {
                    let err_json = serde_json::json!({ "error": e.to_string() });
                    writeln!(stdout, "{}", err_json)?;
                    stdout.flush()?;
                    continue;
                }
            },
        };
        writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn build_ui_state(engine: &SimEngine, rejection: Option<Rejection>) -> UiState {
    let players = engine
        .state
        .players
        .iter()
        .map(|p| PlayerView {
            name:                p.name.clone(),
            cash:                p.cash,
            reputation:          p.reputation,
            average_fulfillment: p.average_fulfillment_pct,
            store_level:         p.store_level,
            stocked_products:    p.stocked_product_count(),
            units_on_hand:       p.inventory.values().sum(),
        })
        .collect();

    UiState {
        day: engine.state.day,
        players,
        market_prices: engine.state.market_prices.clone(),
        rejection,
    }
}

fn print_summary(engine: &SimEngine, days: u64) -> Result<()> {
    let store = engine.store();
    let run_id = &engine.run_id;
    let revenue = store.total_revenue(run_id)?;
    let sales = store.count_events_of_type(run_id, "sale_completed")?;
    let thefts = store.count_events_of_type(run_id, "stock_stolen")?;
    let turned_away = store.count_events_of_type(run_id, "store_at_capacity")?;

    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {run_id}");
    println!("  days run:       {days}");
    println!("  next day:       {}", engine.state.day);
    println!("  sales:          {sales}");
    println!("  thefts:         {thefts}");
    println!("  turned away:    {turned_away}");

    println!();
    println!("=== STANDINGS ===");
    let mut standings: Vec<_> = engine.state.players.iter().collect();
    standings.sort_by(|a, b| b.cash.total_cmp(&a.cash));
    for (rank, p) in standings.iter().enumerate() {
        let lifetime = revenue.get(&p.name).copied().unwrap_or(0.0);
        println!(
            "  {}. {} | Cash: ${:.0} | Revenue: ${:.0} | Rep: {:.0} | Fulfillment: {:.1}% | Level {}",
            rank + 1,
            p.name,
            p.cash,
            lifetime,
            p.reputation,
            p.average_fulfillment_pct,
            p.store_level
        );
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
