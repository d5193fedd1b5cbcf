//! The simulation engine: one call to run_day() plays one day.
//!
//! EXECUTION ORDER (fixed):
//!   Day stage
//!     1. Strategy     AI stores reprice and place default orders
//!     2. Market       price fluctuation, scripted events, demand drift
//!     3. Procurement  buy orders and restock rules against catalogs
//!     4. Demand       shopping lists, CAS scoring, routing
//!     5. Checkout     routed shoppers buy, steal or are turned away
//!     6. Wages        monthly payroll
//!     7. Reputation   reputation and rolling fulfillment
//!   Day counter advances, per-day purchase counters reset.
//!   Rollover stage
//!     8. Delivery     pending deliveries due today arrive
//!     9. Catalog      vendor catalogs rebuilt for the new day
//!
//! RULES:
//!   - The engine exclusively owns GameState for the whole day.
//!   - No subsystem calls another subsystem's functions directly;
//!     results flow forward through the DayLedger.
//!   - All randomness flows through the single SimRng.
//!   - All state changes are recorded in the event log.

use crate::{
    catalog_subsystem::{self, CatalogSubsystem},
    checkout_subsystem::CheckoutSubsystem,
    command::{PlayerCommand, QueuedCommand},
    config::SimConfig,
    delivery_subsystem::DeliverySubsystem,
    demand_subsystem::DemandSubsystem,
    error::{Rejection, SimError, SimResult},
    event::{EventLogEntry, SimEvent},
    ledger::DayLedger,
    market_subsystem::MarketSubsystem,
    procurement_subsystem::{self, ProcurementSubsystem},
    reputation_subsystem::ReputationSubsystem,
    rng::SimRng,
    snapshot::{SimSnapshot, SNAPSHOT_INTERVAL},
    state::GameState,
    store::SimStore,
    strategy_subsystem::StrategySubsystem,
    subsystem::{SimSubsystem, Stage},
    types::{DailySales, Day, RunId},
    wage_subsystem::WageSubsystem,
};

pub struct SimEngine {
    pub run_id:  RunId,
    pub state:   GameState,
    config:      SimConfig,
    rng:         SimRng,
    seed:        u64,
    subsystems:  Vec<(Stage, Box<dyn SimSubsystem>)>,
    store:       SimStore,
    initialized: bool,
}

impl SimEngine {
    /// A bare engine with no subsystems registered.
    pub fn new(run_id: RunId, seed: u64, store: SimStore, config: SimConfig, state: GameState) -> Self {
        Self {
            rng: SimRng::new(seed),
            seed,
            subsystems: Vec::new(),
            store,
            initialized: false,
            state,
            config,
            run_id,
        }
    }

    /// Build a fully wired engine over the world described by `config`.
    pub fn build(run_id: RunId, seed: u64, store: SimStore, config: SimConfig) -> SimResult<Self> {
        let mut rng = SimRng::new(seed);
        let state = GameState::from_config(&config, &mut rng)?;
        let mut engine = Self::build_with_state(run_id, seed, store, config, state);
        engine.rng = rng;
        Ok(engine)
    }

    /// Build a fully wired engine over a prepared world.
    /// Call this instead of new() + manual register() calls.
    pub fn build_with_state(
        run_id: RunId,
        seed:   u64,
        store:  SimStore,
        config: SimConfig,
        state:  GameState,
    ) -> Self {
        let mut engine = SimEngine::new(run_id, seed, store, config, state);
        let config = engine.config.clone();

        // Execution order is fixed.
        engine.register(
            Stage::Day,
            Box::new(StrategySubsystem::new(config.strategy.clone(), config.store.clone())),
        );
        engine.register(Stage::Day, Box::new(MarketSubsystem::new(config.market.clone())));
        engine.register(Stage::Day, Box::new(ProcurementSubsystem::new(config.store.clone())));
        engine.register(
            Stage::Day,
            Box::new(DemandSubsystem::new(config.demand.clone(), &config.store)),
        );
        engine.register(
            Stage::Day,
            Box::new(CheckoutSubsystem::new(config.store.clone(), config.demand.clone())),
        );
        engine.register(Stage::Day, Box::new(WageSubsystem::new(config.store.clone())));
        engine.register(Stage::Day, Box::new(ReputationSubsystem::new(config.reputation.clone())));
        engine.register(Stage::Rollover, Box::new(DeliverySubsystem::new()));
        engine.register(Stage::Rollover, Box::new(CatalogSubsystem::new(seed)));

        // Day 1 procurement needs catalogs before the first rollover.
        catalog_subsystem::refresh_catalogs(&mut engine.state, seed);
        engine
    }

    /// Engine over SimConfig::default_test() on a migrated in-memory store.
    pub fn build_test(run_id: RunId, seed: u64) -> SimResult<Self> {
        let store = Self::test_store(&run_id, seed)?;
        Self::build(run_id, seed, store, SimConfig::default_test()?)
    }

    /// Engine over a hand-built world on a migrated in-memory store.
    pub fn build_test_with_state(
        run_id: RunId,
        seed:   u64,
        config: SimConfig,
        state:  GameState,
    ) -> SimResult<Self> {
        let store = Self::test_store(&run_id, seed)?;
        Ok(Self::build_with_state(run_id, seed, store, config, state))
    }

    fn test_store(run_id: &str, seed: u64) -> SimResult<SimStore> {
        let store = SimStore::in_memory()?;
        store.migrate()?;
        store.insert_run(run_id, seed, "0.1.0-test")?;
        Ok(store)
    }

    /// Register a subsystem. Call in the documented execution order.
    pub fn register(&mut self, stage: Stage, subsystem: Box<dyn SimSubsystem>) {
        self.subsystems.push((stage, subsystem));
    }

    /// Play the current day. Returns each player's revenue for the day.
    pub fn run_day(&mut self, verbose: bool) -> SimResult<DailySales> {
        if !self.initialized {
            // Emit RunInitialized at day 0 so seed differences are observable.
            let init = SimEvent::RunInitialized { run_id: self.run_id.clone(), seed: self.seed };
            persist_events(&self.store, &self.run_id, 0, "engine", &[init])?;
            self.initialized = true;
        }

        let day = self.state.day;
        let mut ledger = DayLedger::new(verbose);
        persist_events(&self.store, &self.run_id, day, "engine", &[SimEvent::DayStarted { day }])?;

        for (stage, subsystem) in &mut self.subsystems {
            if *stage != Stage::Day {
                continue;
            }
            let events = subsystem.update(day, &mut self.state, &mut ledger, &mut self.rng)?;
            persist_events(&self.store, &self.run_id, day, subsystem.name(), &events)?;
        }

        let sales = ledger.daily_sales(self.state.players.iter().map(|p| p.name.as_str()));
        let total_revenue: f64 = sales.values().sum();
        let telemetry = ledger.telemetry;
        let closing = [
            SimEvent::DayTelemetry {
                day,
                unmet_units:        telemetry.unmet_units,
                failed_restocks:    telemetry.failed_restocks,
                rejected_purchases: telemetry.rejected_purchases,
            },
            SimEvent::DayCompleted { day, total_revenue },
        ];
        persist_events(&self.store, &self.run_id, day, "engine", &closing)?;
        self.persist_day_summary(day, &sales)?;

        log::info!(
            "day={day} engine: revenue ${total_revenue:.2}, unmet {} units, {} failed restocks",
            telemetry.unmet_units, telemetry.failed_restocks
        );
        if verbose {
            for player in &self.state.players {
                log::info!(
                    "day={day} engine: {} cash ${:.2} reputation {:.0} level {}",
                    player.name, player.cash, player.reputation, player.store_level
                );
            }
        }

        let next = self.state.advance_day();
        for (stage, subsystem) in &mut self.subsystems {
            if *stage != Stage::Rollover {
                continue;
            }
            let events = subsystem.update(next, &mut self.state, &mut ledger, &mut self.rng)?;
            persist_events(&self.store, &self.run_id, next, subsystem.name(), &events)?;
        }

        if day % SNAPSHOT_INTERVAL == 0 {
            self.take_snapshot(day)?;
        }
        Ok(sales)
    }

    /// Run n days in a loop. Used for testing and fast-forward.
    pub fn run_days(&mut self, n: u64) -> SimResult<()> {
        for _ in 0..n {
            self.run_day(false)?;
        }
        Ok(())
    }

    /// Apply a player command through its validated mutator. The command
    /// is logged and persisted either way; a business-rule failure comes
    /// back as the inner Err and leaves state untouched.
    pub fn submit_command(
        &mut self,
        player:  &str,
        command: PlayerCommand,
    ) -> SimResult<Result<(), Rejection>> {
        let idx = self.state.player_index(player)?;
        let day = self.state.day;
        let queued = QueuedCommand {
            run_id:     self.run_id.clone(),
            queued_at:  day,
            command_id: uuid::Uuid::new_v4().to_string(),
            player:     player.to_string(),
            command,
        };

        let mut events = vec![SimEvent::PlayerCommandReceived {
            day,
            command_id:   queued.command_id.clone(),
            player:       player.to_string(),
            command_type: queued.command.type_name().to_string(),
        }];
        let outcome = self.apply_command(idx, &queued.command);
        match &outcome {
            Ok(applied) => events.extend(applied.iter().cloned()),
            Err(rejection) => {
                log::warn!(
                    "day={day} command: {player} {} rejected: {rejection}",
                    queued.command.type_name()
                );
                events.push(SimEvent::CommandRejected {
                    day,
                    command_id: queued.command_id.clone(),
                    player:     player.to_string(),
                    rejection:  rejection.clone(),
                });
            }
        }

        persist_events(&self.store, &self.run_id, day, "command", &events)?;
        let reason = outcome.as_ref().err().map(|r| r.to_string());
        self.store.insert_command(&queued, reason.as_deref())?;
        Ok(outcome.map(|_| ()))
    }

    fn apply_command(&mut self, idx: usize, command: &PlayerCommand) -> Result<Vec<SimEvent>, Rejection> {
        let day = self.state.day;
        let state = &mut self.state;
        let rules = &self.config.store;
        let name = state.players[idx].name.clone();

        match command {
            PlayerCommand::SetPrice { item, price } => {
                require_item(state, item)?;
                let old_price = state.players[idx].price(item);
                state.players[idx].set_price(item, *price)?;
                Ok(vec![SimEvent::PriceAdjusted {
                    day,
                    player: name,
                    item: item.clone(),
                    old_price,
                    new_price: *price,
                }])
            }
            PlayerCommand::SetBuyOrder { item, lines } => {
                require_item(state, item)?;
                for line in lines {
                    require_vendor(state, &line.vendor)?;
                }
                state.players[idx].set_buy_order(item, lines.clone())?;
                Ok(Vec::new())
            }
            PlayerCommand::ClearBuyOrder { item } => {
                state.players[idx].clear_buy_order(item);
                Ok(Vec::new())
            }
            PlayerCommand::SetRestockRule { item, minimum, vendor } => {
                require_item(state, item)?;
                require_vendor(state, vendor)?;
                state.players[idx].set_restock_rule(item, *minimum, vendor)?;
                Ok(Vec::new())
            }
            PlayerCommand::SetCategoryRestockRule { category, minimum, vendor } => {
                require_vendor(state, vendor)?;
                state.players[idx].set_category_restock_rule(*category, *minimum, vendor)?;
                Ok(Vec::new())
            }
            PlayerCommand::PurchaseFromVendor { item, vendor, quantity } => {
                let purchase =
                    procurement_subsystem::purchase_from_vendor(state, idx, item, vendor, *quantity, rules)?;
                Ok(vec![SimEvent::StockPurchased {
                    day,
                    player:       name,
                    item:         purchase.item,
                    vendor:       purchase.vendor,
                    quantity:     purchase.quantity,
                    unit_cost:    purchase.unit_cost,
                    delivery_day: purchase.delivery_day,
                }])
            }
            PlayerCommand::HireStaff { kind } => {
                let fee = state.players[idx].hire_staff(*kind, rules)?;
                Ok(vec![SimEvent::StaffHired { day, player: name, kind: *kind, fee }])
            }
            PlayerCommand::PurchaseUpgrade { upgrade } => {
                let owned = state.purchase_upgrade(idx, upgrade)?;
                let cost = state.upgrade(upgrade).map_or(0.0, |u| u.cost);
                Ok(vec![SimEvent::UpgradePurchased {
                    day,
                    player:      name,
                    upgrade:     upgrade.clone(),
                    cost,
                    expires_day: owned.expires_day,
                }])
            }
            PlayerCommand::Discard { item, quantity } => {
                let removed = state.players[idx].discard(item, *quantity)?;
                Ok(vec![SimEvent::StockDiscarded { day, player: name, item: item.clone(), quantity: removed }])
            }
        }
    }

    /// Replace the world and RNG with the latest stored snapshot.
    /// Returns the day the snapshot was taken after.
    pub fn restore_latest(&mut self) -> SimResult<Day> {
        let (day, json) = self
            .store
            .latest_snapshot_before(&self.run_id, self.state.day)?
            .ok_or_else(|| SimError::SnapshotNotFound { run_id: self.run_id.clone() })?;
        let snapshot: SimSnapshot = serde_json::from_str(&json)?;
        self.state = snapshot.state;
        self.rng = snapshot.rng;
        log::info!("day={day} engine: restored snapshot, resuming at day {}", self.state.day);
        persist_events(&self.store, &self.run_id, day, "engine", &[SimEvent::SnapshotRestored { day }])?;
        Ok(day)
    }

    /// Query events for a specific day from the store.
    /// Used by the determinism test and replay tooling.
    pub fn events_for_day(&self, day: Day) -> SimResult<Vec<EventLogEntry>> {
        self.store.events_for_day(&self.run_id, day)
    }

    /// The full event log of this run.
    pub fn event_log(&self) -> SimResult<Vec<EventLogEntry>> {
        self.store.all_events(&self.run_id)
    }

    pub fn store(&self) -> &SimStore {
        &self.store
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Find a registered subsystem by type.
    /// For tests and tooling only.
    pub fn subsystem<T: 'static>(&self) -> Option<&T> {
        self.subsystems
            .iter()
            .find_map(|(_, sub)| sub.as_any().downcast_ref::<T>())
    }

    fn persist_day_summary(&self, day: Day, sales: &DailySales) -> SimResult<()> {
        for player in &self.state.players {
            let revenue = sales.get(&player.name).copied().unwrap_or(0.0);
            self.store.insert_daily_sales(&self.run_id, day, &player.name, revenue, player.cash)?;
        }
        Ok(())
    }

    fn take_snapshot(&self, day: Day) -> SimResult<()> {
        let snapshot = SimSnapshot {
            run_id: self.run_id.clone(),
            day,
            state:  self.state.clone(),
            rng:    self.rng.clone(),
        };
        let json = serde_json::to_string(&snapshot)?;
        self.store.save_snapshot(&self.run_id, day, &json)?;
        log::debug!("day={day} engine: snapshot saved");
        Ok(())
    }
}

fn persist_events(
    store:     &SimStore,
    run_id:    &str,
    day:       Day,
    subsystem: &str,
    events:    &[SimEvent],
) -> SimResult<()> {
    for event in events {
        if let SimEvent::ReputationUpdated { player, new_reputation, old_reputation, average_fulfillment, .. } =
            event
        {
            store.insert_reputation_snapshot(
                run_id,
                day,
                player,
                *new_reputation,
                new_reputation - old_reputation,
                *average_fulfillment,
            )?;
        }
        let entry = EventLogEntry {
            id:         None,
            run_id:     run_id.to_string(),
            day,
            subsystem:  subsystem.to_string(),
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
        };
        store.append_event(&entry)?;
    }
    Ok(())
}

fn require_item(state: &GameState, item: &str) -> Result<(), Rejection> {
    match state.item(item) {
        Some(_) => Ok(()),
        None => Err(Rejection::UnknownItem { item: item.to_string() }),
    }
}

fn require_vendor(state: &GameState, vendor: &str) -> Result<(), Rejection> {
    match state.vendor(vendor) {
        Some(_) => Ok(()),
        None => Err(Rejection::UnknownVendor { vendor: vendor.to_string() }),
    }
}
