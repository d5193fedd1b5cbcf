//! Wage subsystem: monthly payroll.
//!
//! Each player pays staff wages once every WAGE_INTERVAL days, counted
//! from its last payment. Wages a store cannot cover are forfeited.

use crate::{
    config::StoreRules,
    error::SimResult,
    event::SimEvent,
    ledger::DayLedger,
    rng::SimRng,
    state::GameState,
    subsystem::SimSubsystem,
    types::Day,
};

pub struct WageSubsystem {
    rules: StoreRules,
}

impl WageSubsystem {
    pub fn new(rules: StoreRules) -> Self {
        Self { rules }
    }
}

impl SimSubsystem for WageSubsystem {
    fn name(&self) -> &'static str {
        "wages"
    }

    fn update(
        &mut self,
        day:     Day,
        state:   &mut GameState,
        _ledger: &mut DayLedger,
        _rng:    &mut SimRng,
    ) -> SimResult<Vec<SimEvent>> {
        let mut out = Vec::new();
        for player in &mut state.players {
            let before = player.last_wage_payment_day;
            let amount = player.pay_monthly_wages(day, &self.rules);
            if player.last_wage_payment_day == before {
                continue;
            }
            log::debug!("day={day} wages: {} paid ${amount:.2}", player.name);
            out.push(SimEvent::WagesPaid { day, player: player.name.clone(), amount });
        }
        Ok(out)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
