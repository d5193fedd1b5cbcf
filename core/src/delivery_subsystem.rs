//! Delivery subsystem: merges arrived stock into inventory.
//!
//! Runs once per day in the rollover stage, after the day counter has
//! advanced. A delivery queued on day d with lead time n arrives when
//! the counter reaches d + n.

use crate::{
    error::SimResult,
    event::SimEvent,
    ledger::DayLedger,
    rng::SimRng,
    state::GameState,
    subsystem::SimSubsystem,
    types::Day,
};

#[derive(Default)]
pub struct DeliverySubsystem;

impl DeliverySubsystem {
    pub fn new() -> Self {
        Self
    }
}

impl SimSubsystem for DeliverySubsystem {
    fn name(&self) -> &'static str {
        "delivery"
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
            for delivery in player.receive_deliveries(day) {
                log::debug!(
                    "day={day} delivery: {} received {} {}",
                    player.name, delivery.quantity, delivery.item
                );
                out.push(SimEvent::DeliveryReceived {
                    day,
                    player:    player.name.clone(),
                    item:      delivery.item,
                    quantity:  delivery.quantity,
                    unit_cost: delivery.unit_cost,
                });
            }
        }
        Ok(out)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
