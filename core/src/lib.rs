pub mod attraction;
pub mod catalog_subsystem;
pub mod checkout_subsystem;
pub mod command;
pub mod config;
pub mod customer;
pub mod delivery_subsystem;
pub mod demand_subsystem;
pub mod engine;
pub mod error;
pub mod event;
pub mod item;
pub mod ledger;
pub mod market_subsystem;
pub mod player;
pub mod procurement_subsystem;
pub mod reputation_subsystem;
pub mod rng;
pub mod snapshot;
pub mod specialty;
pub mod state;
pub mod store;
pub mod strategy_subsystem;
pub mod subsystem;
pub mod types;
pub mod upgrade;
pub mod vendor;
pub mod wage_subsystem;
