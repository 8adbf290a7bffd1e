//! Skywatch core - alert reconciliation logic for drone surveillance.
//!
//! Everything here is pure: time comes in as arguments, nothing does I/O.

pub mod batcher;
pub mod connection;
pub mod debounce;
pub mod display;
pub mod error;
pub mod filters;
pub mod mode;
pub mod models;
pub mod presenter;
pub mod wire;

pub use batcher::{AlertBatcher, AlertList, BATCH_INTERVAL, MAX_ALERTS};
pub use connection::{ConnectionEvent, ConnectionStatus};
pub use debounce::Debounce;
pub use error::ParseError;
pub use filters::{
    filter_alerts, matches_source, matches_window, AlertSummary, DateFilter, SourceFilter,
};
pub use mode::{
    ActiveMode, ModeAction, ModeState, ModeSwitchPolicy, ProcessCommand, ProcessingMode,
};
pub use models::{Alert, AlertKind, AlertSource, RawAlert, PLACEHOLDER_IMAGE};
pub use presenter::{LivePresenter, LIVE_ALERT_TTL};
pub use wire::{decode_push_message, HistoryResponse, PushEnvelope};
