//! `bloodbank` - Blood inventory analysis and donor alert selection
//!
//! This library compares the blood-group mix of registered donors with the
//! expected population distribution, classifies shortages by urgency and
//! chooses which alert, if any, to send donors at a given moment. Storage,
//! delivery and a periodic worker drive the core end to end.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod alert;
pub mod analysis;
pub mod blood_group;
pub mod cli;
pub mod config;
pub mod donor;
pub mod error;
pub mod logging;
pub mod notify;
pub mod sample;
pub mod selector;
pub mod storage;
pub mod worker;

pub use alert::{Alert, AlertPriority, AlertScope, AlertType};
pub use analysis::{BloodGroupPrediction, InventoryAnalysis, InventoryAnalyzer};
pub use blood_group::BloodGroup;
pub use config::Config;
pub use donor::DonorRecord;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use notify::{AlertSink, DeliveryFilter, NotificationChannel};
pub use selector::AlertSelector;
pub use storage::{Storage, StorageStats};
pub use worker::{CycleOutcome, DonorSource, Worker, WorkerHandle};
