//! KSYK Core Library
//!
//! Campus models, validation, the grid-snapped polygon editor, admin
//! permissions and authentication, configuration, and SQLite storage.

pub mod auth;
pub mod config;
pub mod drawing;
pub mod error;
pub mod invariants;
pub mod models;
pub mod permissions;
pub mod seed;
pub mod storage;

pub use config::AppConfig;
pub use drawing::{Click, DraftFinish, DraftStep, FinishMode, Outline, Point, ShapeEditor};
pub use error::{Error, Result};
pub use models::*;
pub use permissions::*;
pub use storage::{AccountRepository, CampusStorage, Database, Repository};
