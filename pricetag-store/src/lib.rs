//! # Pricetag Store
//!
//! Persistence and synchronization for design records.
//!
//! Two adapters share one CRUD surface: [`LocalStore`] keeps JSON files in a
//! device-local data directory, [`RemoteStore`] talks to the shared backend
//! on behalf of an authenticated principal. [`Synchronizer`] folds both into
//! one logical view.
//!
//! ```text
//! ┌───────────────┐     ┌───────────────┐
//! │  LocalStore   │     │  RemoteStore  │
//! │  (JSON files) │     │  (projects)   │
//! └───────┬───────┘     └───────┬───────┘
//!         │      merged_view    │
//!         └──────────┬──────────┘
//!                    ▼
//!             Synchronizer
//! ```
//!
//! Stores and the synchronizer are explicit handles passed to their callers;
//! there is no ambient global instance.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod local;
pub mod remote;
pub mod sync;

pub use error::{StoreError, StoreResult};
pub use local::{HistoryEntry, LocalStore, HISTORY_CAP};
pub use remote::{AuthProvider, Principal, RemoteStore, StaticAuth};
pub use sync::{merged_view, SyncReport, Synchronizer};
