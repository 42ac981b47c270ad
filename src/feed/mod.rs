//! Table feed subsystem.
//!
//! # Data Flow
//! ```text
//! sort / page change
//!     → table.rs (generation += 1, abort previous task, state = Loading)
//!     → spawned task: DataSource::fetch_page
//!     → completion channel, tagged with generation
//!     → next_update (drop stale, apply current, state = Succeeded | Failed)
//!     → PageHook (persisted endpoints, success only)
//! ```
//!
//! # Design Decisions
//! - Depth-1 queue: a new request replaces, never waits behind, the old one
//! - Abort plus generation check; a task can finish before it is aborted
//! - Single owner (`&mut self`), so the generation needs no locking

pub mod state;
pub mod table;

pub use state::{FeedUpdate, LoadState, PageHook};
pub use table::TableFeed;
