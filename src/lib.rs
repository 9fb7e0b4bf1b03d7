pub mod cache;
pub mod index;
pub mod model;
pub mod nav;
pub mod remote;
pub mod staleness;
pub mod store;
pub mod sync;
pub mod tui;
