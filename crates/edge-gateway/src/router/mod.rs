//! Route matching for the gateway server.

pub mod table;

pub use table::RouteTable;
