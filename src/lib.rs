pub mod disc;
pub mod error;
pub mod initialization;
pub mod io;
pub mod limiter;
pub mod solver;
