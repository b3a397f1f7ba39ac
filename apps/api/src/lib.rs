//! Resume tailoring toolkit: turns resume and cover-letter text into LaTeX,
//! validates it, and compiles it to PDF on the host or in a container.

pub mod config;
pub mod errors;
pub mod latex;
pub mod resume;
pub mod routes;
pub mod state;
