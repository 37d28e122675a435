// Session: the single owner of history, insights and profile, plus persistence.

pub mod controller;
pub mod state;
