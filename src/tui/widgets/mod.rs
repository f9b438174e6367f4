pub mod game;
pub mod results;
pub mod setup;
