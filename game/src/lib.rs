pub mod action;
pub mod board;
pub mod environment;
pub mod game;
pub mod record;
