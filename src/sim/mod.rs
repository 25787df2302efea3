pub mod event;
pub mod leaderboard;
pub mod level;
pub mod step;
pub mod world;
