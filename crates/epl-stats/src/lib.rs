// Analysis stages over the player statistics table: load, join with league
// standings, aggregate per team, correlate with win rate, and rank.
//
// Extras built on the same rows: next-season projections and position
// percentile profiles.

pub mod aggregate;
pub mod correlation;
pub mod enrich;
pub mod players;
pub mod profile;
pub mod projection;
pub mod ranking;
pub mod standings;

pub use aggregate::{aggregate_by_team, TeamAggregate};
pub use correlation::{
    correlate_all, correlate_each, rank_by_strength, CorrelationBatch, CorrelationResult,
    Significance,
};
pub use enrich::{enrich, TeamFields};
pub use players::{load_players, PlayerRecord, PlayerTable};
pub use standings::{load_standings, Standings};
