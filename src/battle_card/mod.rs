//! Battle cards for the sales team.

mod generator;
mod repository;
mod types;

pub use generator::BattleCardGenerator;
pub use repository::BattleCardRepository;
pub use types::{
    BattleCard, BattleCardFilter, BattleCardStatus, BattleCardUpdate, NewBattleCard, Objection,
    DEFAULT_VERSION,
};
