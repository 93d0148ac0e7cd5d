pub mod attack;
pub mod catalog;
pub mod economy;
pub mod engine;
pub mod error;
pub mod setup;
pub mod synergy;
pub mod types;
pub mod visibility;


pub use catalog::CatalogSource;
pub use engine::{Action, Room, TokenKind};
pub use error::{ActionError, CatalogError};
pub use types::*;
pub use visibility::{project, SeatView};
