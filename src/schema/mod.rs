pub mod family;
pub mod normalize;

pub use family::{Derivation, Family, FamilySchema, Page};
pub use normalize::{normalize, season_label, LEAGUE_AVERAGE, PLAYOFF_MARKER};
