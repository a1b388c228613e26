pub mod extract;
pub mod source;
pub mod urls;

pub use extract::{extract, RawGrid};
pub use source::{CachedSource, HttpSource, NoPacer, PacedSource, Pacer, PageSource, RandomPacer};
pub use urls::{season_page_url, DEFAULT_BASE_URL};
