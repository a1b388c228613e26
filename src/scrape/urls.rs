// src/scrape/urls.rs

use anyhow::{Context, Result};
use url::Url;

use crate::schema::Page;

pub const DEFAULT_BASE_URL: &str = "https://www.basketball-reference.com";

/// `base/leagues/NBA_{year}.html` or `base/leagues/NBA_{year}_ratings.html`.
pub fn season_page_url(base: &str, page: Page, season_end_year: u16) -> Result<Url> {
    let base = if base.ends_with('/') {
        Url::parse(base)
    } else {
        Url::parse(&format!("{}/", base))
    }
    .with_context(|| format!("parsing base URL {}", base))?;

    let file = match page {
        Page::Summary => format!("leagues/NBA_{}.html", season_end_year),
        Page::Ratings => format!("leagues/NBA_{}_ratings.html", season_end_year),
    };
    base.join(&file)
        .with_context(|| format!("joining {} onto {}", file, base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_both_page_kinds() -> Result<()> {
        assert_eq!(
            season_page_url(DEFAULT_BASE_URL, Page::Summary, 2012)?.as_str(),
            "https://www.basketball-reference.com/leagues/NBA_2012.html"
        );
        assert_eq!(
            season_page_url("http://mirror.test/bbref/", Page::Ratings, 2005)?.as_str(),
            "http://mirror.test/bbref/leagues/NBA_2005_ratings.html"
        );
        Ok(())
    }
}
