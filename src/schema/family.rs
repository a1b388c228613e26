// src/schema/family.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which page of a season a family's table lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    /// `NBA_{year}.html`, the season summary page.
    Summary,
    /// `NBA_{year}_ratings.html`.
    Ratings,
}

/// One category of scraped team statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Family {
    Ratings,
    Misc,
    Per100,
    OppPer100,
    Shooting,
    OppShooting,
}

impl Family {
    /// Join order: the anchor first, then every right-hand table.
    pub const ALL: [Family; 6] = [
        Family::Ratings,
        Family::Misc,
        Family::Per100,
        Family::OppPer100,
        Family::Shooting,
        Family::OppShooting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Ratings => "ratings",
            Family::Misc => "misc",
            Family::Per100 => "per100",
            Family::OppPer100 => "opp-per100",
            Family::Shooting => "shooting",
            Family::OppShooting => "opp-shooting",
        }
    }

    pub fn schema(&self) -> &'static FamilySchema {
        match self {
            Family::Ratings => &RATINGS,
            Family::Misc => &MISC,
            Family::Per100 => &PER100,
            Family::OppPer100 => &OPP_PER100,
            Family::Shooting => &SHOOTING,
            Family::OppShooting => &OPP_SHOOTING,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A computed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// `field = part / (part + other)`. Both operands zero is an error; any
    /// other zero denominator follows IEEE division.
    Share {
        field: &'static str,
        part: &'static str,
        other: &'static str,
    },
}

impl Derivation {
    pub fn field(&self) -> &'static str {
        match self {
            Derivation::Share { field, .. } => *field,
        }
    }
}

/// Fixed, versioned output schema of one family.
///
/// `fields` is matched to the page table **by position** once spacer columns
/// (blank label in the last header row) are removed. The site renames and
/// reorders labels between seasons, so labels are never used as keys.
#[derive(Debug)]
pub struct FamilySchema {
    pub family: Family,
    pub table_id: &'static str,
    pub page: Page,
    pub fields: &'static [&'static str],
    pub derived: &'static [Derivation],
    /// Whether team names on this page carry the playoff `*` marker. When
    /// true the family publishes a `PLAYOFF_TEAM` flag.
    pub playoff_marker: bool,
    pub column_order: &'static [&'static str],
    /// Name the family table is persisted under.
    pub artifact: &'static str,
}

/// Fields holding text; every other field is numeric.
pub const TEXT_FIELDS: &[&str] = &["TEAM", "CONFERENCE", "DIVISION", "ARENA"];

impl FamilySchema {
    pub fn is_text(&self, field: &str) -> bool {
        TEXT_FIELDS.contains(&field)
    }

    pub fn column_order(&self) -> Vec<String> {
        self.column_order.iter().map(|c| c.to_string()).collect()
    }
}

pub static RATINGS: FamilySchema = FamilySchema {
    family: Family::Ratings,
    table_id: "ratings",
    page: Page::Ratings,
    fields: &[
        "RANK",
        "TEAM",
        "CONFERENCE",
        "DIVISION",
        "W",
        "L",
        "W/L%",
        "MOV",
        "ORTG",
        "DRTG",
        "NRTG",
        "ADJUSTED_MOV",
        "ADJUSTED_ORTG",
        "ADJUSTED_DRTG",
        "ADJUSTED_NRTG",
    ],
    derived: &[],
    playoff_marker: false,
    column_order: &[
        "RANK",
        "TEAM",
        "SEASON",
        "CONFERENCE",
        "DIVISION",
        "W",
        "L",
        "W/L%",
        "MOV",
        "ORTG",
        "DRTG",
        "NRTG",
        "ADJUSTED_MOV",
        "ADJUSTED_ORTG",
        "ADJUSTED_DRTG",
        "ADJUSTED_NRTG",
    ],
    artifact: "Team_Ratings",
};

pub static MISC: FamilySchema = FamilySchema {
    family: Family::Misc,
    table_id: "misc_stats",
    page: Page::Summary,
    fields: &[
        "RANK",
        "TEAM",
        "AVERAGE_AGE",
        "W",
        "L",
        "PW",
        "PL",
        "MOV",
        "SOS",
        "SRS",
        "ORTG",
        "DRTG",
        "NRTG",
        "PACE",
        "FT_RATE",
        "3PA_RATE",
        "TS%",
        "OFFENSIVE_EFG%",
        "OFFENSIVE_TOV%",
        "OFFENSIVE_ORB%",
        "OFFENSIVE_FT/FGA",
        "DEFENSIVE_eFG%",
        "DEFENSIVE_TOV%",
        "DEFENSIVE_DRB%",
        "DEFENSIVE_FT/FGA",
        "ARENA",
        "TOTAL_ATTENDANCE",
        "ATTENDANCE/G",
    ],
    derived: &[Derivation::Share {
        field: "W/L%",
        part: "W",
        other: "L",
    }],
    playoff_marker: true,
    column_order: &[
        "RANK",
        "SEASON",
        "TEAM",
        "PLAYOFF_TEAM",
        "AVERAGE_AGE",
        "W",
        "L",
        "W/L%",
        "PW",
        "PL",
        "MOV",
        "SOS",
        "SRS",
        "ORTG",
        "DRTG",
        "NRTG",
        "PACE",
        "FT_RATE",
        "3PA_RATE",
        "TS%",
        "OFFENSIVE_EFG%",
        "OFFENSIVE_TOV%",
        "OFFENSIVE_ORB%",
        "OFFENSIVE_FT/FGA",
        "DEFENSIVE_eFG%",
        "DEFENSIVE_TOV%",
        "DEFENSIVE_DRB%",
        "DEFENSIVE_FT/FGA",
        "ARENA",
        "TOTAL_ATTENDANCE",
        "ATTENDANCE/G",
    ],
    artifact: "Miscellaneous_Stats",
};

pub static PER100: FamilySchema = FamilySchema {
    family: Family::Per100,
    table_id: "team-stats-per_poss",
    page: Page::Summary,
    fields: &[
        "RANK",
        "TEAM",
        "G",
        "MP",
        "PER100_FG",
        "PER100_FGA",
        "PER100_FG%",
        "PER100_3P",
        "PER100_3PA",
        "PER100_3P%",
        "PER100_2P",
        "PER100_2PA",
        "PER100_2P%",
        "PER100_FT",
        "PER100_FTA",
        "PER100_FT%",
        "PER100_ORB",
        "PER100_DRB",
        "PER100_TRB",
        "PER100_AST",
        "PER100_STL",
        "PER100_BLK",
        "PER100_TOV",
        "PER100_PF",
        "PER100_PTS",
    ],
    derived: &[],
    playoff_marker: true,
    column_order: &[
        "RANK",
        "SEASON",
        "TEAM",
        "PLAYOFF_TEAM",
        "G",
        "MP",
        "PER100_FG",
        "PER100_FGA",
        "PER100_FG%",
        "PER100_3P",
        "PER100_3PA",
        "PER100_3P%",
        "PER100_2P",
        "PER100_2PA",
        "PER100_2P%",
        "PER100_FT",
        "PER100_FTA",
        "PER100_FT%",
        "PER100_ORB",
        "PER100_DRB",
        "PER100_TRB",
        "PER100_AST",
        "PER100_STL",
        "PER100_BLK",
        "PER100_TOV",
        "PER100_PF",
        "PER100_PTS",
    ],
    artifact: "Per_100_Poss",
};

pub static OPP_PER100: FamilySchema = FamilySchema {
    family: Family::OppPer100,
    table_id: "opponent-stats-per_poss",
    page: Page::Summary,
    fields: &[
        "RANK",
        "TEAM",
        "G",
        "MP",
        "OPP_PER100_FG",
        "OPP_PER100_FGA",
        "OPP_PER100_FG%",
        "OPP_PER100_3P",
        "OPP_PER100_3PA",
        "OPP_PER100_3P%",
        "OPP_PER100_2P",
        "OPP_PER100_2PA",
        "OPP_PER100_2P%",
        "OPP_PER100_FT",
        "OPP_PER100_FTA",
        "OPP_PER100_FT%",
        "OPP_PER100_ORB",
        "OPP_PER100_DRB",
        "OPP_PER100_TRB",
        "OPP_PER100_AST",
        "OPP_PER100_STL",
        "OPP_PER100_BLK",
        "OPP_PER100_TOV",
        "OPP_PER100_PF",
        "OPP_PER100_PTS",
    ],
    derived: &[],
    playoff_marker: true,
    column_order: &[
        "RANK",
        "SEASON",
        "TEAM",
        "PLAYOFF_TEAM",
        "G",
        "MP",
        "OPP_PER100_FG",
        "OPP_PER100_FGA",
        "OPP_PER100_FG%",
        "OPP_PER100_3P",
        "OPP_PER100_3PA",
        "OPP_PER100_3P%",
        "OPP_PER100_2P",
        "OPP_PER100_2PA",
        "OPP_PER100_2P%",
        "OPP_PER100_FT",
        "OPP_PER100_FTA",
        "OPP_PER100_FT%",
        "OPP_PER100_ORB",
        "OPP_PER100_DRB",
        "OPP_PER100_TRB",
        "OPP_PER100_AST",
        "OPP_PER100_STL",
        "OPP_PER100_BLK",
        "OPP_PER100_TOV",
        "OPP_PER100_PF",
        "OPP_PER100_PTS",
    ],
    artifact: "Opponent_Per_100_Poss",
};

pub static SHOOTING: FamilySchema = FamilySchema {
    family: Family::Shooting,
    table_id: "team_shooting",
    page: Page::Summary,
    fields: &[
        "RANK",
        "TEAM",
        "G",
        "MP",
        "FG%",
        "AVERAGE_DISTANCE",
        "%FGA_2P",
        "%FGA_0-3",
        "%FGA_3-10",
        "%FGA_10-16",
        "FGA_16-3PT",
        "%FGA_3P",
        "FG%_2P",
        "FG%_0-3",
        "FG%_3-10",
        "FG%_10-16",
        "FG%_16-3PT",
        "FG%_3P",
        "%ASTD_2P",
        "%FGA_DUNKS",
        "DUNKS_MADE",
        "%FGA_LAYUPS",
        "LAYUPS_MADE",
        "%ASTD_3P",
        "%FGA3P_CORNER",
        "FG%3_CORNER",
        "HEAVE_ATTEMPTS",
        "HEAVE_MAKES",
    ],
    derived: &[],
    playoff_marker: true,
    column_order: &[
        "RANK",
        "SEASON",
        "TEAM",
        "PLAYOFF_TEAM",
        "G",
        "MP",
        "FG%",
        "AVERAGE_DISTANCE",
        "%FGA_2P",
        "%FGA_0-3",
        "%FGA_3-10",
        "%FGA_10-16",
        "FGA_16-3PT",
        "%FGA_3P",
        "FG%_2P",
        "FG%_0-3",
        "FG%_3-10",
        "FG%_10-16",
        "FG%_16-3PT",
        "FG%_3P",
        "%ASTD_2P",
        "%FGA_DUNKS",
        "DUNKS_MADE",
        "%FGA_LAYUPS",
        "LAYUPS_MADE",
        "%ASTD_3P",
        "%FGA3P_CORNER",
        "FG%3_CORNER",
        "HEAVE_ATTEMPTS",
        "HEAVE_MAKES",
    ],
    artifact: "Team_Shooting",
};

pub static OPP_SHOOTING: FamilySchema = FamilySchema {
    family: Family::OppShooting,
    table_id: "opponent_shooting",
    page: Page::Summary,
    fields: &[
        "RANK",
        "TEAM",
        "G",
        "MP",
        "OPP_FG%",
        "OPP_AVERAGE_DISTANCE",
        "OPP_%FGA_2P",
        "OPP_%FGA_0-3",
        "OPP_%FGA_3-10",
        "OPP_%FGA_10-16",
        "OPP_FGA_16-3PT",
        "OPP_%FGA_3P",
        "OPP_FG%_2P",
        "OPP_FG%_0-3",
        "OPP_FG%_3-10",
        "OPP_FG%_10-16",
        "OPP_FG%_16-3PT",
        "OPP_FG%_3P",
        "OPP_%ASTD_2P",
        "OPP_%FGA_DUNKS",
        "OPP_DUNKS_MADE",
        "OPP_%FGA_LAYUPS",
        "OPP_LAYUPS_MADE",
        "OPP_%ASTD_3P",
        "OPP_%FGA3P_CORNER",
        "OPP_FG%3_CORNER",
    ],
    derived: &[],
    playoff_marker: true,
    column_order: &[
        "RANK",
        "SEASON",
        "TEAM",
        "PLAYOFF_TEAM",
        "G",
        "MP",
        "OPP_FG%",
        "OPP_AVERAGE_DISTANCE",
        "OPP_%FGA_2P",
        "OPP_%FGA_0-3",
        "OPP_%FGA_3-10",
        "OPP_%FGA_10-16",
        "OPP_FGA_16-3PT",
        "OPP_%FGA_3P",
        "OPP_FG%_2P",
        "OPP_FG%_0-3",
        "OPP_FG%_3-10",
        "OPP_FG%_10-16",
        "OPP_FG%_16-3PT",
        "OPP_FG%_3P",
        "OPP_%ASTD_2P",
        "OPP_%FGA_DUNKS",
        "OPP_DUNKS_MADE",
        "OPP_%FGA_LAYUPS",
        "OPP_LAYUPS_MADE",
        "OPP_%ASTD_3P",
        "OPP_%FGA3P_CORNER",
        "OPP_FG%3_CORNER",
    ],
    artifact: "Opponent_Shooting",
};
