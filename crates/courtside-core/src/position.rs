// Basketball positions, roster slots, and slot eligibility.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Listed playing positions as they appear in the cost/position table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    PointGuard,
    ShootingGuard,
    SmallForward,
    PowerForward,
    Center,
}

impl Position {
    pub const ALL: [Position; 5] = [
        Position::PointGuard,
        Position::ShootingGuard,
        Position::SmallForward,
        Position::PowerForward,
        Position::Center,
    ];

    /// Parse a single position token ("PG", "sf", ...).
    ///
    /// Flex designations ("G", "F", "UTIL") are not listed positions and
    /// return `None`.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PG" => Some(Position::PointGuard),
            "SG" => Some(Position::ShootingGuard),
            "SF" => Some(Position::SmallForward),
            "PF" => Some(Position::PowerForward),
            "C" => Some(Position::Center),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::PointGuard => "PG",
            Position::ShootingGuard => "SG",
            Position::SmallForward => "SF",
            Position::PowerForward => "PF",
            Position::Center => "C",
        }
    }

    fn bit(&self) -> u8 {
        match self {
            Position::PointGuard => 1,
            Position::ShootingGuard => 1 << 1,
            Position::SmallForward => 1 << 2,
            Position::PowerForward => 1 << 3,
            Position::Center => 1 << 4,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Position sets
// ---------------------------------------------------------------------------

/// The set of listed positions a candidate carries, e.g. `PF/C`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PositionSet(u8);

impl PositionSet {
    pub fn empty() -> Self {
        PositionSet(0)
    }

    pub fn from_positions(positions: &[Position]) -> Self {
        let mut set = PositionSet::empty();
        for pos in positions {
            set.insert(*pos);
        }
        set
    }

    /// Parse a slash-separated label such as `"PG/SG"`.
    ///
    /// Returns the parsed set and any tokens that were neither a listed
    /// position nor a flex designation.
    pub fn parse(label: &str) -> (Self, Vec<String>) {
        let mut set = PositionSet::empty();
        let mut unknown = Vec::new();
        for token in label.split('/') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match Position::from_str_pos(token) {
                Some(pos) => set.insert(pos),
                None => {
                    if !matches!(token.to_uppercase().as_str(), "G" | "F" | "UTIL") {
                        unknown.push(token.to_string());
                    }
                }
            }
        }
        (set, unknown)
    }

    pub fn insert(&mut self, pos: Position) {
        self.0 |= pos.bit();
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.0 & pos.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        Position::ALL.into_iter().filter(move |p| self.contains(*p))
    }

    /// Canonical label in PG, SG, SF, PF, C order, e.g. `"SF/PF"`.
    pub fn label(&self) -> String {
        self.iter()
            .map(|p| p.display_str())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for PositionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Roster slots
// ---------------------------------------------------------------------------

/// One of the eight named slots of a classic NBA roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    PG,
    SG,
    SF,
    PF,
    C,
    G,
    F,
    UTIL,
}

/// Number of slots in a roster, and therefore the number of selected candidates.
pub const ROSTER_SIZE: usize = 8;

impl Slot {
    /// Display order of a finished roster.
    pub const ALL: [Slot; ROSTER_SIZE] = [
        Slot::PG,
        Slot::SG,
        Slot::SF,
        Slot::PF,
        Slot::C,
        Slot::G,
        Slot::F,
        Slot::UTIL,
    ];

    pub fn display_str(&self) -> &'static str {
        match self {
            Slot::PG => "PG",
            Slot::SG => "SG",
            Slot::SF => "SF",
            Slot::PF => "PF",
            Slot::C => "C",
            Slot::G => "G",
            Slot::F => "F",
            Slot::UTIL => "UTIL",
        }
    }

    pub fn from_str_slot(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PG" => Some(Slot::PG),
            "SG" => Some(Slot::SG),
            "SF" => Some(Slot::SF),
            "PF" => Some(Slot::PF),
            "C" => Some(Slot::C),
            "G" => Some(Slot::G),
            "F" => Some(Slot::F),
            "UTIL" => Some(Slot::UTIL),
            _ => None,
        }
    }

    /// Index into `Slot::ALL`.
    pub fn sort_order(&self) -> usize {
        match self {
            Slot::PG => 0,
            Slot::SG => 1,
            Slot::SF => 2,
            Slot::PF => 3,
            Slot::C => 4,
            Slot::G => 5,
            Slot::F => 6,
            Slot::UTIL => 7,
        }
    }

    /// Whether a candidate with these flags may occupy this slot.
    pub fn accepts(&self, flags: &EligibilityFlags) -> bool {
        match self {
            Slot::PG => flags.pg,
            Slot::SG => flags.sg,
            Slot::SF => flags.sf,
            Slot::PF => flags.pf,
            Slot::C => flags.c,
            Slot::G => flags.g,
            Slot::F => flags.f,
            Slot::UTIL => flags.util,
        }
    }

    /// The other base slot sharing this slot's flex slot (PG <-> SG, SF <-> PF).
    pub fn sibling(&self) -> Option<Slot> {
        match self {
            Slot::PG => Some(Slot::SG),
            Slot::SG => Some(Slot::PG),
            Slot::SF => Some(Slot::PF),
            Slot::PF => Some(Slot::SF),
            _ => None,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Eligibility
// ---------------------------------------------------------------------------

/// Per-slot eligibility derived from a candidate's listed positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EligibilityFlags {
    pub pg: bool,
    pub sg: bool,
    pub sf: bool,
    pub pf: bool,
    pub c: bool,
    pub g: bool,
    pub f: bool,
    pub util: bool,
}

impl EligibilityFlags {
    pub fn from_positions(positions: &PositionSet) -> Self {
        let pg = positions.contains(Position::PointGuard);
        let sg = positions.contains(Position::ShootingGuard);
        let sf = positions.contains(Position::SmallForward);
        let pf = positions.contains(Position::PowerForward);
        let c = positions.contains(Position::Center);
        EligibilityFlags {
            pg,
            sg,
            sf,
            pf,
            c,
            g: pg || sg,
            f: sf || pf,
            util: true,
        }
    }

    /// Slots this candidate may occupy, in roster order.
    pub fn slots(&self) -> Vec<Slot> {
        Slot::ALL.into_iter().filter(|s| s.accepts(self)).collect()
    }
}
