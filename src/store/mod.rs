//! The closed set of settings stores.
//!
//! Each store is one YAML document on disk. Two of them hold reference data
//! shipped with CLASSIC and are never written at runtime:
//!
//! | Store | Mutable | Contents |
//! |---|---|---|
//! | `Main` | no | Shared database, including the default settings template |
//! | `Settings` | yes | User preferences (`CLASSIC Settings.yaml`) |
//! | `Ignore` | yes | User ignore lists |
//! | `Game` | no | Per-game database |
//! | `GameLocal` | yes | Per-game local state (detected paths, versions) |
//! | `Test` | yes | Fixture store used by tests |

pub mod paths;

use serde::{Deserialize, Serialize};

/// Identifies one settings document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Store {
    Main,
    Settings,
    Ignore,
    Game,
    GameLocal,
    Test,
}

impl Store {
    /// Number of stores.
    pub const COUNT: usize = 6;

    /// Every store, in declaration order.
    pub const ALL: [Store; Store::COUNT] = [
        Store::Main,
        Store::Settings,
        Store::Ignore,
        Store::Game,
        Store::GameLocal,
        Store::Test,
    ];

    /// Whether runtime writes to this store are allowed.
    pub fn is_mutable(self) -> bool {
        !matches!(self, Store::Main | Store::Game)
    }

    /// Position of this store in [`Store::ALL`].
    pub(crate) fn index(self) -> usize {
        match self {
            Store::Main => 0,
            Store::Settings => 1,
            Store::Ignore => 2,
            Store::Game => 3,
            Store::GameLocal => 4,
            Store::Test => 5,
        }
    }

    /// Number of distinct cache slots (see [`Store::slot`]).
    pub(crate) const SLOT_COUNT: usize = 5;

    /// Cache slot holding this store's document.
    ///
    /// `Test` is backed by the same file as `Settings`, so the two share one
    /// slot and one lock.
    pub(crate) fn slot(self) -> usize {
        match self {
            Store::Test => Store::Settings.index(),
            other => other.index(),
        }
    }

    /// Parse from string, case-insensitive. Accepts `game-local` and `game_local`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "main" => Some(Store::Main),
            "settings" => Some(Store::Settings),
            "ignore" => Some(Store::Ignore),
            "game" => Some(Store::Game),
            "gamelocal" => Some(Store::GameLocal),
            "test" => Some(Store::Test),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Store::Main => "Main",
            Store::Settings => "Settings",
            Store::Ignore => "Ignore",
            Store::Game => "Game",
            Store::GameLocal => "GameLocal",
            Store::Test => "Test",
        }
    }
}

impl std::fmt::Display for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Store {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Store::parse(s).ok_or_else(|| {
            format!(
                "unknown store '{}' (expected one of: main, settings, ignore, game, game-local, test)",
                s
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutability_classes() {
        let immutable: Vec<Store> = Store::ALL.into_iter().filter(|s| !s.is_mutable()).collect();
        assert_eq!(immutable, vec![Store::Main, Store::Game]);
    }

    #[test]
    fn test_index_matches_all_order() {
        for (i, store) in Store::ALL.iter().enumerate() {
            assert_eq!(store.index(), i);
        }
    }

    #[test]
    fn test_slots_follow_backing_files() {
        assert_eq!(Store::Test.slot(), Store::Settings.slot());
        let mut slots: Vec<usize> = Store::ALL.iter().map(|s| s.slot()).collect();
        slots.sort_unstable();
        slots.dedup();
        assert_eq!(slots.len(), Store::SLOT_COUNT);
        assert!(slots.iter().all(|&slot| slot < Store::SLOT_COUNT));
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(Store::parse("MAIN"), Some(Store::Main));
        assert_eq!(Store::parse("game-local"), Some(Store::GameLocal));
        assert_eq!(Store::parse("Game_Local"), Some(Store::GameLocal));
        assert_eq!(Store::parse("GameLocal"), Some(Store::GameLocal));
        assert_eq!(Store::parse("nope"), None);
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for store in Store::ALL {
            assert_eq!(Store::parse(&store.to_string()), Some(store));
        }
    }

    #[test]
    fn test_from_str_error_lists_choices() {
        let err = "bogus".parse::<Store>().unwrap_err();
        assert!(err.contains("game-local"));
    }
}
