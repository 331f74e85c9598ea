//! Current game identity.
//!
//! The identity (game name plus VR flag) is owned by the application layer.
//! The settings cache only reads it, through [`GameIdentitySource`], each time
//! it resolves the path of a per-game store.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Game selected when nothing else is configured.
pub const DEFAULT_GAME: &str = "Fallout4";

/// Marker appended to the game name for VR editions.
pub const VR_MARKER: &str = "VR";

/// The game CLASSIC is currently working with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameIdentity {
    /// Free-form game name (e.g. "Fallout4", "Skyrim")
    pub game: String,
    /// Whether the VR edition is selected
    pub vr: bool,
}

impl GameIdentity {
    /// Create an identity for the given game.
    pub fn new(game: impl Into<String>, vr: bool) -> Self {
        Self {
            game: game.into(),
            vr,
        }
    }

    /// Composed identifier used in per-game file names, e.g. `Fallout4VR`.
    pub fn identifier(&self) -> String {
        if self.vr {
            format!("{}{}", self.game, VR_MARKER)
        } else {
            self.game.clone()
        }
    }
}

impl Default for GameIdentity {
    fn default() -> Self {
        Self::new(DEFAULT_GAME, false)
    }
}

/// Read-only access to the current game identity.
pub trait GameIdentitySource: Send + Sync {
    /// The identity as of this call.
    fn current(&self) -> GameIdentity;
}

impl GameIdentitySource for GameIdentity {
    fn current(&self) -> GameIdentity {
        self.clone()
    }
}

/// Game identity that the application layer can change mid-session.
///
/// Clones share the same underlying identity. After changing it, callers must
/// reload the `Game` and `GameLocal` stores themselves; the cache does not
/// notice the change.
#[derive(Debug, Clone, Default)]
pub struct SharedGameIdentity {
    inner: Arc<RwLock<GameIdentity>>,
}

impl SharedGameIdentity {
    /// Wrap an identity for sharing.
    pub fn new(identity: GameIdentity) -> Self {
        Self {
            inner: Arc::new(RwLock::new(identity)),
        }
    }

    /// Copy of the current identity.
    pub fn snapshot(&self) -> GameIdentity {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the whole identity.
    pub fn set(&self, identity: GameIdentity) {
        match self.inner.write() {
            Ok(mut guard) => *guard = identity,
            Err(poisoned) => *poisoned.into_inner() = identity,
        }
    }

    /// Change the game name, keeping the VR flag.
    pub fn set_game(&self, game: impl Into<String>) {
        let mut identity = self.snapshot();
        identity.game = game.into();
        self.set(identity);
    }

    /// Change the VR flag, keeping the game name.
    pub fn set_vr(&self, vr: bool) {
        let mut identity = self.snapshot();
        identity.vr = vr;
        self.set(identity);
    }
}

impl GameIdentitySource for SharedGameIdentity {
    fn current(&self) -> GameIdentity {
        self.snapshot()
    }
}
