//! Deterministic simulation core for a sector-based shooter engine.
//!
//! The crate covers the per-tic world update (thinkers and sector
//! specials), the trackers that pause mechanisms by tag, the save game
//! codec, and the screen wipe. Rendering, audio, input and map loading stay
//! outside: sounds are queued on [`context::SimContext::sounds`] and maps
//! arrive as an already-built [`level::Level`].
pub mod config;
pub mod constants;
pub mod context;
pub mod game;
pub mod level;
pub mod logging;
pub mod numeric;
pub mod player;
pub mod random;
pub mod saveg;
pub mod sound;
pub mod specials;
pub mod thinker;
pub mod wipe;

pub use config::{ConfigError, SimConfig};
pub use context::SimContext;
pub use game::{NoHooks, SimError, TickHooks, World};
pub use level::{Level, Line, Sector, Side};
pub use logging::init as init_logging;
pub use numeric::{Angle, Fixed};
pub use saveg::{load_game, save_game, save_to_vec, LoadError, SaveError};
pub use thinker::{Mobj, ThinkOutcome, Thinker, ThinkerId, ThinkerRegistry};

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use gloom::prelude::*;
    //! ```

    pub use crate::config::SimConfig;
    pub use crate::game::{NoHooks, World};
    pub use crate::level::{Level, Line, Sector, Side};
    pub use crate::numeric::Fixed;
    pub use crate::saveg::{load_game, save_to_vec};
    pub use crate::specials::{ActiveList, MoveResult};
    pub use crate::thinker::{Thinker, ThinkerId};
}
