// gomoku_session: game session control loop and front-end plumbing.
//
// One `SessionHandle` runs one game on its own control thread, from setup to
// outcome, and then waits for the owner to ask for the next game. The
// session never renders anything: it emits typed `SessionEvent`s, and a
// front end turns them into pixels, lines of text or sounds through the
// `Presenter` and the collaborator traits.
//
// Module overview:
// - `lifecycle.rs`:   `Lifecycle` (Run/Wait/Restart), `GameMode`, and the
//                     first-reason-wins forced-end `Interrupt`.
// - `event.rs`:       Events, outcomes and player labels the session emits.
// - `participant.rs`: The `Participant` trait and its local, remote,
//                     networked-local and computer implementations.
// - `computer.rs`:    Move choice for the computer opponent.
// - `session.rs`:     `SessionHandle` and the control loop.
// - `frontend.rs`:    Collaborator traits and the `Presenter`.
// - `texts.rs`:       Display string templates.
// - `config.rs`:      TOML configuration with environment overrides.
// - `error.rs`:       `SetupFailure` and `ConfigError`.
//
// The terminal front end lives in `src/bin/gomoku.rs`.

pub mod computer;
pub mod config;
pub mod error;
pub mod event;
pub mod frontend;
pub mod lifecycle;
pub mod participant;
pub mod session;
pub mod texts;

pub use config::AppConfig;
pub use error::{ConfigError, SetupFailure};
pub use event::{
    CellClick, Cursor, Outcome, ParticipantKind, PlayerLabel, SessionEvent, SoundCue,
};
pub use frontend::{Audio, BoardSurface, Color, MessageDisplay, Presenter, SettingsStore};
pub use lifecycle::{EndReason, GameMode, Interrupt, Lifecycle};
pub use session::{SessionHandle, SessionOptions};
pub use texts::Texts;
