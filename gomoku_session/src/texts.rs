// Display strings.
//
// Every user-visible sentence lives here as a template, loaded from the
// `[texts]` table of the config file with English defaults. Placeholders are
// written `{name}` and filled by `fill`. The session itself never touches
// these; only the presenter does.

use serde::{Deserialize, Serialize};

use crate::event::PlayerLabel;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Texts {
    pub start: String,
    /// `{n}`: move number.
    pub move_prefix: String,
    pub player_you: String,
    pub player_computer: String,
    /// `{n}`: 1-based player number.
    pub player_numbered: String,
    /// `{player}`: winner's name in upper case.
    pub won: String,
    /// `{n}`: move number of the winning move.
    pub victory: String,
    pub defeat: String,
    pub draw: String,
    pub disconnected: String,
    /// `{reason}`: why the connection could not be made.
    pub cant_connect: String,
    /// `{player}`, `{text}`.
    pub chat_received: String,
    /// `{text}`.
    pub chat_sent: String,
    /// `{size}`, `{win}`, `{rule}`.
    pub settings_adopted: String,
    pub rule_exact: String,
    pub rule_at_least: String,
    pub new_game_hint: String,
}

impl Default for Texts {
    fn default() -> Self {
        Self {
            start: "The game has started.".into(),
            move_prefix: "Move #{n}: ".into(),
            player_you: "You".into(),
            player_computer: "Computer".into(),
            player_numbered: "Player {n}".into(),
            won: "{player} WON!".into(),
            victory: "Congratulations, you won with move #{n}.".into(),
            defeat: "You lost after {n} moves.".into(),
            draw: "DRAW! The board is full.".into(),
            disconnected: "The connection with the other player was lost.".into(),
            cant_connect: "Cannot connect to the server: {reason}".into(),
            chat_received: "{player}: {text}".into(),
            chat_sent: "[Sent: {text}]".into(),
            settings_adopted: "Using the server's settings: {size}x{size} board, {win} in a row ({rule})."
                .into(),
            rule_exact: "exactly".into(),
            rule_at_least: "at least".into(),
            new_game_hint: "Type /new to start a new game.".into(),
        }
    }
}

impl Texts {
    pub fn player(&self, label: PlayerLabel) -> String {
        match label {
            PlayerLabel::You => self.player_you.clone(),
            PlayerLabel::Computer => self.player_computer.clone(),
            PlayerLabel::Player(n) => fill(&self.player_numbered, &[("n", n.to_string().as_str())]),
        }
    }
}

/// Replace each `{key}` in `template` with its value.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in values {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}
