// Front-end collaborators and the presenter that drives them.
//
// The traits are the narrow surfaces a UI has to provide: a board that can
// draw stones, a message area, an audio sink and a settings store.
// `Presenter` turns each `SessionEvent` into calls on them, using `Texts`
// for every sentence. A front end runs a presenter on its own thread and
// feeds it the session's event receiver.

use gomoku_board::{CellState, Coord, Settings};

use crate::event::{Cursor, Outcome, SessionEvent, SoundCue};
use crate::texts::{Texts, fill};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    Default,
    Black,
    White,
    Red,
    Blue,
    Gray,
    Green,
}

pub trait BoardSurface {
    fn render_stone(&mut self, row: usize, col: usize, state: CellState);
    /// Mark the winning run, drawn in the winner's colour.
    fn highlight_winning_line(&mut self, cells: &[Coord], color: CellState);
    fn set_cursor(&mut self, cursor: Cursor);
}

pub trait MessageDisplay {
    /// Append `text` and end the line.
    fn append_line(&mut self, text: &str, color: Color);
    /// Append `text` without ending the line.
    fn append_segment(&mut self, text: &str, foreground: Color, background: Color);
    fn enable_network_controls(&mut self, enabled: bool);
}

pub trait Audio {
    fn play(&mut self, cue: SoundCue);
}

pub trait SettingsStore {
    fn read(&self) -> Settings;
    fn write(&mut self, settings: Settings);
}

/// Maps session events onto the collaborators.
pub struct Presenter<B, M, A, S> {
    pub board: B,
    pub messages: M,
    pub audio: A,
    pub settings: S,
    texts: Texts,
}

impl<B, M, A, S> Presenter<B, M, A, S>
where
    B: BoardSurface,
    M: MessageDisplay,
    A: Audio,
    S: SettingsStore,
{
    pub fn new(board: B, messages: M, audio: A, settings: S, texts: Texts) -> Self {
        Self {
            board,
            messages,
            audio,
            settings,
            texts,
        }
    }

    pub fn dispatch(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Started { .. } => {
                self.messages.append_line(&self.texts.start, Color::Green);
            }
            SessionEvent::SettingsAdopted(adopted) => {
                // Keep local-only preferences from the store.
                let mut stored = self.settings.read();
                stored.adopt(adopted);
                self.settings.write(stored);
                let rule = if adopted.strict_exact_length {
                    &self.texts.rule_exact
                } else {
                    &self.texts.rule_at_least
                };
                let line = fill(
                    &self.texts.settings_adopted,
                    &[
                        ("size", adopted.board_size.to_string().as_str()),
                        ("win", adopted.win_length.to_string().as_str()),
                        ("rule", rule.as_str()),
                    ],
                );
                self.messages.append_line(&line, Color::Gray);
            }
            SessionEvent::NetworkControls(enabled) => {
                self.messages.enable_network_controls(*enabled);
            }
            SessionEvent::TurnStarted {
                move_number,
                stone,
                player,
                ..
            } => {
                let prefix = fill(&self.texts.move_prefix, &[("n", move_number.to_string().as_str())]);
                self.messages
                    .append_segment(&prefix, Color::Blue, Color::Default);
                let (fg, bg) = match stone {
                    CellState::White => (Color::Black, Color::White),
                    _ => (Color::White, Color::Black),
                };
                self.messages
                    .append_segment(&self.texts.player(*player), fg, bg);
            }
            SessionEvent::StonePlaced { mv, label, .. } => {
                self.board.render_stone(mv.row, mv.col, mv.state);
                self.messages
                    .append_line(&format!("  \u{279C}  {label}"), Color::Red);
            }
            SessionEvent::ChatReceived { from, text } => {
                let line = fill(
                    &self.texts.chat_received,
                    &[
                        ("player", self.texts.player(*from).as_str()),
                        ("text", text.as_str()),
                    ],
                );
                self.messages.append_line(&line, Color::Default);
            }
            SessionEvent::ChatSent(text) => {
                let line = fill(&self.texts.chat_sent, &[("text", text.as_str())]);
                self.messages.append_line(&line, Color::Gray);
            }
            SessionEvent::Cursor(cursor) => self.board.set_cursor(*cursor),
            SessionEvent::Sound(cue) => self.audio.play(*cue),
            SessionEvent::Finished(outcome) => self.finished(outcome),
        }
    }

    fn finished(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Won {
                winner,
                player,
                line,
                move_number,
                local_victory,
            } => {
                self.board.highlight_winning_line(line, *winner);
                let name = self.texts.player(*player).to_uppercase();
                self.messages
                    .append_line(&fill(&self.texts.won, &[("player", name.as_str())]), Color::Red);
                let template = if *local_victory {
                    &self.texts.victory
                } else {
                    &self.texts.defeat
                };
                let summary = fill(template, &[("n", move_number.to_string().as_str())]);
                self.messages.append_line(&summary, Color::Red);
            }
            Outcome::Draw { .. } => {
                self.messages.append_line(&self.texts.draw, Color::Red);
            }
            Outcome::Disconnected { .. } => {
                self.messages
                    .append_line(&self.texts.disconnected, Color::Red);
            }
            Outcome::CantConnect { reason } => {
                let line = fill(&self.texts.cant_connect, &[("reason", reason.as_str())]);
                self.messages.append_line(&line, Color::Red);
            }
        }
        self.messages
            .append_line(&self.texts.new_game_hint, Color::Gray);
    }
}
