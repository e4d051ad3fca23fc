// gomoku_relay: relay server and client transport for networked Gomoku.
//
// The server is a thin message broker for exactly one game. It seats the
// first two TCP connections, tells each its participant number and the
// authoritative settings, and then forwards moves, chat and EXIT between
// them. It never looks at the board; all game logic stays in the clients.
//
// Module overview:
// - `relay.rs`:          Seat table and routing. The core data structure
//                        that `server.rs` drives.
// - `server.rs`:         TCP listener, reader threads (one per seat), and the
//                        main event loop. Uses `std::net` with a
//                        thread-per-reader architecture and an `mpsc` channel
//                        to funnel events into the single-threaded `Relay`.
// - `deny.rs`:           Accept loop that refuses every connection after the
//                        second with an immediate EXIT.
// - `client.rs`:         `Connection`: client side of the transport, with a
//                        background reader thread and a mutex-guarded writer.
// - `liveness.rs`:       Heartbeat monitor that reports a silent server.
// - `message_reader.rs`: Background chat drain used during the local turn.
// - `error.rs`:          `TransportError`.
//
// Dependencies: `gomoku_protocol` (commands and framing) and `gomoku_board`
// (settings). No dependency on the session crate.
//
// The server can run as a standalone binary (`main.rs`) or be embedded in a
// game process via the library API (`start_server`), which is how a hosting
// player runs it.

pub mod client;
pub mod deny;
pub mod error;
pub mod liveness;
pub mod message_reader;
pub mod relay;
pub mod server;

pub use client::{ConnectOptions, Connection};
pub use error::TransportError;
pub use liveness::{LivenessConfig, LivenessFailure, LivenessMonitor, LivenessState};
pub use message_reader::{MessageReader, ReaderEvent};
pub use server::{ServerConfig, ServerHandle, start_server};
