// CLI entry point for the standalone Gomoku relay server.
//
// Starts a server that two game clients connect to. The server forwards
// moves and chat between them and refuses any further connection. It exits
// by itself once both players have left. See `server.rs` for the networking
// architecture and `relay.rs` for the seat table.
//
// Usage:
//   gomoku-server [OPTIONS]
//     --port <PORT>    Listen port (default: 5000)
//     --size <N>       Board size: 7, 9, 11, 13 or 15 (default: 15)
//     --win <K>        Stones in a row to win: 3, 4 or 5 (default: 5)
//     --strict         Only a run of exactly K wins
//     --seat-timeout <SECS>
//                      Drop a player silent this long, 0 to never (default: 10)
//
// Logging goes to stderr; `RUST_LOG` overrides the default `info` filter.

use std::thread;
use std::time::Duration;

use gomoku_relay::server::{ServerConfig, start_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = parse_args();

    let (handle, addr) = match start_server(config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Failed to start server: {e}");
            std::process::exit(1);
        }
    };

    println!("Gomoku server listening on {addr}");
    println!("Waiting for two players. Press Ctrl+C to stop.");

    // The process exits on SIGINT by default, which is fine for a relay with
    // no state worth saving.
    while !handle.is_finished() {
        thread::sleep(Duration::from_millis(100));
    }

    info!("game over, exiting");
    handle.stop();
}

/// Parse command-line arguments into a `ServerConfig`. Uses simple
/// `std::env::args()` matching.
fn parse_args() -> ServerConfig {
    let mut config = ServerConfig::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                config.port = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--port requires a valid port number");
                    std::process::exit(1);
                });
            }
            "--size" => {
                i += 1;
                config.settings.board_size =
                    args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                        eprintln!("--size requires a number");
                        std::process::exit(1);
                    });
            }
            "--win" => {
                i += 1;
                config.settings.win_length =
                    args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                        eprintln!("--win requires a number");
                        std::process::exit(1);
                    });
            }
            "--strict" => {
                config.settings.strict_exact_length = true;
            }
            "--seat-timeout" => {
                i += 1;
                let secs: u64 = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--seat-timeout requires a number of seconds");
                    std::process::exit(1);
                });
                config.seat_timeout = (secs > 0).then(|| Duration::from_secs(secs));
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    if let Err(e) = config.settings.validate() {
        eprintln!("Invalid settings: {e}");
        std::process::exit(1);
    }
    config
}

fn print_usage() {
    println!("Usage: gomoku-server [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --port <PORT>    Listen port (default: 5000)");
    println!("  --size <N>       Board size: 7, 9, 11, 13 or 15 (default: 15)");
    println!("  --win <K>        Stones in a row to win: 3, 4 or 5 (default: 5)");
    println!("  --strict         Only a run of exactly K wins");
    println!("  --seat-timeout <SECS>");
    println!("                   Drop a player silent this long, 0 to never (default: 10)");
    println!("  --help, -h       Show this help");
}
