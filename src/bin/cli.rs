//! keydb CLI Client
//!
//! Command-line interface for interacting with a keydb server.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use keydb::protocol::{read_response, write_command, Command, Status};

/// keydb CLI
#[derive(Parser, Debug)]
#[command(name = "keydb-cli")]
#[command(about = "CLI for the keydb key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Put a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Ping the server
    Ping,
}

impl From<Commands> for Command {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Get { key } => Command::Get {
                key: key.into_bytes(),
            },
            Commands::Put { key, value } => Command::Put {
                key: key.into_bytes(),
                value: value.into_bytes(),
            },
            Commands::Ping => Command::Ping,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args.server, args.command.into()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(server: &str, command: Command) -> keydb::Result<ExitCode> {
    let stream = TcpStream::connect(server)
        .map_err(|e| keydb::KeyDbError::Network(format!("Failed to connect to {}: {}", server, e)))?;
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);

    write_command(&mut writer, &command)?;
    let response = read_response(&mut reader)?;
    let payload = response.payload_text();

    Ok(match response.status {
        Status::Ok => {
            if !payload.is_empty() {
                println!("{}", payload);
            } else {
                println!("OK");
            }
            ExitCode::SUCCESS
        }
        Status::NotFound => {
            println!("(not found)");
            ExitCode::from(1)
        }
        Status::Error => {
            eprintln!("server error: {}", payload);
            ExitCode::from(2)
        }
    })
}
