//! Terminal chat client.
//!
//! Connects to a chat relay server, registers a nickname, relays stdin
//! lines to the room and prints everything the room broadcasts. The whole
//! session is appended to a transcript file.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream};
use std::path::PathBuf;
use std::process;
use std::sync::{Arc, Mutex};
use std::thread;

use chat_relay::protocol::QUIT_TOKEN;
use clap::Parser;
use log::{error, info};
use signal_hook::consts::SIGINT;
use signal_hook::iterator::Signals;

/// Terminal chat room client
#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "Chat room client with transcript logging")]
#[command(version)]
struct Args {
    /// Server host or IP address
    host: String,

    /// Server TCP port
    port: u16,

    /// Transcript file, appended to
    #[arg(default_value = "log.txt")]
    file: PathBuf,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut stream = match TcpStream::connect((args.host.as_str(), args.port)) {
        Ok(stream) => stream,
        Err(err) => {
            eprintln!("client: can't connect to server: {err}");
            process::exit(1);
        }
    };

    let transcript = match OpenOptions::new().create(true).append(true).open(&args.file) {
        Ok(file) => Arc::new(Mutex::new(file)),
        Err(err) => {
            eprintln!(
                "client: can't open transcript {}: {err}",
                args.file.display()
            );
            process::exit(1);
        }
    };

    println!("- Chat room client running, press /q to leave the room");

    // Ctrl+C leaves the room the same way an explicit /q does.
    spawn_signal_handler(&stream);
    spawn_reader(&stream, Arc::clone(&transcript));

    let nickname = prompt_nickname(&transcript);
    send_line(&mut stream, &format!("/{nickname}"));

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                error!("failed to read input: {err}");
                break;
            }
        };

        append_transcript(&transcript, &line);

        if line.starts_with(QUIT_TOKEN) {
            send_line(&mut stream, QUIT_TOKEN);
            let _ = stream.shutdown(Shutdown::Both);
            break;
        }

        send_line(&mut stream, &line);
    }
}

/// A failed write to the server ends the client
fn send_line(stream: &mut TcpStream, line: &str) {
    if let Err(err) = stream.write_all(format!("{line}\n").as_bytes()) {
        eprintln!("client: write socket error: {err}");
        process::exit(1);
    }
}

fn prompt_nickname(transcript: &Arc<Mutex<File>>) -> String {
    print!("Please input your nickname:");
    let _ = io::stdout().flush();

    let mut name = String::new();
    if io::stdin().read_line(&mut name).is_err() || name.trim().is_empty() {
        eprintln!("client: no nickname given");
        process::exit(1);
    }

    let name = name.trim().to_string();
    append_transcript(transcript, &name);
    name
}

/// Prints everything the server sends and appends it to the transcript;
/// a zero-length read means the server is gone and the client exits
fn spawn_reader(stream: &TcpStream, transcript: Arc<Mutex<File>>) {
    let stream = match stream.try_clone() {
        Ok(stream) => stream,
        Err(err) => {
            eprintln!("client: can't clone stream: {err}");
            process::exit(1);
        }
    };

    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => {
                    info!("Server disconnected");
                    process::exit(0);
                }
                Ok(_) => {
                    print!("{line}");
                    let _ = io::stdout().flush();
                    append_transcript(&transcript, &line);
                }
                Err(err) => {
                    error!("Error reading from server: {err}");
                    process::exit(1);
                }
            }
        }
    });
}

fn spawn_signal_handler(stream: &TcpStream) {
    match (Signals::new([SIGINT]), stream.try_clone()) {
        (Ok(mut signals), Ok(mut stream)) => {
            thread::spawn(move || {
                if signals.forever().next().is_some() {
                    let _ = stream.write_all(b"/q\n");
                    let _ = stream.shutdown(Shutdown::Both);
                    process::exit(0);
                }
            });
        }
        _ => error!("could not arm the Ctrl+C handler"),
    }
}

fn append_transcript(transcript: &Arc<Mutex<File>>, line: &str) {
    if let Ok(mut file) = transcript.lock() {
        let _ = writeln!(file, "{}", line.trim_end_matches(['\r', '\n']));
    }
}
