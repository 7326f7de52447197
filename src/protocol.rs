//! Line protocol: classifies client input and renders the broadcast lines.

/// Leading marker shared by nickname registration and the quit token
pub const CONTROL_MARKER: char = '/';
/// Token a client sends to leave the room
pub const QUIT_TOKEN: &str = "/q";

// Color styles, cosmetic decoration on the rendered lines
pub const MAGENTA: &str = "\x1B[35m";
pub const YELLOW: &str = "\x1B[33m";
pub const CYAN: &str = "\x1B[36m";
pub const RESET: &str = "\x1B[0m";

/// What a single input line asks the server to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Register the nickname of an unnamed session
    Register { name: String },
    /// Leave the room
    Quit,
    /// Relay the line to everyone else
    Chat { text: String },
}

/// Classify one input line (terminator already trimmed)
///
/// Nickname presence is checked before the quit token: a named client whose
/// nickname starts with `q` must still be able to quit, and an unnamed
/// client's `/quincy` registers `quincy` rather than quitting. The one
/// carve-out is an unnamed session sending exactly `/q`, which leaves the
/// room instead of registering the nickname `q`.
pub fn classify(line: &str, named: bool) -> ClientEvent {
    if !named {
        if line == QUIT_TOKEN {
            return ClientEvent::Quit;
        }
        if let Some(name) = line.strip_prefix(CONTROL_MARKER) {
            return ClientEvent::Register {
                name: name.to_string(),
            };
        }
        return ClientEvent::Chat {
            text: line.to_string(),
        };
    }

    if line.starts_with(QUIT_TOKEN) {
        return ClientEvent::Quit;
    }

    ClientEvent::Chat {
        text: line.to_string(),
    }
}

/// `"<name> join the room..."`, broadcast in place of the registration line
pub fn render_join(name: &str) -> String {
    format!("{MAGENTA}{name} join the room...{RESET}\n")
}

/// `"<name> leave the room..."`, broadcast to the remaining sessions
pub fn render_leave(name: &str) -> String {
    format!("{MAGENTA}{name} leave the room...{RESET}\n")
}

/// `"<name>: <text> [from <display_info>]"`, the relayed chat line
pub fn render_chat(name: &str, text: &str, display_info: &str) -> String {
    format!("{YELLOW}{name}: {text} {CYAN}[from {display_info}]{RESET}\n")
}
