//! Typed stdin commands

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Buzz,
    Next,
    /// Toggle pause
    Pause,
    /// Start answering the current bonus part
    Bonus,
    Answer(String),
    Chat(String),
    Quit,
    /// Blank line or a command missing its argument
    Nothing,
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Nothing;
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    match head {
        "/buzz" => Command::Buzz,
        "/next" => Command::Next,
        "/pause" => Command::Pause,
        "/bonus" => Command::Bonus,
        "/quit" | "/exit" => Command::Quit,
        "/answer" if rest.is_empty() => Command::Nothing,
        "/answer" => Command::Answer(rest.to_string()),
        _ => Command::Chat(line.to_string()),
    }
}
