//! Slash-command recognition.

/// A recognized bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start` or `/restart`
    Start,
    /// `/help`
    Help,
    /// `/cancel` or `/exit`
    Cancel,
    /// `/ask <question>`; the question may be empty.
    Ask(String),
}

/// Parse `text` as a command.
///
/// The command word is case-insensitive and may carry an `@botname` suffix.
/// Unknown commands return `None` and are handled as ordinary text.
pub fn parse(text: &str) -> Option<Command> {
    let text = text.trim();
    let rest = text.strip_prefix('/')?;

    let (word, args) = match rest.split_once(char::is_whitespace) {
        Some((word, args)) => (word, args.trim()),
        None => (rest, ""),
    };
    let word = word.split_once('@').map_or(word, |(name, _bot)| name);

    match word.to_ascii_lowercase().as_str() {
        "start" | "restart" => Some(Command::Start),
        "help" => Some(Command::Help),
        "cancel" | "exit" => Some(Command::Cancel),
        "ask" => Some(Command::Ask(args.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_commands() {
        assert_eq!(parse("/start"), Some(Command::Start));
        assert_eq!(parse("/restart"), Some(Command::Start));
        assert_eq!(parse("/help"), Some(Command::Help));
        assert_eq!(parse("/cancel"), Some(Command::Cancel));
        assert_eq!(parse("/exit"), Some(Command::Cancel));
    }

    #[test]
    fn suffix_case_and_whitespace() {
        assert_eq!(parse("  /Cancel@LinkCatalogBot  "), Some(Command::Cancel));
        assert_eq!(parse("/START"), Some(Command::Start));
    }

    #[test]
    fn ask_takes_the_rest() {
        assert_eq!(
            parse("/ask   what is RAG?  "),
            Some(Command::Ask("what is RAG?".into()))
        );
        assert_eq!(
            parse("/ask@bot multi\nline"),
            Some(Command::Ask("multi\nline".into()))
        );
        assert_eq!(parse("/ask"), Some(Command::Ask(String::new())));
    }

    #[test]
    fn not_commands() {
        assert_eq!(parse("hello"), None);
        assert_eq!(parse("/unknown"), None);
        assert_eq!(parse("https://example.com/start"), None);
        assert_eq!(parse("🛠️ Tools"), None);
    }
}
