//! Prompt commands

use crate::{Result, SpeakpadError};

/// A command typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the snippet list
    List,
    /// Append a snippet and select it
    Add(String),
    /// Delete the selected snippet
    Delete,
    /// Select snippet (0-based row)
    Select(usize),
    /// Replace the edit field
    Edit(String),
    /// Store the edit field into the list
    Save,
    /// Speak the edit field
    Speak,
    /// Put text in the edit field and speak it
    Say(String),
    /// Show installed voices
    Voices,
    /// Pick a voice (0-based), or the default voice with `None`
    Voice(Option<usize>),
    /// Show output devices
    Devices,
    /// Switch output device (0-based)
    Device(usize),
    Help,
    Quit,
}

/// Help text for the prompt
pub const HELP: &str = "\
Commands:
  list              show saved snippets
  add <text>        add a snippet and select it
  del               delete the selected snippet
  sel <n>           select snippet n
  edit <text>       replace the text to speak
  save              store the text into the selected snippet (or append it)
  speak             speak the current text
  say <text>        set the text and speak it
  voices            list installed voices
  voice <n|default> choose a voice
  devices           list audio output devices
  device <n>        choose an audio output device
  help              show this help
  quit              exit";

/// Parse a 1-based list number as typed by the user
fn parse_index(arg: &str, what: &str) -> Result<usize> {
    match arg.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(SpeakpadError::Other(format!(
            "Expected a {} number, got '{}'",
            what, arg
        ))),
    }
}

/// Parse one line of input
///
/// Returns `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();
    if trimmed.trim().is_empty() {
        return Ok(None);
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (trimmed, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "list" | "ls" => Command::List,
        "add" => Command::Add(rest.to_string()),
        "del" | "delete" => Command::Delete,
        "sel" | "select" => Command::Select(parse_index(rest, "snippet")?),
        "edit" => Command::Edit(rest.to_string()),
        "save" => Command::Save,
        "speak" => Command::Speak,
        "say" => Command::Say(rest.to_string()),
        "voices" => Command::Voices,
        "voice" if rest.trim().eq_ignore_ascii_case("default") => Command::Voice(None),
        "voice" => Command::Voice(Some(parse_index(rest, "voice")?)),
        "devices" => Command::Devices,
        "device" => Command::Device(parse_index(rest, "device")?),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => {
            return Err(SpeakpadError::Other(format!(
                "Unknown command '{}' (type 'help')",
                other
            )))
        }
    };

    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line() {
        assert_eq!(parse_command("").unwrap(), None);
        assert_eq!(parse_command("   \n").unwrap(), None);
    }

    #[test]
    fn test_text_arguments_keep_inner_spacing() {
        assert_eq!(
            parse_command("add Hello,  world \n").unwrap(),
            Some(Command::Add("Hello,  world ".to_string()))
        );
        assert_eq!(
            parse_command("say   hi").unwrap(),
            Some(Command::Say("hi".to_string()))
        );
        assert_eq!(
            parse_command("edit").unwrap(),
            Some(Command::Edit(String::new()))
        );
    }

    #[test]
    fn test_indices_are_one_based() {
        assert_eq!(parse_command("sel 1").unwrap(), Some(Command::Select(0)));
        assert_eq!(parse_command("device 3").unwrap(), Some(Command::Device(2)));
        assert!(parse_command("sel 0").is_err());
        assert!(parse_command("voice x").is_err());
    }

    #[test]
    fn test_default_voice() {
        assert_eq!(parse_command("voice default").unwrap(), Some(Command::Voice(None)));
        assert_eq!(parse_command("voice 2").unwrap(), Some(Command::Voice(Some(1))));
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(
            parse_command("dance"),
            Err(SpeakpadError::Other(_))
        ));
    }
}
