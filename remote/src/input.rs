use std::io::{self, BufRead, Write};

use servocmd::{ParseError, format_command, parse};

/// Joins command-line words into one command, so `90, 45, , 180` typed
/// without quotes still reads as four fields.
pub fn join_words(words: &[String]) -> String {
    words
        .join(" ")
        .replace(" , ", ",")
        .replace(" ,", ",")
        .replace(", ", ",")
}

/// Validates a command line the way the controller will, and returns the
/// canonical text to send.
pub fn prepare(line: &str) -> Result<String, ParseError> {
    parse(line).map(|command| format_command(&command))
}

/// Reads commands until `quit`, `exit`, `q` or end of input.
pub fn interactive<R, W, F>(input: R, mut output: W, mut send: F) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    F: FnMut(&str) -> io::Result<()>,
{
    let mut lines = input.lines();
    loop {
        write!(output, "Enter servo command: ")?;
        output.flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => {
                writeln!(output)?;
                break;
            }
        };
        let line = line.trim();

        if ["quit", "exit", "q"].contains(&line.to_lowercase().as_str()) {
            writeln!(output, "Goodbye!")?;
            break;
        }
        if line.is_empty() {
            writeln!(output, "Please enter a command")?;
            continue;
        }

        match prepare(line) {
            Ok(command) => match send(&command) {
                Ok(()) => writeln!(output, "Sent command: '{}'", command)?,
                Err(e) => writeln!(output, "Error sending command: {}", e)?,
            },
            Err(e) => writeln!(output, "Invalid command: {}", e)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn words_are_joined_into_fields() {
        assert_eq!(join_words(&words(&["90,45,", ",180"])), "90,45,,180");
        assert_eq!(join_words(&words(&["90,", "45,", ",", "180"])), "90,45,,180");
        assert_eq!(join_words(&words(&["90,45, ,180"])), "90,45,,180");
    }

    #[test]
    fn prepare_normalizes_keep_fields() {
        assert_eq!(prepare("90,45,,180").unwrap(), "90,45, ,180");
        assert_eq!(prepare(" 1 , 2 , 3 , 4 ").unwrap(), "1,2,3,4");
    }

    #[test]
    fn prepare_uses_the_controller_rules() {
        assert!(matches!(prepare("200,0,0,0"), Err(ParseError::OutOfRange { field_index: 0, .. })));
        assert!(matches!(prepare("-,0,0,0"), Err(ParseError::NotANumber { field_index: 0, .. })));
        assert!(matches!(prepare("1,2,3"), Err(ParseError::WrongFieldCount { found: 3 })));
    }

    #[test]
    fn interactive_sends_only_valid_commands() {
        let input = "90,45, ,180\n\nabc,0,0,0\n0,0,0,0\nquit\n10,10,10,10\n";
        let mut output = Vec::new();
        let mut sent = Vec::new();

        interactive(input.as_bytes(), &mut output, |command| {
            sent.push(command.to_string());
            Ok(())
        })
        .unwrap();

        assert_eq!(sent, vec!["90,45, ,180", "0,0,0,0"]);
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Please enter a command"));
        assert!(output.contains("Invalid command: field 0 ('abc') is not a whole number"));
        assert!(output.ends_with("Goodbye!\n"));
    }

    #[test]
    fn interactive_stops_at_end_of_input() {
        let mut sent = 0;
        interactive("Q\n".as_bytes(), io::sink(), |_| {
            sent += 1;
            Ok(())
        })
        .unwrap();
        interactive("".as_bytes(), io::sink(), |_| {
            sent += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(sent, 0);
    }
}
