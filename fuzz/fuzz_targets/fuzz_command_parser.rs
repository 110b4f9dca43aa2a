#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

use tallybot::polls::{Command, CommandParser, Parsed};

static PARSER: OnceLock<CommandParser> = OnceLock::new();

fuzz_target!(|data: &str| {
    let parser = PARSER.get_or_init(|| CommandParser::new("/").unwrap());

    // Any chat text must parse without panicking. Accepted commands must
    // satisfy the shape the engine relies on.
    match parser.parse(data) {
        Ok(Parsed::Command(Command::Create { question, options })) => {
            assert!(!question.is_empty());
            assert!(!options.is_empty());
            assert!(options.iter().all(|o| !o.is_empty()));
        }
        Ok(Parsed::Command(Command::Vote { poll_id, choice })) => {
            assert!(!poll_id.is_empty());
            assert!(choice >= 1);
        }
        _ => {}
    }
});
