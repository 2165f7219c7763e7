use std::io::{self, Write};

/// Prompts on stdout and reads one raw line from stdin.
pub fn input(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}

/// Reads an on/off argument the way people actually type it.
pub fn parse_switch(flag: &str) -> Option<bool> {
    match flag.trim().to_ascii_lowercase().as_str() {
        "on" | "y" | "yes" | "yeah" | "true" | "1" => Some(true),
        "off" | "n" | "no" | "nope" | "false" | "0" => Some(false),
        _ => None,
    }
}
