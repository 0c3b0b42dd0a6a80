use lazy_static::lazy_static;
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// `Name: words` where `Name` is a configured speaker.
    Speaker { name: String, text: String },
    Text(String),
    Blank,
}

lazy_static! {
    static ref SPEAKER_REGEX: Regex = Regex::new(
        r"(?x)
        ^\s*
        ([^:]+?)     # Speaker name
        \s*:\s*
        (.*?)        # Spoken text
        \s*$
        "
    )
    .unwrap();
}

/// Split dialogue text into lines, recognising only the given speaker names as
/// prefixes. Anything else, including `Word: text` for unknown words, is text.
pub fn parse(input: &str, speakers: &[&str]) -> Vec<Line> {
    input.lines().map(|line| parse_line(line, speakers)).collect()
}

fn parse_line(line: &str, speakers: &[&str]) -> Line {
    if line.trim().is_empty() {
        return Line::Blank;
    }

    if let Some(cap) = SPEAKER_REGEX.captures(line) {
        let name = &cap[1];
        if speakers.contains(&name) {
            return Line::Speaker {
                name: name.to_string(),
                text: cap[2].to_string(),
            };
        }
    }

    Line::Text(line.trim().to_string())
}
