//! Running log of everything the pipeline executed.

/// Accumulates `$ command` + output entries; blocks attach its tail.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    entries: Vec<String>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_command(&mut self, command: &str, output: &str) {
        self.entries.push(format!("$ {}\n{}", command, output));
    }

    pub fn record_note(&mut self, note: impl Into<String>) {
        self.entries.push(note.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries joined by a blank line, keeping only the last `max_chars` characters.
    pub fn tail(&self, max_chars: usize) -> String {
        let joined = self.entries.join("\n\n");
        tail_chars(&joined, max_chars).to_string()
    }
}

/// Last `max_chars` characters of `text`, never splitting a code point.
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let skip = count - max_chars;
    let start = text
        .char_indices()
        .nth(skip)
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    &text[start..]
}
