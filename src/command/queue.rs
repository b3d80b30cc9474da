//! Pending command queue and the tokenizers that feed it
//!
//! Commands arrive from three places: the process arguments, the interactive
//! prompt and batch files. All of them end up as `CommandEntry` values in a
//! single ordered queue that meta-commands can splice follow-ups into.

use super::catalog::CommandCatalog;
use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use tracing::warn;

/// Marks the rest of a batch file line as a comment
const COMMENT_MARKER: char = ';';

/// Queue position right after the command currently being processed
pub const NEXT_POSITION: usize = 1;

/// One command name with its raw parameter string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    name: String,
    params: String,
}

impl CommandEntry {
    /// Create an entry; the name is case-folded, params are kept verbatim
    pub fn new(name: impl AsRef<str>, params: impl Into<String>) -> Self {
        Self {
            name: name.as_ref().to_lowercase(),
            params: params.into(),
        }
    }

    /// Split a line at the first whitespace into name and parameters
    pub fn from_line(line: &str) -> Self {
        let line = line.trim();
        match line.split_once(char::is_whitespace) {
            Some((name, rest)) => Self::new(name, rest.trim()),
            None => Self::new(line, ""),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &str {
        &self.params
    }
}

impl fmt::Display for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.name, self.params)
        }
    }
}

/// Ordered queue of pending commands
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    entries: VecDeque<CommandEntry>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize process arguments against the catalog
    ///
    /// A catalog name opens a new entry; any other token is appended to the
    /// parameters of the entry that is currently open.
    pub fn from_argv<I, S>(args: I, catalog: &CommandCatalog) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut queue = Self::new();
        let mut open: Option<(String, Vec<String>)> = None;

        for token in args {
            let token = token.as_ref();
            if catalog.is_valid(token) {
                if let Some((name, params)) = open.take() {
                    queue.push_back(CommandEntry::new(name, params.join(" ")));
                }
                open = Some((token.to_string(), Vec::new()));
            } else if let Some((_, params)) = open.as_mut() {
                params.push(token.to_string());
            } else {
                warn!("Argument '{}' ignored, no command before it", token);
            }
        }

        if let Some((name, params)) = open {
            queue.push_back(CommandEntry::new(name, params.join(" ")));
        }

        queue
    }

    pub fn push_back(&mut self, entry: CommandEntry) {
        self.entries.push_back(entry);
    }

    pub fn pop_front(&mut self) -> Option<CommandEntry> {
        self.entries.pop_front()
    }

    /// Insert at `index`, or at the end if the queue is shorter than that
    pub fn insert_at(&mut self, index: usize, entry: CommandEntry) {
        let index = index.min(self.entries.len());
        self.entries.insert(index, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.iter()
    }
}

/// Parse batch file text into entries
///
/// Text from the first `;` is dropped, lines shorter than `min_len` after
/// trimming are skipped, everything else is lowercased.
pub fn parse_batch(text: &str, min_len: usize) -> Vec<CommandEntry> {
    text.lines()
        .map(|line| line.split(COMMENT_MARKER).next().unwrap_or("").trim())
        .filter(|line| line.len() >= min_len)
        .map(|line| CommandEntry::from_line(&line.to_lowercase()))
        .collect()
}

/// Read and parse a batch file
pub async fn load_batch_file(path: &Path, min_len: usize) -> std::io::Result<Vec<CommandEntry>> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(parse_batch(&text, min_len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn names(queue: &CommandQueue) -> Vec<String> {
        queue.iter().map(|entry| entry.to_string()).collect()
    }

    #[test]
    fn test_from_argv_joins_params() {
        let catalog = CommandCatalog::from_device_names(["#setx", "#gety"]);
        let queue = CommandQueue::from_argv(["#SetX", "foo", "bar", "#GetY"], &catalog);

        let entries: Vec<_> = queue.iter().cloned().collect();
        assert_eq!(
            entries,
            vec![CommandEntry::new("#setx", "foo bar"), CommandEntry::new("#gety", "")]
        );
    }

    #[test]
    fn test_from_argv_keeps_param_case_and_drops_leading_tokens() {
        let catalog = CommandCatalog::from_device_names(["#setinstrumentname"]);
        let queue = CommandQueue::from_argv(
            ["stray", "#SetInstrumentName", "Line", "7", "North"],
            &catalog,
        );
        assert_eq!(names(&queue), vec!["#setinstrumentname Line 7 North"]);
    }

    #[test]
    fn test_from_line() {
        let entry = CommandEntry::from_line("  #setpeakoffsets 1 2   3 4 ");
        assert_eq!(entry.name(), "#setpeakoffsets");
        assert_eq!(entry.params(), "1 2   3 4");

        let entry = CommandEntry::from_line("#GetDutChannelCount");
        assert_eq!(entry.name(), "#getdutchannelcount");
        assert_eq!(entry.params(), "");
    }

    #[test]
    fn test_insert_at_front_and_clamped() {
        let mut queue = CommandQueue::new();
        queue.insert_at(1, CommandEntry::from_line("a"));
        queue.push_back(CommandEntry::from_line("b"));
        queue.insert_at(0, CommandEntry::from_line("z"));
        queue.insert_at(99, CommandEntry::from_line("c"));
        assert_eq!(names(&queue), vec!["z", "a", "b", "c"]);
    }

    #[test]
    fn test_parse_batch_strips_comments_and_short_lines() {
        let text = "#GetTemp ; read temp\n; only a comment\n#ab\n\n#GetSerialNumber\n";
        let entries = parse_batch(text, 5);
        let lines: Vec<_> = entries.iter().map(|e| e.to_string()).collect();
        assert_eq!(lines, vec!["#gettemp", "#getserialnumber"]);
    }

    #[test]
    fn test_next_position_insert_order() {
        let batch = vec![
            CommandEntry::from_line("#one"),
            CommandEntry::from_line("#two"),
            CommandEntry::from_line("#three"),
        ];

        let splice = |queue: &mut CommandQueue, batch: &[CommandEntry]| {
            for entry in batch {
                queue.insert_at(NEXT_POSITION, entry.clone());
            }
        };

        // Later lines land in front of earlier ones once the queue is non-empty
        let mut queue = CommandQueue::new();
        splice(&mut queue, &batch);
        assert_eq!(names(&queue), vec!["#one", "#three", "#two"]);

        let mut queue = CommandQueue::new();
        queue.push_back(CommandEntry::from_line("#pending"));
        splice(&mut queue, &batch);
        assert_eq!(names(&queue), vec!["#pending", "#three", "#two", "#one"]);
    }

    #[tokio::test]
    async fn test_load_batch_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "#SetNtpEnabled 1 ; enable").expect("write");
        writeln!(file, "#SetNtpServer 10.0.0.1").expect("write");

        let entries = load_batch_file(file.path(), 5).await.expect("load failed");
        assert_eq!(entries[0], CommandEntry::new("#setntpenabled", "1"));
        assert_eq!(entries[1], CommandEntry::new("#setntpserver", "10.0.0.1"));
    }

    #[tokio::test]
    async fn test_load_missing_batch_file() {
        let result = load_batch_file(Path::new("/nonexistent/batch.txt"), 5).await;
        assert!(result.is_err());
    }
}
