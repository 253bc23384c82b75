// src/watch/events.rs

/// One line of watch-helper output (`--format %e`), e.g. `MODIFY`,
/// `CREATE,ISDIR` or `UNMOUNT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The watched filesystem went away; stop watching this source.
    Unmount,
    /// Anything else: the source changed.
    Change(String),
    /// Empty line, ignored.
    Blank,
}

pub fn parse_event_line(line: &str) -> WatchEvent {
    let line = line.trim();
    if line.is_empty() {
        return WatchEvent::Blank;
    }

    let unmounted = line
        .split(',')
        .any(|name| name.trim().eq_ignore_ascii_case("unmount"));
    if unmounted {
        WatchEvent::Unmount
    } else {
        WatchEvent::Change(line.to_string())
    }
}
