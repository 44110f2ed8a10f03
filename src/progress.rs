use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::sync::Mutex;

pub const MAX_LOG_LINES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Info,
    Search,
    Fetch,
    Error,
}

impl Kind {
    pub fn label(self) -> &'static str {
        match self {
            Kind::Info => "info",
            Kind::Search => "search",
            Kind::Fetch => "fetch",
            Kind::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub text: String,
    pub kind: Kind,
}

static ACTIVITY_LOG: Lazy<Mutex<VecDeque<Entry>>> =
    Lazy::new(|| Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES)));

pub fn log<T: Into<String>>(line: T) {
    log_with(Kind::Info, line);
}

/// Append to the in-window activity log and mirror the line to tracing.
pub fn log_with<T: Into<String>>(kind: Kind, line: T) {
    let text = line.into();
    match kind {
        Kind::Error => tracing::warn!(kind = kind.label(), "{}", text),
        _ => tracing::info!(kind = kind.label(), "{}", text),
    }

    if let Ok(mut buf) = ACTIVITY_LOG.lock() {
        if buf.len() >= MAX_LOG_LINES {
            buf.pop_front();
        }
        buf.push_back(Entry { text, kind });
    }
}

pub fn recent(n: usize) -> Vec<Entry> {
    if let Ok(buf) = ACTIVITY_LOG.lock() {
        let len = buf.len();
        let take = n.min(len);
        buf.iter().skip(len - take).cloned().collect()
    } else {
        Vec::new()
    }
}
