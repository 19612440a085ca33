//! Stack of absolute folder paths tracking the current position in the catalog.

pub use rssync_core::join_path;
use rssync_core::DEFAULT_ROOT;

/// Ordered folder paths; the bottom entry is the run root and is never popped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStack {
    paths: Vec<String>,
}

impl PathStack {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            paths: vec![root.into()],
        }
    }

    /// Enter folder `segment` under the current top. Returns the new top.
    pub fn push(&mut self, segment: &str) -> &str {
        let next = join_path(self.top(), segment);
        self.paths.push(next);
        self.top()
    }

    /// Leave the current folder. Returns `None` instead of removing the root.
    pub fn pop(&mut self) -> Option<String> {
        if self.paths.len() <= 1 {
            return None;
        }
        self.paths.pop()
    }

    /// The folder new items are created in.
    pub fn top(&self) -> &str {
        self.paths.last().map(String::as_str).unwrap_or(DEFAULT_ROOT)
    }

    pub fn root(&self) -> &str {
        self.paths.first().map(String::as_str).unwrap_or(DEFAULT_ROOT)
    }

    /// Number of entries, including the root.
    pub fn depth(&self) -> usize {
        self.paths.len()
    }
}

impl Default for PathStack {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_from_root_does_not_double_separator() {
        let mut stack = PathStack::default();
        assert_eq!(stack.push("a"), "/a");
        assert_eq!(stack.push("b"), "/a/b");
        assert_eq!(stack.depth(), 3);

        assert_eq!(stack.pop().as_deref(), Some("/a/b"));
        assert_eq!(stack.pop().as_deref(), Some("/a"));
        assert_eq!(stack.top(), "/");
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn push_under_custom_root_inserts_separator() {
        let mut stack = PathStack::new("/Finance");
        assert_eq!(stack.push("Sales"), "/Finance/Sales");
        assert_eq!(stack.root(), "/Finance");
    }

    #[test]
    fn root_is_never_popped() {
        let mut stack = PathStack::new("/Finance");
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.top(), "/Finance");
        assert_eq!(stack.depth(), 1);
    }
}
