//! Stack of composite items under construction across nested elements.

use rssync_core::RoleSpec;

/// A document (report) whose nested references are still being read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDocument {
    /// Folder the document was created in.
    pub folder: String,
    pub name: String,
    /// Path the catalog reported for the created item; `None` if creation failed.
    pub item_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingItem {
    Role(RoleSpec),
    Document(PendingDocument),
}

impl PendingItem {
    pub fn kind(&self) -> &'static str {
        match self {
            PendingItem::Role(_) => "role",
            PendingItem::Document(_) => "document",
        }
    }
}

/// LIFO stack of [`PendingItem`]s; entries live exactly between their
/// element's open and close events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingStack {
    items: Vec<PendingItem>,
}

impl PendingStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: PendingItem) {
        self.items.push(item);
    }

    pub fn pop(&mut self) -> Option<PendingItem> {
        self.items.pop()
    }

    pub fn top(&self) -> Option<&PendingItem> {
        self.items.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut PendingItem> {
        self.items.last_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(name: &str) -> PendingItem {
        PendingItem::Role(RoleSpec {
            name: name.into(),
            description: String::new(),
            task_ids: vec![],
        })
    }

    #[test]
    fn pops_in_reverse_push_order() {
        let mut stack = PendingStack::new();
        stack.push(role("outer"));
        stack.push(PendingItem::Document(PendingDocument {
            folder: "/".into(),
            name: "inner".into(),
            item_path: Some("/inner".into()),
        }));

        assert_eq!(stack.pop().map(|i| i.kind()), Some("document"));
        assert_eq!(stack.pop(), Some(role("outer")));
        assert!(stack.pop().is_none());
    }

    #[test]
    fn top_mut_edits_in_place() {
        let mut stack = PendingStack::new();
        stack.push(role("Browser"));
        if let Some(PendingItem::Role(r)) = stack.top_mut() {
            r.task_ids.push("view-reports".into());
        }
        match stack.top() {
            Some(PendingItem::Role(r)) => assert_eq!(r.task_ids.len(), 1),
            other => panic!("expected role, got {other:?}"),
        }
    }
}
