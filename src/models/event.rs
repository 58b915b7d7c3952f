/// Before/after snapshot pair delivered with a document-change event.
/// Delivery is at-least-once and unordered across unrelated documents.
#[derive(Clone, Debug)]
pub struct DocChange<T> {
    pub before: Option<T>,
    pub after: Option<T>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl<T> DocChange<T> {
    pub fn created(after: T) -> Self {
        DocChange { before: None, after: Some(after) }
    }

    pub fn updated(before: T, after: T) -> Self {
        DocChange { before: Some(before), after: Some(after) }
    }

    pub fn deleted(before: T) -> Self {
        DocChange { before: Some(before), after: None }
    }

    pub fn kind(&self) -> Option<ChangeKind> {
        match (&self.before, &self.after) {
            (None, Some(_)) => Some(ChangeKind::Created),
            (Some(_), Some(_)) => Some(ChangeKind::Updated),
            (Some(_), None) => Some(ChangeKind::Deleted),
            (None, None) => None,
        }
    }

    /// Snapshot to show in notifications: the post-image where one exists.
    pub fn latest(&self) -> Option<&T> {
        self.after.as_ref().or(self.before.as_ref())
    }
}
