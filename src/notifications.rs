use std::time::{
    Duration,
    Instant,
};

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ToastId(u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ToastKind {
    Loading,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub kind: ToastKind,
    pub message: String,
    pub icon: Option<&'static str>,
    expires_at: Option<Instant>,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Transient notifications. A toast keeps its id across updates, so a later
/// event replaces the visible entry instead of stacking a new one.
#[derive(Debug, Default)]
pub struct Toasts {
    next_id: u64,
    items: Vec<Toast>,
}

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loading toasts stay until updated.
    pub fn loading(&mut self, message: impl Into<String>) -> ToastId {
        let id = self.allocate();
        self.items.push(Toast {
            id,
            kind: ToastKind::Loading,
            message: message.into(),
            icon: None,
            expires_at: None,
        });
        id
    }

    /// Replaces the toast with `id`, or shows it again if it already expired.
    pub fn update(
        &mut self,
        id: ToastId,
        kind: ToastKind,
        message: impl Into<String>,
        icon: Option<&'static str>,
        duration: Option<Duration>,
        now: Instant,
    ) {
        let toast = Toast {
            id,
            kind,
            message: message.into(),
            icon,
            expires_at: duration.map(|d| now + d),
        };
        match self.items.iter_mut().find(|existing| existing.id == id) {
            Some(existing) => *existing = toast,
            None => self.items.push(toast),
        }
    }

    /// Drops expired toasts; reports whether anything changed.
    pub fn expire(&mut self, now: Instant) -> bool {
        let before = self.items.len();
        self.items.retain(|toast| !toast.is_expired(now));
        before != self.items.len()
    }

    pub fn visible(&self) -> &[Toast] {
        &self.items
    }

    pub fn get(&self, id: ToastId) -> Option<&Toast> {
        self.items.iter().find(|toast| toast.id == id)
    }

    fn allocate(&mut self) -> ToastId {
        self.next_id += 1;
        ToastId(self.next_id)
    }
}
