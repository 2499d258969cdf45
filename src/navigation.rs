//! Client-side routing by URL fragment (`#/<view>`).
//!
//! The navigator never changes its own state when asked to navigate. It
//! writes the fragment, the browser applies it, and the resulting
//! fragment-change notification is what moves the active view. Writes are
//! queued until the HTTP layer ships them to the browser.

use regex::Regex;
use std::{collections::VecDeque, fmt, sync::OnceLock};
use tokio::sync::watch;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum View {
    Landing,
    Auth,
    Dashboard,
    Appointments,
    Clients,
    Invoices,
    Mileage,
    Settings,
}

impl View {
    pub const ALL: [View; 8] = [
        Self::Landing,
        Self::Auth,
        Self::Dashboard,
        Self::Appointments,
        Self::Clients,
        Self::Invoices,
        Self::Mileage,
        Self::Settings,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Landing => "landing",
            Self::Auth => "auth",
            Self::Dashboard => "dashboard",
            Self::Appointments => "appointments",
            Self::Clients => "clients",
            Self::Invoices => "invoices",
            Self::Mileage => "mileage",
            Self::Settings => "settings",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.name() == name)
    }

    pub fn fragment(&self) -> String {
        format!("#/{}", self.name())
    }

    /// Views anyone may see without signing in.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Landing | Self::Auth)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn fragment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^#?/([^/?#]*)").expect("fragment pattern compiles")
    })
}

/// Anything that is not `#/<known view>` (optionally followed by more path
/// or a query) resolves to the landing view.
pub fn decode_fragment(fragment: &str) -> View {
    fragment_re()
        .captures(fragment.trim())
        .and_then(|c| View::from_name(&c[1]))
        .unwrap_or(View::Landing)
}

pub struct Navigator {
    fragment: String,
    pending_writes: VecDeque<String>,
    view: watch::Sender<View>,
}

impl Navigator {
    pub fn new(initial_fragment: &str) -> Self {
        let (view, _) = watch::channel(decode_fragment(initial_fragment));
        Self {
            fragment: initial_fragment.to_string(),
            pending_writes: VecDeque::new(),
            view,
        }
    }

    pub fn current(&self) -> View {
        *self.view.borrow()
    }

    /// The fragment as last reported by the browser.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// The receiver starts out holding the view at subscription time.
    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.view.subscribe()
    }

    /// Request a fragment write. Unknown names go to the landing view. The
    /// active view does not change until the write comes back as a
    /// fragment-change notification.
    pub fn navigate(&mut self, name: &str) {
        let target = View::from_name(name).unwrap_or(View::Landing);
        self.pending_writes.push_back(target.fragment());
    }

    /// Handle a fragment-change notification. Subscribers only hear about
    /// it when the decoded view actually changed.
    pub fn on_fragment_change(&mut self, fragment: &str) -> View {
        self.fragment = fragment.to_string();
        let next = decode_fragment(fragment);
        self.view.send_if_modified(|view| {
            if *view == next {
                false
            } else {
                *view = next;
                true
            }
        });
        next
    }

    /// Fragment writes the browser still has to apply, oldest first.
    pub fn take_fragment_writes(&mut self) -> Vec<String> {
        self.pending_writes.drain(..).collect()
    }
}
