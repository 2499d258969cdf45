//! The application's single logical UI thread. Every fragment change and
//! every sign-in/sign-out passes through here, one at a time, and the auth
//! gate is re-evaluated after each of them.

use super::{
    auth::evaluate_gate,
    models::User,
    navigation::{Navigator, View},
};
use tokio::sync::watch;

/// What to send back for a fragment-change report.
#[derive(Debug, PartialEq, Eq)]
pub enum ViewOutcome {
    Show(View),
    /// The browser has to move to this fragment first.
    Redirect(String),
}

pub struct Shell {
    navigator: Navigator,
    /// (signed in, view) as of the last gate evaluation
    last_gate_input: Option<(bool, View)>,
}

impl Shell {
    pub fn new(initial_fragment: &str) -> Self {
        Self {
            navigator: Navigator::new(initial_fragment),
            last_gate_input: None,
        }
    }

    pub fn current_view(&self) -> View {
        self.navigator.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.navigator.subscribe()
    }

    /// The browser reported a new fragment.
    pub fn on_fragment_change(
        &mut self,
        fragment: &str,
        user: Option<&User>,
    ) -> View {
        self.navigator.on_fragment_change(fragment);
        self.enforce_gate(user);
        self.navigator.current()
    }

    /// Handle a fragment report from the browser and decide what it gets to
    /// see. The gate memo only stops duplicate fragment writes; a private
    /// view is never shown without a user, however often it is asked for.
    pub fn report_fragment(
        &mut self,
        fragment: &str,
        user: Option<&User>,
    ) -> ViewOutcome {
        let view = self.on_fragment_change(fragment, user);
        if let Some(next) = self.take_fragment_writes().pop() {
            return ViewOutcome::Redirect(next);
        }
        match evaluate_gate(user, view) {
            Some(target) => ViewOutcome::Redirect(target.fragment()),
            None => ViewOutcome::Show(view),
        }
    }

    /// Someone signed in or out.
    pub fn on_user_change(&mut self, user: Option<&User>) {
        self.enforce_gate(user);
    }

    pub fn navigate(&mut self, name: &str) {
        self.navigator.navigate(name);
    }

    pub fn take_fragment_writes(&mut self) -> Vec<String> {
        self.navigator.take_fragment_writes()
    }

    fn enforce_gate(&mut self, user: Option<&User>) {
        let view = self.navigator.current();
        let input = (user.is_some(), view);
        if self.last_gate_input == Some(input) {
            return;
        }
        self.last_gate_input = Some(input);
        if let Some(target) = evaluate_gate(user, view) {
            tracing::info!(
                from = %view,
                fragment = %self.navigator.fragment(),
                to = %target,
                "auth gate redirect",
            );
            self.navigator.navigate(target.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            name: "Jack".to_string(),
            email: "jack@jack.com".to_string(),
        }
    }

    /// Deliver every pending fragment write back as a hashchange, the way
    /// the browser does.
    fn settle(shell: &mut Shell, user: Option<&User>) {
        loop {
            let writes = shell.take_fragment_writes();
            if writes.is_empty() {
                break;
            }
            for fragment in writes {
                shell.on_fragment_change(&fragment, user);
            }
        }
    }

    #[test]
    fn test_unauthenticated_settings_redirects_then_allows() {
        let mut shell = Shell::new("");

        shell.on_fragment_change("#/settings", None);
        assert_eq!(shell.take_fragment_writes(), vec!["#/auth".to_string()]);
        shell.on_fragment_change("#/auth", None);
        assert_eq!(shell.current_view(), View::Auth);

        let user = user();
        shell.on_user_change(Some(&user));
        shell.navigate("settings");
        settle(&mut shell, Some(&user));
        assert_eq!(shell.current_view(), View::Settings);
        assert!(shell.take_fragment_writes().is_empty());
    }

    #[test]
    fn test_gate_is_idempotent() {
        let mut shell = Shell::new("");
        shell.on_fragment_change("#/clients", None);
        shell.on_user_change(None);
        shell.on_user_change(None);

        // one redirect, not three
        assert_eq!(shell.take_fragment_writes(), vec!["#/auth".to_string()]);
    }

    #[test]
    fn test_repeated_private_fragment_stays_blocked() {
        let mut shell = Shell::new("");
        for _ in 0..3 {
            assert_eq!(
                shell.report_fragment("#/settings", None),
                ViewOutcome::Redirect("#/auth".to_string())
            );
        }
        assert_eq!(
            shell.report_fragment("#/auth", None),
            ViewOutcome::Show(View::Auth)
        );

        let user = user();
        shell.on_user_change(Some(&user));
        assert_eq!(
            shell.report_fragment("#/settings", Some(&user)),
            ViewOutcome::Show(View::Settings)
        );
    }

    #[test]
    fn test_sign_out_on_private_view_redirects() {
        let user = user();
        let mut shell = Shell::new("");
        shell.on_fragment_change("#/dashboard", Some(&user));
        assert!(shell.take_fragment_writes().is_empty());

        shell.on_user_change(None);
        settle(&mut shell, None);
        assert_eq!(shell.current_view(), View::Auth);
    }

    #[test]
    fn test_signed_in_user_may_stay_on_auth() {
        let user = user();
        let mut shell = Shell::new("");
        shell.on_fragment_change("#/auth", Some(&user));
        assert!(shell.take_fragment_writes().is_empty());
        assert_eq!(shell.current_view(), View::Auth);
    }

    #[test]
    fn test_bogus_navigation_lands_on_landing() {
        let mut shell = Shell::new("#/auth");
        shell.navigate("bogus-view");
        assert_eq!(shell.take_fragment_writes(), vec!["#/landing".to_string()]);
        shell.on_fragment_change("#/landing", None);
        assert_eq!(shell.current_view(), View::Landing);
    }
}
