use crate::auth::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum View {
    Auth,
    Menu,
    AimGame,
    ReactionGame,
    Statistics,
}

/// Applies the sign-in gate: every view but `Auth` needs a user, and a
/// signed-in user has no business on the sign-in form.
pub fn resolve(requested: View, user: Option<&User>) -> View {
    match (requested, user) {
        (View::Auth, Some(_)) => View::Menu,
        (View::Auth, None) => View::Auth,
        (_, None) => View::Auth,
        (view, Some(_)) => view,
    }
}

/// Entries on the main menu, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    AimGame,
    ReactionGame,
    Statistics,
    Sensitivity,
    Dpi,
    Logout,
}

impl MenuEntry {
    pub const ALL: [MenuEntry; 6] = [
        MenuEntry::AimGame,
        MenuEntry::ReactionGame,
        MenuEntry::Statistics,
        MenuEntry::Sensitivity,
        MenuEntry::Dpi,
        MenuEntry::Logout,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuEntry::AimGame => "Circle Target",
            MenuEntry::ReactionGame => "Reaction Time",
            MenuEntry::Statistics => "My Statistics",
            MenuEntry::Sensitivity => "Sensitivity",
            MenuEntry::Dpi => "Mouse DPI",
            MenuEntry::Logout => "Log out",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MenuEntry::AimGame => "Hit randomly appearing circles for 60 seconds",
            MenuEntry::ReactionGame => "Measure how fast you react",
            MenuEntry::Statistics => "Charts and scores of past sessions",
            MenuEntry::Sensitivity => "In-game sensitivity to match",
            MenuEntry::Dpi => "Mouse counts per inch",
            MenuEntry::Logout => "Sign out of this device",
        }
    }

    pub fn view(&self) -> Option<View> {
        match self {
            MenuEntry::AimGame => Some(View::AimGame),
            MenuEntry::ReactionGame => Some(View::ReactionGame),
            MenuEntry::Statistics => Some(View::Statistics),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "u1".into(),
            display_name: None,
            email: "u1@example.com".into(),
        }
    }

    #[test]
    fn anonymous_users_are_sent_to_auth() {
        for view in [
            View::Menu,
            View::AimGame,
            View::ReactionGame,
            View::Statistics,
            View::Auth,
        ] {
            assert_eq!(resolve(view, None), View::Auth);
        }
    }

    #[test]
    fn signed_in_users_reach_their_view() {
        let u = user();
        assert_eq!(resolve(View::Statistics, Some(&u)), View::Statistics);
        assert_eq!(resolve(View::AimGame, Some(&u)), View::AimGame);
        assert_eq!(resolve(View::Auth, Some(&u)), View::Menu);
    }

    #[test]
    fn only_game_entries_navigate() {
        let views: Vec<_> = MenuEntry::ALL.iter().filter_map(|e| e.view()).collect();
        assert_eq!(
            views,
            vec![View::AimGame, View::ReactionGame, View::Statistics]
        );
    }
}
