/// Navigation bar model
///
/// Lists the public pages plus a login button, marks the link of the current
/// page, and tracks the collapsible menu used on small screens.

use super::routes::Route;
use serde::Serialize;

/// Public links, in display order
const LINKS: [(&str, Route); 3] = [
    ("Home", Route::Home),
    ("Notícias", Route::News),
    ("Inscreva-se", Route::Register),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub route: Route,
    pub active: bool,
}

/// Rendered state of the navigation bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavModel {
    pub links: Vec<NavLink>,
    pub login: NavLink,
    pub menu_open: bool,
}

#[derive(Debug, Clone)]
pub struct NavBar {
    /// Page being shown, if the path names one
    current: Option<Route>,
    menu_open: bool,
}

impl NavBar {
    /// Navigation bar for the page at `path`, menu closed
    pub fn new(path: impl AsRef<str>) -> Self {
        Self {
            current: Route::from_path(path.as_ref()),
            menu_open: false,
        }
    }

    fn link(&self, label: &'static str, route: Route) -> NavLink {
        NavLink {
            label,
            route,
            active: self.current == Some(route),
        }
    }

    pub fn links(&self) -> Vec<NavLink> {
        LINKS
            .iter()
            .map(|&(label, route)| self.link(label, route))
            .collect()
    }

    pub fn login_button(&self) -> NavLink {
        self.link("Login", Route::Login)
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    /// Follows a link; the menu closes
    pub fn navigate(&mut self, route: Route) {
        self.current = Some(route);
        self.menu_open = false;
    }

    pub fn model(&self) -> NavModel {
        NavModel {
            links: self.links(),
            login: self.login_button(),
            menu_open: self.menu_open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_link_matches_current_path() {
        let nav = NavBar::new("/noticias");
        let active: Vec<&str> = nav
            .links()
            .into_iter()
            .filter(|l| l.active)
            .map(|l| l.label)
            .collect();

        assert_eq!(active, vec!["Notícias"]);
        assert!(!nav.login_button().active);
    }

    #[test]
    fn test_trailing_slash_still_marks_link() {
        let nav = NavBar::new("/noticias/");
        let active: Vec<Route> = nav
            .links()
            .into_iter()
            .filter(|l| l.active)
            .map(|l| l.route)
            .collect();

        assert_eq!(active, vec![Route::News]);
        assert_eq!(Route::from_path("/noticias/"), Some(Route::News));
    }

    #[test]
    fn test_unknown_path_has_no_active_link() {
        assert!(NavBar::new("/admin").links().iter().all(|l| !l.active));

        let nav = NavBar::new("/dashboard");
        assert!(nav.links().iter().all(|l| !l.active));
    }

    #[test]
    fn test_navigation_closes_menu() {
        let mut nav = NavBar::new("/");
        nav.toggle_menu();
        assert!(nav.is_menu_open());

        nav.navigate(Route::Login);
        assert!(!nav.is_menu_open());
        assert!(nav.login_button().active);
    }

    #[test]
    fn test_model_serializes_paths() {
        let model = NavBar::new("/").model();
        let value = serde_json::to_value(&model).unwrap();

        assert_eq!(value["links"][0]["route"], "/");
        assert_eq!(value["links"][0]["active"], true);
        assert_eq!(value["login"]["label"], "Login");
        assert_eq!(value["menu_open"], false);
    }
}
