/// Route guard
///
/// Every logical route declares what it requires. One check evaluates that
/// requirement against the caller and yields allow, redirect or not-found.
use crate::{
    access::{evaluate, AccessDecision, Subject},
    element::{Element, ElementRef, ForbiddenElement},
};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Logical client route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Auth,
    Home,
    About,
    ElementSelection,
    Element(Element),
    ForbiddenLanding,
    ForbiddenElement(ForbiddenElement),
    Admin,
    Ranks,
}

impl Route {
    pub fn requirement(&self) -> Requirement {
        match self {
            Route::Auth | Route::About => Requirement::Public,
            Route::Home => Requirement::LoggedIn,
            Route::ElementSelection => Requirement::Unselected,
            Route::Element(e) => Requirement::ElementAccess(ElementRef::Element(*e)),
            Route::ForbiddenLanding | Route::ForbiddenElement(_) | Route::Admin | Route::Ranks => {
                Requirement::Admin
            }
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Auth => f.write_str("auth"),
            Route::Home => f.write_str("home"),
            Route::About => f.write_str("about"),
            Route::ElementSelection => f.write_str("element-selection"),
            Route::Element(e) => write!(f, "element/{}", e),
            Route::ForbiddenLanding => f.write_str("element/forbidden"),
            Route::ForbiddenElement(e) => write!(f, "forbidden-element/{}", e),
            Route::Admin => f.write_str("admin"),
            Route::Ranks => f.write_str("ranks"),
        }
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A route string that names nothing; `back` is where the client should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownRoute {
    pub back: Route,
}

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_matches('/');
        let home = UnknownRoute { back: Route::Home };

        match s {
            "auth" => return Ok(Route::Auth),
            "home" => return Ok(Route::Home),
            "about" => return Ok(Route::About),
            "element-selection" => return Ok(Route::ElementSelection),
            "element/forbidden" => return Ok(Route::ForbiddenLanding),
            "admin" => return Ok(Route::Admin),
            "ranks" => return Ok(Route::Ranks),
            _ => {}
        }

        if let Some(id) = s.strip_prefix("element/") {
            return id.parse().map(Route::Element).map_err(|_| home);
        }
        if let Some(id) = s.strip_prefix("forbidden-element/") {
            return id.parse().map(Route::ForbiddenElement).map_err(|_| UnknownRoute {
                back: Route::ForbiddenLanding,
            });
        }
        Err(home)
    }
}

/// What a route asks of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Public,
    LoggedIn,
    /// Logged-in non-admin without a primary element
    Unselected,
    ElementAccess(ElementRef),
    Admin,
}

/// Guard outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Navigation {
    Allow,
    Redirect {
        to: Route,
        #[serde(skip_serializing_if = "Option::is_none")]
        alert: Option<String>,
    },
    NotFound {
        back: Route,
    },
}

impl Navigation {
    fn home_with(alert: impl Into<String>) -> Self {
        Navigation::Redirect {
            to: Route::Home,
            alert: Some(alert.into()),
        }
    }
}

pub struct RouteGuard;

impl RouteGuard {
    /// Parse and check a raw route string
    pub fn navigate(raw: &str, subject: Option<&Subject>, now: DateTime<Utc>) -> Navigation {
        match raw.parse::<Route>() {
            Ok(route) => Self::check(route, subject, now),
            Err(UnknownRoute { back }) => Navigation::NotFound { back },
        }
    }

    pub fn check(route: Route, subject: Option<&Subject>, now: DateTime<Utc>) -> Navigation {
        let requirement = route.requirement();
        if requirement == Requirement::Public {
            return Navigation::Allow;
        }

        let Some(subject) = subject else {
            return Navigation::Redirect {
                to: Route::Auth,
                alert: None,
            };
        };

        match requirement {
            Requirement::Public | Requirement::LoggedIn => Navigation::Allow,
            Requirement::Unselected => {
                if subject.is_admin || subject.primary.is_some() {
                    Navigation::Redirect {
                        to: Route::Home,
                        alert: None,
                    }
                } else {
                    Navigation::Allow
                }
            }
            Requirement::ElementAccess(target) => match evaluate(subject, target, now) {
                AccessDecision::Granted { .. } => Navigation::Allow,
                AccessDecision::ConfirmationRequired { element } => Navigation::home_with(
                    format!("Confirm daily access to {} first", element.name()),
                ),
                AccessDecision::Denied {
                    bonus_element,
                    remaining,
                } => Navigation::home_with(format!(
                    "Daily access already used for {}. Try again in {}h {}m",
                    bonus_element.name(),
                    remaining.hours,
                    remaining.minutes
                )),
                AccessDecision::Forbidden => {
                    Navigation::home_with("This area is reserved for administrators")
                }
            },
            Requirement::Admin => {
                if subject.is_admin {
                    Navigation::Allow
                } else {
                    Navigation::home_with("This area is reserved for administrators")
                }
            }
        }
    }
}
