/// Elements and the forbidden tier
use crate::store::keys;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four primary elements a user can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Water,
    Fire,
    Wind,
    Earth,
}

impl Element {
    /// Display order on the home view
    pub const ALL: [Element; 4] = [Element::Water, Element::Fire, Element::Wind, Element::Earth];

    pub fn as_str(&self) -> &'static str {
        match self {
            Element::Water => "water",
            Element::Fire => "fire",
            Element::Wind => "wind",
            Element::Earth => "earth",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Element::Water => "Water",
            Element::Fire => "Fire",
            Element::Wind => "Wind",
            Element::Earth => "Earth",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Element::Water => "💧",
            Element::Fire => "🔥",
            Element::Wind => "💨",
            Element::Earth => "🌍",
        }
    }
}

impl FromStr for Element {
    type Err = UnknownElement;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Element::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| UnknownElement(s.to_string()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admin-only categories with their own gallery keyspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForbiddenElement {
    DarkWater,
    Hellfire,
    ShadowWind,
    CursedEarth,
}

impl ForbiddenElement {
    pub const ALL: [ForbiddenElement; 4] = [
        ForbiddenElement::DarkWater,
        ForbiddenElement::Hellfire,
        ForbiddenElement::ShadowWind,
        ForbiddenElement::CursedEarth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ForbiddenElement::DarkWater => "dark-water",
            ForbiddenElement::Hellfire => "hellfire",
            ForbiddenElement::ShadowWind => "shadow-wind",
            ForbiddenElement::CursedEarth => "cursed-earth",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ForbiddenElement::DarkWater => "Dark Water",
            ForbiddenElement::Hellfire => "Hellfire",
            ForbiddenElement::ShadowWind => "Shadow Wind",
            ForbiddenElement::CursedEarth => "Cursed Earth",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ForbiddenElement::DarkWater => "🌊",
            ForbiddenElement::Hellfire => "🔥",
            ForbiddenElement::ShadowWind => "🌪️",
            ForbiddenElement::CursedEarth => "⚫",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ForbiddenElement::DarkWater => {
                "Hidden currents of the deep whisper forgotten secrets. A power that can drown everything."
            }
            ForbiddenElement::Hellfire => {
                "Eternal flames rising from the heart of darkness turn whatever they touch to ash."
            }
            ForbiddenElement::ShadowWind => {
                "Invisible breezes carry spirits and whispers of the past into every crack."
            }
            ForbiddenElement::CursedEarth => {
                "Ancient lands hiding old secrets, the roots of forgotten powers."
            }
        }
    }
}

impl FromStr for ForbiddenElement {
    type Err = UnknownElement;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ForbiddenElement::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| UnknownElement(s.to_string()))
    }
}

impl fmt::Display for ForbiddenElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that owns a gallery and can be the target of an access check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRef {
    Element(Element),
    Forbidden(ForbiddenElement),
}

impl ElementRef {
    /// Store key of this target's gallery; the two tiers never share a key
    pub fn gallery_key(&self) -> String {
        match self {
            ElementRef::Element(e) => format!("{}{}", keys::IMAGES_PREFIX, e.as_str()),
            ElementRef::Forbidden(f) => {
                format!("{}{}", keys::FORBIDDEN_IMAGES_PREFIX, f.as_str())
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementRef::Element(e) => e.name(),
            ElementRef::Forbidden(f) => f.name(),
        }
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, ElementRef::Forbidden(_))
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementRef::Element(e) => write!(f, "element/{}", e),
            ElementRef::Forbidden(e) => write!(f, "forbidden-element/{}", e),
        }
    }
}

/// Identifier that names no known element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownElement(pub String);

impl fmt::Display for UnknownElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown element: {}", self.0)
    }
}

impl std::error::Error for UnknownElement {}

impl From<UnknownElement> for crate::error::AppError {
    fn from(err: UnknownElement) -> Self {
        crate::error::AppError::NotFound(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_elements() {
        assert_eq!("water".parse::<Element>(), Ok(Element::Water));
        assert_eq!("earth".parse::<Element>(), Ok(Element::Earth));
        assert!("Water".parse::<Element>().is_err());
        assert!("hellfire".parse::<Element>().is_err());

        assert_eq!(
            "shadow-wind".parse::<ForbiddenElement>(),
            Ok(ForbiddenElement::ShadowWind)
        );
        assert!("water".parse::<ForbiddenElement>().is_err());
    }

    #[test]
    fn test_serde_names_match_route_ids() {
        for e in Element::ALL {
            let json = serde_json::to_string(&e).unwrap();
            assert_eq!(json, format!("\"{}\"", e.as_str()));
        }
        for f in ForbiddenElement::ALL {
            let json = serde_json::to_string(&f).unwrap();
            assert_eq!(json, format!("\"{}\"", f.as_str()));
        }
    }

    #[test]
    fn test_gallery_keyspaces_are_disjoint() {
        let ordinary: Vec<String> = Element::ALL
            .into_iter()
            .map(|e| ElementRef::Element(e).gallery_key())
            .collect();
        let forbidden: Vec<String> = ForbiddenElement::ALL
            .into_iter()
            .map(|f| ElementRef::Forbidden(f).gallery_key())
            .collect();

        assert_eq!(ordinary[0], "images_water");
        assert_eq!(forbidden[1], "forbidden_images_hellfire");
        assert!(ordinary.iter().all(|k| !forbidden.contains(k)));
    }
}
