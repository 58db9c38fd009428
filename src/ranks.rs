/// Rank catalog shown in the admin ranks view
///
/// Held in memory only. Account rank labels are free text and do not
/// reference these entries.
use crate::{
    element::Element,
    error::{AppError, AppResult},
};
use serde::Serialize;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rank {
    pub id: Element,
    pub name: &'static str,
    pub description: String,
    pub order: u8,
}

pub struct RankCatalog {
    ranks: RwLock<Vec<Rank>>,
}

impl RankCatalog {
    pub fn new() -> Self {
        let initial = [
            (Element::Water, 1),
            (Element::Fire, 2),
            (Element::Earth, 3),
            (Element::Wind, 4),
        ];
        let ranks = initial
            .into_iter()
            .map(|(element, order)| Rank {
                id: element,
                name: element.name(),
                description: format!("{} rank", element.name()),
                order,
            })
            .collect();

        Self {
            ranks: RwLock::new(ranks),
        }
    }

    /// Entries by `order`
    pub async fn list(&self) -> Vec<Rank> {
        self.ranks.read().await.clone()
    }

    pub async fn get(&self, id: Element) -> Option<Rank> {
        self.ranks.read().await.iter().find(|r| r.id == id).cloned()
    }

    /// Name and order stay fixed
    pub async fn update_description(&self, id: Element, description: &str) -> AppResult<Rank> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::Validation(
                "Rank description cannot be empty".to_string(),
            ));
        }

        let mut ranks = self.ranks.write().await;
        let rank = ranks
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Rank not found: {}", id)))?;
        rank.description = description.to_string();
        Ok(rank.clone())
    }
}

impl Default for RankCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_catalog() {
        let catalog = RankCatalog::new();
        let ranks = catalog.list().await;

        let ids: Vec<&str> = ranks.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["water", "fire", "earth", "wind"]);
        assert!(ranks.windows(2).all(|w| w[0].order < w[1].order));
    }

    #[tokio::test]
    async fn test_only_description_changes() {
        let catalog = RankCatalog::new();
        let before = catalog.get(Element::Earth).await.unwrap();

        let after = catalog
            .update_description(Element::Earth, "Steady as stone")
            .await
            .unwrap();
        assert_eq!(after.description, "Steady as stone");
        assert_eq!(after.name, before.name);
        assert_eq!(after.order, before.order);
        assert_eq!(catalog.get(Element::Earth).await, Some(after));

        assert!(matches!(
            catalog.update_description(Element::Earth, "  ").await,
            Err(AppError::Validation(_))
        ));
    }
}
