// A RatingStore maps entity -> attribute -> rating.
//
// Entities are rows (a person, or an item once pivoted), attributes are the
// columns they rate. An absent attribute means "unrated", which is not the
// same thing as a rating of zero.
//
// The store is filled once (load or transpose) and is read-only afterwards;
// transposing builds a second store and leaves the first untouched.

use serde::Deserialize;
use std::collections::HashMap;

pub type RatingVector = HashMap<String, f64>;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RatingStore {
    data: HashMap<String, RatingVector>,
}

impl RatingStore {
    pub fn new(data: HashMap<String, RatingVector>) -> Self {
        RatingStore { data }
    }

    pub fn get(&self, entity: &str) -> Option<&RatingVector> {
        self.data.get(entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RatingVector)> {
        self.data.iter()
    }

    /// Entity names in sorted order.
    pub fn entities(&self) -> Vec<&str> {
        let mut names = self.data.keys().map(|k| k.as_str()).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of distinct attribute names rated by any entity.
    pub fn attribute_count(&self) -> usize {
        let mut seen = std::collections::HashSet::new();
        for vector in self.data.values() {
            seen.extend(vector.keys().map(|k| k.as_str()));
        }
        seen.len()
    }

    /// Swaps rows and columns: every (entity, attribute, rating) becomes
    /// (attribute, entity, rating).
    pub fn transpose(&self) -> RatingStore {
        let mut result: HashMap<String, RatingVector> = HashMap::new();
        for (name, ratings) in self.data.iter() {
            for (item, rating) in ratings.iter() {
                result
                    .entry(item.clone())
                    .or_default()
                    .insert(name.clone(), *rating);
            }
        }
        debug!(
            "transpose: {} entities -> {} entities",
            self.data.len(),
            result.len()
        );

        RatingStore { data: result }
    }
}
