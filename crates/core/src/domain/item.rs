use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// A shopping-list entry. The name is the item's only identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
}

impl Item {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Trims the spoken slot value and uppercases its first character.
///
/// Applying this to an already-normalized name returns it unchanged.
pub fn normalize_item_name(raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let Some(first) = chars.next() else {
        return Err(DomainError::EmptyItemName);
    };

    let mut normalized = String::with_capacity(trimmed.len());
    normalized.extend(first.to_uppercase());
    normalized.push_str(chars.as_str());
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::{normalize_item_name, Item};
    use crate::errors::DomainError;

    #[test]
    fn first_letter_is_uppercased() {
        assert_eq!(normalize_item_name("milk"), Ok("Milk".to_owned()));
        assert_eq!(normalize_item_name("peanut butter"), Ok("Peanut butter".to_owned()));
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_item_name("eggs").expect("normalize");
        let twice = normalize_item_name(&once).expect("normalize again");
        assert_eq!(once, twice);
    }

    #[test]
    fn only_the_first_character_changes() {
        assert_eq!(normalize_item_name("iPhone charger"), Ok("IPhone charger".to_owned()));
        assert_eq!(normalize_item_name("ünsalted butter"), Ok("Ünsalted butter".to_owned()));
    }

    #[test]
    fn surrounding_whitespace_is_dropped() {
        assert_eq!(normalize_item_name("  bread "), Ok("Bread".to_owned()));
    }

    #[test]
    fn blank_names_are_rejected() {
        assert_eq!(normalize_item_name(""), Err(DomainError::EmptyItemName));
        assert_eq!(normalize_item_name("   "), Err(DomainError::EmptyItemName));
    }

    #[test]
    fn item_constructor_keeps_name_verbatim() {
        assert_eq!(Item::new("apples").name, "apples");
    }
}
