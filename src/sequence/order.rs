use std::cmp::Ordering;
use std::sync::Arc;

use crate::foundation::error::StillsError;
use crate::sequence::entry::ImageEntry;

/// Ordering mode of a sequence.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// User-defined order, changed only by explicit moves.
    #[default]
    Manual,
    /// Alphabetical by display name.
    Name,
    /// Oldest modification time first.
    Date,
    /// Smallest file first.
    Size,
}

impl SortOrder {
    /// All modes, in the order a settings picker lists them.
    pub const ALL: [SortOrder; 4] = [Self::Manual, Self::Name, Self::Date, Self::Size];

    /// Stable lowercase identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Name => "name",
            Self::Date => "date",
            Self::Size => "size",
        }
    }

    /// Compare two entries under this mode. `Manual` treats every pair as equal.
    pub fn compare(self, a: &ImageEntry, b: &ImageEntry) -> Ordering {
        match self {
            Self::Manual => Ordering::Equal,
            Self::Name => compare_names(a.name(), b.name()),
            Self::Date => a.last_modified().cmp(&b.last_modified()),
            Self::Size => a.size().cmp(&b.size()),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortOrder {
    type Err = StillsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|o| o.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                StillsError::validation(format!(
                    "unknown sort order '{s}' (expected manual, name, date or size)"
                ))
            })
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

/// Stable-sort `entries` under `order`. A no-op for [`SortOrder::Manual`].
pub(crate) fn sort_entries(entries: &mut [Arc<ImageEntry>], order: SortOrder) {
    if order == SortOrder::Manual {
        return;
    }
    entries.sort_by(|a, b| order.compare(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Name".parse::<SortOrder>().unwrap(), SortOrder::Name);
        assert_eq!(" size ".parse::<SortOrder>().unwrap(), SortOrder::Size);
        assert!("random".parse::<SortOrder>().is_err());
    }

    #[test]
    fn names_fold_case_then_break_ties() {
        assert_eq!(compare_names("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_names("B", "a"), Ordering::Greater);
        assert_eq!(compare_names("A", "a"), Ordering::Less);
        assert_eq!(compare_names("a", "a"), Ordering::Equal);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&SortOrder::Date).unwrap(), "\"date\"");
        let o: SortOrder = serde_json::from_str("\"manual\"").unwrap();
        assert_eq!(o, SortOrder::Manual);
    }
}
