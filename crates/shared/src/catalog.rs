use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::Path,
};

use serde::Deserialize;

use crate::{
    domain::{Category, Issue, Slot, RETURN_SLOT},
    error::CatalogError,
};

type StaticCategory = (u8, &'static str, [&'static str; 4]);

/// Default key layout; issues occupy slots 1..=4 of each category.
const BUILTIN: [StaticCategory; 8] = [
    (
        0,
        "Cards",
        [
            "Bus Pass Issue",
            "Door Access Issue",
            "Swipe Issue",
            "New or Replacement Card",
        ],
    ),
    (
        1,
        "Network",
        [
            "Phone WiFi Connectivity Issue",
            "Laptop WiFi Connectivity Issue",
            "Residence WiFi Issue",
            "Residence Ethernet Issue",
        ],
    ),
    (
        2,
        "Accounts",
        [
            "Account Login Issue",
            "Password Reset Issue",
            "Account Removal Request",
            "Account Creation Request",
        ],
    ),
    (
        3,
        "Devices",
        [
            "Laptop Issue",
            "Phone or Tablet Issue",
            "Computer Peripheral Issue",
            "Printer or Scanner Issue",
        ],
    ),
    (
        4,
        "Duo",
        [
            "Duo MFA Authentication Error",
            "Initial Duo MFA Setup Help",
            "Duo MFA Phone Number Change",
            "Duo MFA Device Change",
        ],
    ),
    (
        5,
        "OWL Brightspace",
        [
            "Assignment Submission",
            "Classroom Visibility",
            "Course Materials",
            "Brightspace meeting",
        ],
    ),
    (
        6,
        "Classroom",
        ["Presentation Computer", "BYOD", "Projector", "Mic"],
    ),
    (
        7,
        "Software",
        [
            "Microsoft 365",
            "Accessibility",
            "Operating System",
            "Browsers",
        ],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub slot: Slot,
    pub category: Category,
    pub issues: BTreeMap<Slot, Issue>,
}

/// Read-only two-level key layout: category slot -> category -> issue slot -> issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: BTreeMap<Slot, CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    categories: Vec<CategoryFile>,
}

#[derive(Debug, Deserialize)]
struct CategoryFile {
    slot: u8,
    name: String,
    issues: Vec<IssueFile>,
}

#[derive(Debug, Deserialize)]
struct IssueFile {
    slot: u8,
    name: String,
}

impl Catalog {
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(slot, name, issues)| {
                let issues = issues
                    .iter()
                    .zip(1u8..)
                    .map(|(issue, issue_slot)| (Slot(issue_slot), Issue::new(*issue)))
                    .collect();
                (
                    Slot(*slot),
                    CatalogEntry {
                        slot: Slot(*slot),
                        category: Category::new(*name),
                        issues,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(raw)?;
        Self::from_parts(file.categories.into_iter().map(|category| {
            (
                Slot(category.slot),
                Category::new(category.name),
                category
                    .issues
                    .into_iter()
                    .map(|issue| (Slot(issue.slot), Issue::new(issue.name)))
                    .collect(),
            )
        }))
    }

    /// Builds a catalog from raw bindings, enforcing the slot invariants.
    pub fn from_parts(
        parts: impl IntoIterator<Item = (Slot, Category, Vec<(Slot, Issue)>)>,
    ) -> Result<Self, CatalogError> {
        let mut entries = BTreeMap::new();
        let mut labels = HashSet::new();

        for (slot, category, issues) in parts {
            if category.as_str().trim().is_empty() {
                return Err(CatalogError::BlankLabel { slot });
            }
            if entries.contains_key(&slot) {
                return Err(CatalogError::DuplicateCategorySlot { slot });
            }
            if !labels.insert(category.clone()) {
                return Err(CatalogError::DuplicateCategoryLabel {
                    category: category.0,
                });
            }
            if issues.is_empty() {
                return Err(CatalogError::EmptyCategory {
                    category: category.0,
                });
            }

            let mut table = BTreeMap::new();
            for (issue_slot, issue) in issues {
                if issue_slot == RETURN_SLOT {
                    return Err(CatalogError::ReservedSlot {
                        category: category.0,
                    });
                }
                if issue.as_str().trim().is_empty() {
                    return Err(CatalogError::BlankLabel { slot });
                }
                if table.insert(issue_slot, issue).is_some() {
                    return Err(CatalogError::DuplicateIssueSlot {
                        category: category.0,
                        slot: issue_slot,
                    });
                }
            }

            entries.insert(
                slot,
                CatalogEntry {
                    slot,
                    category,
                    issues: table,
                },
            );
        }

        Ok(Self { entries })
    }

    pub fn category_for_slot(&self, slot: Slot) -> Option<&Category> {
        self.entries.get(&slot).map(|entry| &entry.category)
    }

    pub fn issue_for_slot(&self, category: &Category, slot: Slot) -> Option<&Issue> {
        if slot == RETURN_SLOT {
            return None;
        }
        self.entries
            .values()
            .find(|entry| &entry.category == category)
            .and_then(|entry| entry.issues.get(&slot))
    }

    /// Entries in ascending category-slot order.
    pub fn categories(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
