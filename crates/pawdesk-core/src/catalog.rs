//! # Catalog Module
//!
//! In-memory lookup tables for membership and package definitions.
//!
//! ## Why In-Memory?
//! Definitions are authored in the back office and change rarely (a handful
//! of plans, edited a few times a year). The console loads the full set at
//! startup and hands the register a read-only `Catalog`. Pricing stays pure:
//! no definition lookup ever touches a database mid-sale.
//!
//! ## Lookup Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  membership_definition(id) ──► Ok(&MembershipDefinition)                │
//! │                           └──► Err(MembershipDefinitionNotFound)        │
//! │                                                                         │
//! │  Callers decide what a miss means:                                      │
//! │    • pricing     → treat as "no benefit", keep selling                  │
//! │    • finalization→ skip the activation, record it in the report         │
//! │    • back office → surface the error to the operator                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::types::{MembershipDefinition, PackageDefinition};

// =============================================================================
// Catalog
// =============================================================================

/// Read-optimized store of membership and package definitions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    memberships: HashMap<String, MembershipDefinition>,
    packages: HashMap<String, PackageDefinition>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Adds (or replaces) a membership definition, keyed by its id.
    pub fn insert_membership(&mut self, definition: MembershipDefinition) {
        self.memberships.insert(definition.id.clone(), definition);
    }

    /// Adds (or replaces) a package definition, keyed by its id.
    pub fn insert_package(&mut self, definition: PackageDefinition) {
        self.packages.insert(definition.id.clone(), definition);
    }

    /// Looks up a membership definition by id.
    pub fn membership_definition(&self, id: &str) -> CoreResult<&MembershipDefinition> {
        self.memberships
            .get(id)
            .ok_or_else(|| CoreError::MembershipDefinitionNotFound(id.to_string()))
    }

    /// Looks up a package definition by id.
    pub fn package_definition(&self, id: &str) -> CoreResult<&PackageDefinition> {
        self.packages
            .get(id)
            .ok_or_else(|| CoreError::PackageDefinitionNotFound(id.to_string()))
    }

    /// Number of membership definitions loaded.
    pub fn membership_count(&self) -> usize {
        self.memberships.len()
    }

    /// Number of package definitions loaded.
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
