//! Tenant/organization scoping for cache keys.
//!
//! Every cached entity on the platform is scoped by two levels of tenancy:
//! a tenant code and an organization code within that tenant. The scope is
//! embedded into every physical cache key, so both codes are validated to be
//! safe as key components (non-empty, bounded, no `:` separator).

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Maximum accepted length for a tenant or organization code.
const MAX_CODE_LEN: usize = 64;

/// A validated (tenant, organization) pair.
///
/// Construction goes through [`TenantScope::new`], which rejects codes that
/// would break key construction. Once built, the scope is immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantScope {
    tenant_code: String,
    organization_code: String,
}

impl TenantScope {
    /// Creates a validated scope from tenant and organization codes.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTenantCode` or
    /// `CoreError::InvalidOrganizationCode` if either code is empty, longer
    /// than 64 characters, or contains the `:` key separator.
    pub fn new(tenant_code: impl Into<String>, organization_code: impl Into<String>) -> Result<Self> {
        let tenant_code = tenant_code.into();
        let organization_code = organization_code.into();

        if !is_valid_code(&tenant_code) {
            return Err(CoreError::invalid_tenant_code(tenant_code));
        }
        if !is_valid_code(&organization_code) {
            return Err(CoreError::invalid_organization_code(organization_code));
        }

        Ok(Self {
            tenant_code,
            organization_code,
        })
    }

    /// The tenant code.
    pub fn tenant_code(&self) -> &str {
        &self.tenant_code
    }

    /// The organization code.
    pub fn organization_code(&self) -> &str {
        &self.organization_code
    }
}

impl std::fmt::Display for TenantScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.tenant_code, self.organization_code)
    }
}

/// Validates a single tenant or organization code.
pub fn is_valid_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_CODE_LEN
        && !code.contains(':')
        && !code.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_scope() {
        let scope = TenantScope::new("t1", "o1").unwrap();
        assert_eq!(scope.tenant_code(), "t1");
        assert_eq!(scope.organization_code(), "o1");
        assert_eq!(scope.to_string(), "t1/o1");
    }

    #[test]
    fn test_empty_tenant_rejected() {
        let err = TenantScope::new("", "o1").unwrap_err();
        assert!(matches!(err, CoreError::InvalidTenantCode(_)));
    }

    #[test]
    fn test_separator_in_org_rejected() {
        let err = TenantScope::new("t1", "o:1").unwrap_err();
        assert!(matches!(err, CoreError::InvalidOrganizationCode(_)));
    }

    #[test]
    fn test_whitespace_rejected() {
        assert!(TenantScope::new("t 1", "o1").is_err());
        assert!(TenantScope::new("t1", "o\t1").is_err());
    }

    #[test]
    fn test_overlong_code_rejected() {
        let long = "x".repeat(65);
        assert!(TenantScope::new(long.clone(), "o1").is_err());
        assert!(TenantScope::new("t1", long).is_err());
    }

    #[test]
    fn test_max_length_accepted() {
        let max = "x".repeat(64);
        assert!(TenantScope::new(max.clone(), max).is_ok());
    }

    #[test]
    fn test_scope_equality() {
        let a = TenantScope::new("t1", "o1").unwrap();
        let b = TenantScope::new("t1", "o1").unwrap();
        let c = TenantScope::new("t1", "o2").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
