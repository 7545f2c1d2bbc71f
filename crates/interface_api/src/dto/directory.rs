//! Directory DTOs

use serde::Deserialize;

use core_kernel::{BranchId, PackageId};
use domain_directory::{CustomerQuery, CustomerStatus, EmployeeQuery, VendorQuery};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerFilter {
    pub branch_id: Option<BranchId>,
    pub status: Option<CustomerStatus>,
    /// Case-insensitive match against name or email
    pub search: Option<String>,
}

impl From<CustomerFilter> for CustomerQuery {
    fn from(filter: CustomerFilter) -> Self {
        CustomerQuery {
            branch_id: filter.branch_id,
            status: filter.status,
            search: filter.search.filter(|s| !s.trim().is_empty()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeFilter {
    pub branch_id: Option<BranchId>,
    pub is_active: Option<bool>,
}

impl From<EmployeeFilter> for EmployeeQuery {
    fn from(filter: EmployeeFilter) -> Self {
        EmployeeQuery {
            branch_id: filter.branch_id,
            is_active: filter.is_active,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorFilter {
    pub branch_id: Option<BranchId>,
}

impl From<VendorFilter> for VendorQuery {
    fn from(filter: VendorFilter) -> Self {
        VendorQuery {
            branch_id: filter.branch_id,
        }
    }
}

/// Body of `PUT /customers/:id/status`
#[derive(Debug, Deserialize)]
pub struct CustomerStatusRequest {
    pub status: CustomerStatus,
}

/// Body of `PUT /customers/:id/package`; `null` clears the package
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignPackageRequest {
    pub package_id: Option<PackageId>,
}
