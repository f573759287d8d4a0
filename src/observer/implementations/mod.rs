// Observer implementations organized by rings
// Each ring handles a specific phase of data processing

use crate::observer::pipeline::ObserverPipeline;
use crate::observer::traits::ObserverBox;

// Ring 0: Data Preparation - load stored state
#[path = "0/data_preparation.rs"]
pub mod data_preparation;

// Ring 1: Input Validation - system fields, memberships, role assignment
#[path = "1/role_assignment.rs"]
pub mod role_assignment;
#[path = "1/system_fields.rs"]
pub mod system_fields;
#[path = "1/user_membership.rs"]
pub mod user_membership;

// Ring 2: Security - access decisions
#[path = "2/access_control.rs"]
pub mod access_control;

// Ring 4: Enrichment - stamps, website assignment, schema conformance
#[path = "4/record_stamps.rs"]
pub mod record_stamps;
#[path = "4/schema_conformance.rs"]
pub mod schema_conformance;
#[path = "4/website_assignment.rs"]
pub mod website_assignment;

// Ring 5: Database - store execution
#[path = "5/store_executor.rs"]
pub mod store_executor;

// Ring 7: Audit
#[path = "7/audit_log.rs"]
pub mod audit_log;

pub use access_control::*;
pub use audit_log::*;
pub use data_preparation::*;
pub use record_stamps::*;
pub use role_assignment::*;
pub use schema_conformance::*;
pub use store_executor::*;
pub use system_fields::*;
pub use user_membership::*;
pub use website_assignment::*;

/// Register every observer needed to serve the content API
pub fn register_standard_observers(pipeline: &mut ObserverPipeline) {
    pipeline.register_observer(ObserverBox::Sync(Box::new(DataPreparationObserver)));
    pipeline.register_observer(ObserverBox::Sync(Box::new(SystemFieldsObserver)));
    pipeline.register_observer(ObserverBox::Sync(Box::new(UserMembershipObserver)));
    pipeline.register_observer(ObserverBox::Sync(Box::new(RoleAssignmentObserver)));
    pipeline.register_observer(ObserverBox::Sync(Box::new(AccessControlObserver)));
    pipeline.register_observer(ObserverBox::Sync(Box::new(RecordStampsObserver)));
    pipeline.register_observer(ObserverBox::Sync(Box::new(WebsiteAssignmentObserver)));
    pipeline.register_observer(ObserverBox::Sync(Box::new(SchemaConformanceObserver)));
    pipeline.register_observer(ObserverBox::Sync(Box::new(StoreExecutor)));
    pipeline.register_observer(ObserverBox::Async(Box::new(AuditLogObserver)));
}
