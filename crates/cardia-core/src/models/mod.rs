pub mod assessment;
pub mod clinical;
pub mod heal;
pub mod record_id;
pub mod result;
pub mod timestamp;

pub use assessment::AssessmentRecord;
pub use clinical::ClinicalValue;
pub use result::{RiskLevel, RiskResult};
