mod bugzilla;
mod ccadb;
mod kinto;
mod traits;

pub use ccadb::CcadbReport;
pub use kinto::KintoStore;
pub use traits::{ReportSource, RevocationStore, TicketTracker};
