//! Approval ledger
//!
//! Holds tasks paused in `awaiting_approval` together with the decision
//! they will resume with. Taking an entry out of the ledger is the only way
//! to resume, reject or cancel a paused task, so each pause is resolved
//! exactly once.
//!
//! Entries are serialized into the idempotency store, so a task paused by
//! one engine can be resolved by any engine sharing that store.

mod ledger;


pub use ledger::{ApprovalLedger, PendingApproval, PendingSummary};
