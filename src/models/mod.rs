pub mod draft;
pub mod event;
pub mod expense;
pub mod group;
pub mod settlement;
pub mod user;

pub use draft::{DraftExpense, DraftStatus, SettlementInstruction};
pub use event::{ChangeKind, DocChange};
pub use expense::Expense;
pub use group::{Group, Ledger, MonetarySummary};
pub use settlement::Settlement;
pub use user::{Friend, User};
