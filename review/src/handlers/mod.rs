// Re-export all handler modules
pub mod audits;
pub mod items;
pub mod rules;
pub mod score;

pub use audits::*;
pub use items::*;
pub use rules::*;
pub use score::*;
