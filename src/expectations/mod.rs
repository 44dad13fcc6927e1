mod command;
mod key_sequence;
mod predicate;

pub use command::CommandIs;
pub use key_sequence::KeySequence;
pub use predicate::{CommandPredicate, KeypressPredicate};
