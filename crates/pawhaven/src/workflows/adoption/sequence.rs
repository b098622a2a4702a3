use super::store::StoreError;

/// Named counters backing sequential identifier allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sequence {
    Pet,
    Adopter,
    Application,
    Payment,
}

impl Sequence {
    /// Counter key used by store backends.
    pub const fn name(self) -> &'static str {
        match self {
            Sequence::Pet => "pet",
            Sequence::Adopter => "adopter",
            Sequence::Application => "application",
            Sequence::Payment => "payment",
        }
    }
}

/// Issues unique, strictly increasing integers per sequence.
///
/// Implementations must perform an atomic increment-and-fetch against shared
/// storage; deriving the next value from a prior read races under concurrent
/// creation. Gaps are permitted: a value allocated for an insert that later
/// fails is simply never reused.
pub trait SequenceAllocator: Send + Sync {
    fn allocate(&self, sequence: Sequence) -> Result<u64, StoreError>;
}
