/// Registration-order index of an object kind inside a `Protocol`
pub type KindId = u16;

/// A value drawn from the `ChangeClock`, used to order changes & publications
pub type Stamp = u64;
