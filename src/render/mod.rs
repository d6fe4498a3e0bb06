pub(crate) mod compose;
pub(crate) mod preview;
pub(crate) mod surface;
