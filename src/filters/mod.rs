pub(crate) mod catalog;
pub(crate) mod channels;
pub(crate) mod color;
