pub(crate) mod blur;
pub(crate) mod catalog;
pub(crate) mod composite;
pub(crate) mod overlay;
