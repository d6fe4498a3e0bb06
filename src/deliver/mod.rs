pub(crate) mod adapter;
pub(crate) mod blob_url;
pub(crate) mod host;
