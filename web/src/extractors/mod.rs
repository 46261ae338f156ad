pub(crate) mod resolved_identity;
