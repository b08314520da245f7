pub mod api;
pub mod protocol;

#[cfg(test)]
pub(crate) mod testing;
